use std::{collections::BTreeMap, fmt::Display};

use common::error::{HsError, HsResult};
use thiserror::Error;
use url::form_urlencoded;

/// Path the guard sends authenticated users to when they try to open the login page
pub const LANDING_PATH: &str = "/lista";
/// Query parameter holding the path a user originally asked for before being sent to login
pub const REDIRECT_QUERY: &str = "redirect";

/// Named pages of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Page {
    Login,
    CrearHoja,
    ListarHojas,
    EditarHoja,
    AdminConfig,
}

impl Page {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::CrearHoja => "CrearHoja",
            Self::ListarHojas => "ListarHojas",
            Self::EditarHoja => "EditarHoja",
            Self::AdminConfig => "AdminConfig",
        }
    }
}

impl Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// View rendered for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    LoginPage,
    HojaServicioForm,
    ListaHojasServicio,
    AdminConfig,
}

/// Static description of a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub path: &'static str,
    pub page: Page,
    pub view: View,
    pub requires_auth: bool,
}

impl RouteDescriptor {
    pub const fn new(path: &'static str, page: Page, view: View, requires_auth: bool) -> Self {
        Self {
            path,
            page,
            view,
            requires_auth,
        }
    }

    /// Match a concrete, normalized `path` against this route's pattern, capturing `:param`
    /// segments
    fn capture(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let pattern = segments(self.path);
        let concrete = segments(path);
        if pattern.len() != concrete.len() {
            return None;
        }
        let mut params = BTreeMap::new();
        for (expected, actual) in pattern.iter().zip(concrete.iter()) {
            match expected.strip_prefix(':') {
                Some(name) => {
                    params.insert(name.to_owned(), (*actual).to_owned());
                }
                None if expected == actual => {}
                None => return None,
            }
        }
        Some(params)
    }

    /// Build the concrete path of this route from `params`
    fn build(&self, params: &BTreeMap<String, String>) -> Result<String, NavigationError> {
        let mut path = String::new();
        for segment in segments(self.path) {
            path.push('/');
            match segment.strip_prefix(':') {
                Some(name) => match params.get(name) {
                    Some(value) if !value.is_empty() => path.push_str(value),
                    _ => {
                        return Err(NavigationError::MissingParam {
                            page: self.page,
                            param: name.to_owned(),
                        })
                    }
                },
                None => path.push_str(segment),
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

/// Split a path into its non-empty segments
fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Concrete location the router is at, or is about to move to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub page: Page,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
}

impl Location {
    /// Path including the encoded query string
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{query}", self.path)
    }
}

/// Where a navigation should go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
    /// A path, optionally carrying a query string
    Path(String),
    Named {
        page: Page,
        params: BTreeMap<String, String>,
        query: BTreeMap<String, String>,
    },
}

impl NavigationTarget {
    pub const fn named(page: Page) -> Self {
        Self::Named {
            page,
            params: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    pub fn with_param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        if let Self::Named { params, .. } = &mut self {
            params.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        if let Self::Named { query, .. } = &mut self {
            query.insert(key.into(), value.into());
        }
        self
    }
}

impl From<&str> for NavigationTarget {
    fn from(value: &str) -> Self {
        Self::Path(value.to_owned())
    }
}

impl From<String> for NavigationTarget {
    fn from(value: String) -> Self {
        Self::Path(value)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No route matches {0}")]
    NotFound(String),
    #[error("Route {0} is not registered")]
    UnknownRoute(Page),
    #[error("Route {page} requires the `{param}` parameter")]
    MissingParam { page: Page, param: String },
    #[error("Avoided redundant navigation to current location: {0}")]
    Duplicated(String),
    #[error("Navigation to {0} kept redirecting")]
    RedirectLoop(String),
}

/// Immutable set of routes known to the router
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Create a table from `routes`
    /// # Errors
    /// This function will return an error if two routes share a page or a path pattern
    pub fn new(routes: Vec<RouteDescriptor>) -> HsResult<Self> {
        for (index, route) in routes.iter().enumerate() {
            let duplicate = routes
                .iter()
                .skip(index + 1)
                .find(|other| other.page == route.page || other.path == route.path);
            if let Some(other) = duplicate {
                return Err(HsError::DuplicateRoute(format!(
                    "{} ({}) conflicts with {} ({})",
                    route.page, route.path, other.page, other.path
                )));
            }
        }
        Ok(Self { routes })
    }

    /// The routes of the service sheet application
    /// # Errors
    /// This function will return an error if the built in route list is inconsistent
    pub fn standard() -> HsResult<Self> {
        Self::new(vec![
            RouteDescriptor::new("/login", Page::Login, View::LoginPage, false),
            RouteDescriptor::new("/", Page::CrearHoja, View::HojaServicioForm, true),
            RouteDescriptor::new("/lista", Page::ListarHojas, View::ListaHojasServicio, true),
            RouteDescriptor::new("/editar/:id", Page::EditarHoja, View::HojaServicioForm, true),
            RouteDescriptor::new("/configuracion", Page::AdminConfig, View::AdminConfig, true),
        ])
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn get(&self, page: Page) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|route| route.page == page)
    }

    /// Resolve `target` into the matching route and the concrete [Location]
    /// # Errors
    /// This function will return an error if no route matches the target, or a named target
    /// lacks a parameter its route needs
    pub fn resolve(
        &self,
        target: &NavigationTarget,
    ) -> Result<(&RouteDescriptor, Location), NavigationError> {
        match target {
            NavigationTarget::Path(raw) => {
                let without_fragment = raw.split('#').next().unwrap_or_default();
                let (path, query) = match without_fragment.split_once('?') {
                    Some((path, query)) => (path, query),
                    None => (without_fragment, ""),
                };
                let path = normalize(path);
                let query = form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect::<BTreeMap<String, String>>();
                self.routes
                    .iter()
                    .find_map(|route| {
                        route.capture(&path).map(|params| {
                            let location = Location {
                                page: route.page,
                                path: path.clone(),
                                params,
                                query: query.clone(),
                            };
                            (route, location)
                        })
                    })
                    .ok_or_else(|| NavigationError::NotFound(raw.clone()))
            }
            NavigationTarget::Named {
                page,
                params,
                query,
            } => {
                let route = self.get(*page).ok_or(NavigationError::UnknownRoute(*page))?;
                let path = route.build(params)?;
                let location = Location {
                    page: *page,
                    path,
                    params: route.capture_params(params),
                    query: query.clone(),
                };
                Ok((route, location))
            }
        }
    }
}

impl RouteDescriptor {
    /// Keep only the `params` this route declares
    fn capture_params(&self, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        segments(self.path)
            .into_iter()
            .filter_map(|segment| segment.strip_prefix(':'))
            .filter_map(|name| params.get(name).map(|value| (name.to_owned(), value.clone())))
            .collect()
    }
}

/// Make sure `path` is absolute and has no trailing slash (besides the root)
fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_owned();
    }
    if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod test {
    use rstest::{fixture, rstest};

    use super::{
        NavigationError, NavigationTarget, Page, RouteDescriptor, RouteTable, View,
    };

    #[fixture]
    fn table() -> RouteTable {
        RouteTable::standard().expect("Standard routes should be consistent")
    }

    #[rstest]
    #[case::login("/login", Page::Login)]
    #[case::root("/", Page::CrearHoja)]
    #[case::empty("", Page::CrearHoja)]
    #[case::list("/lista", Page::ListarHojas)]
    #[case::trailing_slash("/lista/", Page::ListarHojas)]
    #[case::config("/configuracion", Page::AdminConfig)]
    #[case::edit("/editar/15", Page::EditarHoja)]
    fn resolve_should_match_path(table: RouteTable, #[case] path: &str, #[case] page: Page) {
        let (route, location) = table
            .resolve(&NavigationTarget::from(path))
            .expect("Path should resolve");

        assert_eq!(route.page, page);
        assert_eq!(location.page, page);
    }

    #[rstest]
    fn resolve_should_capture_params_and_query(table: RouteTable) {
        let (_, location) = table
            .resolve(&NavigationTarget::from("/editar/42?modo=copia"))
            .expect("Path should resolve");

        assert_eq!(location.path, "/editar/42");
        assert_eq!(location.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(location.query.get("modo").map(String::as_str), Some("copia"));
        assert_eq!(location.full_path(), "/editar/42?modo=copia");
    }

    #[rstest]
    #[case::unknown("/desconocido")]
    #[case::edit_without_id("/editar")]
    #[case::edit_extra_segment("/editar/1/2")]
    fn resolve_should_reject_unknown_paths(table: RouteTable, #[case] path: &str) {
        let result = table.resolve(&NavigationTarget::from(path));

        assert_eq!(result.err(), Some(NavigationError::NotFound(path.to_owned())));
    }

    #[rstest]
    fn resolve_named_should_build_path(table: RouteTable) {
        let target = NavigationTarget::named(Page::EditarHoja).with_param("id", "7");

        let (route, location) = table.resolve(&target).expect("Named route should resolve");

        assert_eq!(route.view, View::HojaServicioForm);
        assert_eq!(location.path, "/editar/7");
    }

    #[rstest]
    fn resolve_named_should_require_params(table: RouteTable) {
        let result = table.resolve(&NavigationTarget::named(Page::EditarHoja));

        assert_eq!(
            result.err(),
            Some(NavigationError::MissingParam {
                page: Page::EditarHoja,
                param: "id".to_owned()
            })
        );
    }

    #[rstest]
    fn full_path_should_encode_query(table: RouteTable) {
        let target = NavigationTarget::named(Page::Login).with_query("redirect", "/editar/3");

        let (_, location) = table.resolve(&target).expect("Login should resolve");

        assert_eq!(location.full_path(), "/login?redirect=%2Feditar%2F3");
    }

    #[test]
    fn new_should_reject_duplicate_registrations() {
        let result = RouteTable::new(vec![
            RouteDescriptor::new("/configuracion", Page::AdminConfig, View::AdminConfig, true),
            RouteDescriptor::new("/configuracion", Page::AdminConfig, View::AdminConfig, true),
        ]);

        assert!(result.is_err());
    }

    #[rstest]
    fn standard_table_should_only_leave_login_public(table: RouteTable) {
        let public: Vec<Page> = table
            .routes()
            .iter()
            .filter(|route| !route.requires_auth)
            .map(|route| route.page)
            .collect();

        assert_eq!(public, vec![Page::Login]);
    }
}
