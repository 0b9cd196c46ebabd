use tokio::sync::watch;

use crate::{
    guard::{self, GuardOutcome},
    routes::{Location, NavigationError, NavigationTarget, RouteTable, View},
    stores::auth::{Session, SessionResolved},
};

/// Upper bound of guard redirects followed for a single navigation
const MAX_REDIRECTS: usize = 8;

/// Anything that can move the application to another location
#[cfg_attr(test, mockall::automock)]
pub trait Navigator {
    /// Navigate to `target`, returning the location finally reached after guard redirects
    /// # Errors
    /// This function will return an error if the target cannot be resolved, redirects do not
    /// settle, or the final location is the current one
    fn push(&self, target: NavigationTarget) -> Result<Location, NavigationError>;
}

/// Client side router. Every navigation passes through the guard, which only reads the cached
/// session published by the auth store.
pub struct Router {
    routes: RouteTable,
    session: watch::Receiver<Session>,
    current: watch::Sender<Option<Location>>,
}

impl Router {
    /// Build the router over `routes`. The [SessionResolved] token guarantees the session has
    /// been verified before the first guarded navigation.
    pub fn new(
        routes: RouteTable,
        session: watch::Receiver<Session>,
        _resolved: SessionResolved,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            routes,
            session,
            current,
        }
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn current(&self) -> Option<Location> {
        self.current.borrow().clone()
    }

    /// View of the current route, if the router has navigated anywhere yet
    pub fn current_view(&self) -> Option<View> {
        let current = self.current.borrow();
        let location = current.as_ref()?;
        self.routes.get(location.page).map(|route| route.view)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Location>> {
        self.current.subscribe()
    }
}

impl Navigator for Router {
    fn push(&self, target: NavigationTarget) -> Result<Location, NavigationError> {
        let (mut route, mut location) = self.routes.resolve(&target)?;
        let requested = location.full_path();
        for _ in 0..MAX_REDIRECTS {
            let is_logged_in = self.session.borrow().is_authenticated;
            match guard::evaluate(route, &location, is_logged_in) {
                GuardOutcome::Allow => {
                    if self.current.borrow().as_ref() == Some(&location) {
                        return Err(NavigationError::Duplicated(location.full_path()));
                    }
                    log::debug!("Navigated to {}", location.full_path());
                    self.current.send_replace(Some(location.clone()));
                    return Ok(location);
                }
                GuardOutcome::Redirect(next) => (route, location) = self.routes.resolve(&next)?,
            }
        }
        log::warn!("Navigation to {requested} did not settle after {MAX_REDIRECTS} redirects");
        Err(NavigationError::RedirectLoop(requested))
    }
}

#[cfg(test)]
mod test {
    use rstest::{fixture, rstest};
    use tokio::sync::watch;

    use super::{Navigator, Router};
    use crate::{
        routes::{NavigationError, NavigationTarget, Page, RouteDescriptor, RouteTable, View},
        stores::auth::{Session, SessionResolved},
    };

    fn session(is_authenticated: bool) -> Session {
        Session {
            is_authenticated,
            user: None,
        }
    }

    #[fixture]
    fn logged_out() -> (watch::Sender<Session>, Router) {
        let (sender, receiver) = watch::channel(session(false));
        let routes = RouteTable::standard().expect("Standard routes should be consistent");
        let router = Router::new(routes, receiver, SessionResolved::assumed());
        (sender, router)
    }

    #[rstest]
    fn protected_navigation_should_land_on_login(logged_out: (watch::Sender<Session>, Router)) {
        let (_session, router) = logged_out;

        let location = router.push("/lista".into()).expect("Navigation should settle");

        assert_eq!(location.page, Page::Login);
        assert_eq!(location.query.get("redirect").map(String::as_str), Some("/lista"));
        assert_eq!(router.current_view(), Some(View::LoginPage));
    }

    #[rstest]
    fn login_while_authenticated_should_land_on_list(
        logged_out: (watch::Sender<Session>, Router),
    ) {
        let (session, router) = logged_out;
        session.send_replace(self::session(true));

        let location = router.push("/login".into()).expect("Navigation should settle");

        assert_eq!(location.page, Page::ListarHojas);
        assert_eq!(location.path, "/lista");
    }

    #[rstest]
    fn authenticated_navigation_should_pass_unchanged(
        logged_out: (watch::Sender<Session>, Router),
    ) {
        let (session, router) = logged_out;
        session.send_replace(self::session(true));

        let location = router
            .push(NavigationTarget::named(Page::EditarHoja).with_param("id", "4"))
            .expect("Navigation should settle");

        assert_eq!(location.path, "/editar/4");
        assert_eq!(router.current(), Some(location));
    }

    #[rstest]
    fn navigating_to_current_location_should_be_duplicated(
        logged_out: (watch::Sender<Session>, Router),
    ) {
        let (_session, router) = logged_out;
        router.push("/login".into()).expect("First navigation should settle");

        let result = router.push(NavigationTarget::named(Page::Login));

        assert_eq!(
            result,
            Err(NavigationError::Duplicated("/login".to_owned()))
        );
    }

    #[rstest]
    fn unknown_path_should_not_move(logged_out: (watch::Sender<Session>, Router)) {
        let (_session, router) = logged_out;

        let result = router.push("/nada".into());

        assert!(matches!(result, Err(NavigationError::NotFound(_))));
        assert!(router.current().is_none());
    }

    #[rstest]
    fn guard_should_follow_session_changes(logged_out: (watch::Sender<Session>, Router)) {
        let (session, router) = logged_out;
        session.send_replace(self::session(true));
        router.push("/configuracion".into()).expect("Navigation should settle");

        session.send_replace(self::session(false));
        let location = router.push("/lista".into()).expect("Navigation should settle");

        assert_eq!(location.page, Page::Login);
    }

    #[test]
    fn protected_login_page_should_report_redirect_loop() {
        let (_session, receiver) = watch::channel(session(false));
        let routes = RouteTable::new(vec![
            RouteDescriptor::new("/login", Page::Login, View::LoginPage, true),
            RouteDescriptor::new("/lista", Page::ListarHojas, View::ListaHojasServicio, true),
        ])
        .expect("Routes should be consistent");
        let router = Router::new(routes, receiver, SessionResolved::assumed());

        let result = router.push("/lista".into());

        assert_eq!(
            result,
            Err(NavigationError::RedirectLoop("/lista".to_owned()))
        );
        assert!(router.current().is_none());
    }
}
