use std::sync::Arc;

use common::error::HsResult;
use hojas_common::Credentials;

use crate::{
    config::ClientSettings,
    http::{ApiClient, ApiTransport},
    router::{Navigator, Router},
    routes::{
        Location, NavigationError, NavigationTarget, RouteTable, LANDING_PATH, REDIRECT_QUERY,
    },
    stores::{
        auth::AuthStore, configuracion::ConfiguracionStore, notas_buenas::NotasBuenasStore,
        personal::PersonalStore,
    },
};

/// Every store of the application plus the router, sharing one transport
pub struct App<T> {
    pub auth: AuthStore<T>,
    pub notas_buenas: NotasBuenasStore<T>,
    pub personal: PersonalStore<T>,
    pub configuracion: ConfiguracionStore<T>,
    pub router: Router,
}

impl App<ApiClient> {
    /// Build the application against the backend described by `settings`. Returns once the
    /// session has been verified, so the router is ready for guarded navigation.
    /// # Errors
    /// This function will return an error if the HTTP client cannot be built from `settings`
    pub async fn bootstrap(settings: &ClientSettings) -> HsResult<Self> {
        let api = Arc::new(ApiClient::new(settings)?);
        log::info!("Connecting to {}", api.base_url());
        Ok(Self::with_transport(api, RouteTable::standard()?).await)
    }
}

impl<T: ApiTransport> App<T> {
    pub async fn with_transport(api: Arc<T>, routes: RouteTable) -> Self {
        let auth = AuthStore::new(api.clone());
        let resolved = auth.resolve().await;
        let router = Router::new(routes, auth.subscribe(), resolved);
        Self {
            auth,
            notas_buenas: NotasBuenasStore::new(api.clone()),
            personal: PersonalStore::new(api.clone()),
            configuracion: ConfiguracionStore::new(api),
            router,
        }
    }

    /// Initial navigation to `path`
    /// # Errors
    /// This function will return an error if `path` matches no route
    pub fn start(&self, path: &str) -> Result<Location, NavigationError> {
        self.router.push(path.into())
    }

    /// Log in and, when the session is established, go back to the path the guard interrupted
    /// (or the landing page)
    /// # Errors
    /// This function will return the error of [AuthStore::login]
    pub async fn login(&self, credentials: &Credentials) -> HsResult<bool> {
        let logged_in = self.auth.login(credentials).await?;
        if !logged_in {
            return Ok(false);
        }
        let destination = self
            .router
            .current()
            .and_then(|location| location.query.get(REDIRECT_QUERY).cloned())
            .unwrap_or_else(|| LANDING_PATH.to_owned());
        match self.router.push(NavigationTarget::from(destination)) {
            Ok(_) | Err(NavigationError::Duplicated(_)) => {}
            Err(error) => log::warn!("Could not return after login. {error}"),
        }
        Ok(true)
    }

    pub async fn logout(&self) {
        self.auth.logout(&self.router).await;
    }
}
