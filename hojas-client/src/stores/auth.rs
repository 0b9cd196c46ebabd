use std::sync::Arc;

use common::error::{HsError, HsResult};
use hojas_common::{Credentials, User};
use tokio::sync::watch;

use crate::{
    http::ApiTransport,
    router::Navigator,
    routes::{NavigationError, NavigationTarget, Page},
};

const USER_PATH: &str = "/api/user";
const CSRF_COOKIE_PATH: &str = "/sanctum/csrf-cookie";
const LOGIN_PATH: &str = "/api/login";
const LOGOUT_PATH: &str = "/api/logout";

/// Authenticated user context cached by the client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub is_authenticated: bool,
    pub user: Option<User>,
}

impl Session {
    const fn authenticated(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }

    /// Already verified against the backend with a known user
    const fn is_verified(&self) -> bool {
        self.is_authenticated && self.user.is_some()
    }
}

/// Proof that the session has been verified against the backend at least once. Required to build
/// the [Router][crate::router::Router] so the guard never runs on an unresolved session.
#[derive(Debug)]
pub struct SessionResolved(());

#[cfg(test)]
impl SessionResolved {
    pub(crate) const fn assumed() -> Self {
        Self(())
    }
}

/// Owner of the client [Session]. Observers read it through [AuthStore::subscribe].
pub struct AuthStore<T> {
    api: Arc<T>,
    state: Arc<watch::Sender<Session>>,
}

impl<T> Clone for AuthStore<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T: ApiTransport> AuthStore<T> {
    pub fn new(api: Arc<T>) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn clear(&self) {
        self.state.send_replace(Session::default());
    }

    /// Verify the session against the backend unless a user is already cached. Any failure,
    /// including auth challenges, leaves the store unauthenticated; nothing is returned to the
    /// caller.
    pub async fn check_status(&self) {
        let verified = self.state.borrow().is_verified();
        if verified {
            return;
        }
        log::debug!("Verifying session with {USER_PATH}");
        let user = match self.api.get(USER_PATH).await {
            Ok(response) => match response.json_opt::<User>() {
                Ok(user) => user,
                Err(error) => {
                    log::warn!("Session check returned an unreadable user. {error}");
                    None
                }
            },
            Err(error) if error.is_auth_challenge() => {
                log::info!("No active session ({:?})", error.status());
                None
            }
            Err(error) => {
                log::warn!("Could not verify session. {error}");
                None
            }
        };
        match user {
            Some(user) => {
                log::info!("Active session found for {}", user.email);
                self.state.send_replace(Session::authenticated(user));
            }
            None => self.clear(),
        }
    }

    /// Run [AuthStore::check_status] and hand back the token that unlocks router construction
    pub async fn resolve(&self) -> SessionResolved {
        self.check_status().await;
        SessionResolved(())
    }

    /// Prime the CSRF cookie, submit `credentials` and verify the resulting session. Returns the
    /// authenticated flag after verification.
    /// # Errors
    /// This function will return [HsError::CsrfConfiguration] if the CSRF cookie could not be
    /// obtained (the credentials are never sent in that case), or the login request's error if
    /// the backend rejects it. The session is cleared on both paths.
    pub async fn login(&self, credentials: &Credentials) -> HsResult<bool> {
        log::info!("Attempting login for {}", credentials.email);
        let body = serde_json::to_value(credentials)?;
        if let Err(error) = self.api.get(CSRF_COOKIE_PATH).await {
            log::error!("Could not obtain the CSRF cookie. {error}");
            self.clear();
            return Err(HsError::CsrfConfiguration);
        }
        log::debug!("CSRF cookie obtained");
        if let Err(error) = self.api.post(LOGIN_PATH, Some(body)).await {
            match error.response_message() {
                Some(message) => log::error!("Login rejected. {message}"),
                None => log::error!("Login request failed. {error}"),
            }
            self.clear();
            return Err(error);
        }
        self.check_status().await;
        Ok(self.is_logged_in())
    }

    /// End the session on the backend and locally. The local session is always cleared and the
    /// `navigator` sent to the login page, even when the backend call fails.
    pub async fn logout<N: Navigator + ?Sized>(&self, navigator: &N) {
        match self.api.post(LOGOUT_PATH, None).await {
            Ok(_) => log::info!("Logged out"),
            Err(error) => log::error!("Logout request failed, clearing local session. {error}"),
        }
        self.clear();
        match navigator.push(NavigationTarget::named(Page::Login)) {
            Ok(_) | Err(NavigationError::Duplicated(_)) => {}
            Err(error) => log::error!("Could not redirect to login. {error}"),
        }
    }
}
