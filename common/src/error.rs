use thiserror::Error;

/// All possible error types that may occur while talking to the Hojas de Servicio backend
#[derive(Error, Debug)]
pub enum HsError {
    #[error("Reqwest Error\n{0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("JSON error\n{0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid URL\n{0}")]
    Url(#[from] url::ParseError),
    #[error("Environment Variable error\n{0}")]
    EnvVar(#[from] std::env::VarError),
    #[error("IO error\n{0}")]
    Io(#[from] std::io::Error),
    #[error("Request failed with status {status}")]
    Response {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    #[error("Error de configuración CSRF")]
    CsrfConfiguration,
    #[error("{0}")]
    Rejected(String),
    #[error("Route registered more than once: {0}")]
    DuplicateRoute(String),
    #[error("Generic error\n{0}")]
    Generic(String),
}

impl HsError {
    /// HTTP status of a rejected response. [None] for errors that never reached the backend.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the backend answered with an auth challenge (401 or 419). Sanctum uses
    /// 419 for an expired CSRF token.
    pub const fn is_auth_challenge(&self) -> bool {
        matches!(self.status(), Some(401 | 419))
    }

    /// Extract the `message` field of a JSON error body returned by the backend, if any
    pub fn response_message(&self) -> Option<String> {
        let Self::Response {
            content_type, body, ..
        } = self
        else {
            return None;
        };
        crate::api::error_message(content_type.as_deref(), body)
    }
}

impl From<&str> for HsError {
    fn from(value: &str) -> Self {
        Self::Generic(value.to_owned())
    }
}

impl From<String> for HsError {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

/// Generic [Result][std::result::Result] type where the error is always [HsError]
pub type HsResult<T> = std::result::Result<T, HsError>;
