use std::path::{Path, PathBuf};

use common::{env_opt, env_or, error::HsResult};
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_CSRF_COOKIE: &str = "XSRF-TOKEN";
const DEFAULT_CSRF_HEADER: &str = "X-XSRF-TOKEN";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Runtime settings of the client, read from the environment
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Origin of the backend. All API paths are resolved against it.
    pub api_url: Url,
    /// Name of the cookie the backend stores the CSRF token in
    pub csrf_cookie: String,
    /// Header the CSRF token is echoed back under
    pub csrf_header: String,
    /// Origin announced on every request. Sanctum only starts a cookie session for requests
    /// coming from one of its stateful domains.
    pub frontend_origin: String,
    /// Directory downloaded documents are written to
    pub document_dir: PathBuf,
    /// Optional program used to open downloaded documents
    pub document_viewer: Option<String>,
}

impl ClientSettings {
    /// Read the settings from `HS_API_URL`, `HS_CSRF_COOKIE`, `HS_CSRF_HEADER`, `HS_PDF_DIR` and
    /// `HS_PDF_VIEWER` (plus `HS_FRONTEND_ORIGIN`), using the local development defaults for anything unset.
    /// # Errors
    /// This function will return an error if a variable holds invalid unicode or `HS_API_URL` is
    /// not a valid URL
    pub fn from_env() -> HsResult<Self> {
        let api_url = Url::parse(&env_or("HS_API_URL", DEFAULT_API_URL)?)?;
        let document_dir = match env_opt("HS_PDF_DIR")? {
            Some(dir) => PathBuf::from(dir),
            None => std::env::temp_dir(),
        };
        Ok(Self {
            api_url,
            csrf_cookie: env_or("HS_CSRF_COOKIE", DEFAULT_CSRF_COOKIE)?,
            csrf_header: env_or("HS_CSRF_HEADER", DEFAULT_CSRF_HEADER)?,
            frontend_origin: env_or("HS_FRONTEND_ORIGIN", DEFAULT_FRONTEND_ORIGIN)?,
            document_dir,
            document_viewer: env_opt("HS_PDF_VIEWER")?,
        })
    }
}

/// Start log4rs from the YAML configuration at `path`
/// # Errors
/// This function will return an error if the file cannot be read or is not a valid log4rs
/// configuration
pub fn init_logging(path: &Path) -> HsResult<()> {
    log4rs::init_file(path, Default::default())
        .map_err(|error| format!("Could not start logging from {}. {error}", path.display()))?;
    Ok(())
}

impl Default for ClientSettings {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API url is valid"),
            csrf_cookie: DEFAULT_CSRF_COOKIE.to_owned(),
            csrf_header: DEFAULT_CSRF_HEADER.to_owned(),
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_owned(),
            document_dir: std::env::temp_dir(),
            document_viewer: None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        path::Path,
        sync::{Mutex, PoisonError},
    };

    use common::error::HsError;

    use super::{init_logging, ClientSettings};

    const VARIABLES: [&str; 6] = [
        "HS_API_URL",
        "HS_CSRF_COOKIE",
        "HS_CSRF_HEADER",
        "HS_FRONTEND_ORIGIN",
        "HS_PDF_DIR",
        "HS_PDF_VIEWER",
    ];

    /// Serializes tests that touch the process environment
    static ENVIRONMENT: Mutex<()> = Mutex::new(());

    fn clear_environment() {
        for variable in VARIABLES {
            std::env::remove_var(variable);
        }
    }

    #[test]
    fn from_env_should_fall_back_to_defaults() {
        let _environment = ENVIRONMENT.lock().unwrap_or_else(PoisonError::into_inner);
        clear_environment();

        let settings = ClientSettings::from_env().expect("Defaults should load");

        assert_eq!(settings.api_url.as_str(), "http://localhost:8000/");
        assert_eq!(settings.csrf_cookie, "XSRF-TOKEN");
        assert_eq!(settings.csrf_header, "X-XSRF-TOKEN");
        assert_eq!(settings.frontend_origin, "http://localhost:5173");
        assert_eq!(settings.document_dir, std::env::temp_dir());
        assert!(settings.document_viewer.is_none());
    }

    #[test]
    fn from_env_should_read_overrides() {
        let _environment = ENVIRONMENT.lock().unwrap_or_else(PoisonError::into_inner);
        clear_environment();
        std::env::set_var("HS_API_URL", "https://rh.example.com");
        std::env::set_var("HS_PDF_DIR", "/var/tmp/hojas");
        std::env::set_var("HS_PDF_VIEWER", " ");

        let settings = ClientSettings::from_env();
        clear_environment();
        let settings = settings.expect("Overrides should load");

        assert_eq!(settings.api_url.as_str(), "https://rh.example.com/");
        assert_eq!(settings.document_dir, Path::new("/var/tmp/hojas"));
        assert!(settings.document_viewer.is_none());
    }

    #[test]
    fn from_env_should_reject_invalid_api_url() {
        let _environment = ENVIRONMENT.lock().unwrap_or_else(PoisonError::into_inner);
        clear_environment();
        std::env::set_var("HS_API_URL", "no es una url");

        let result = ClientSettings::from_env();
        clear_environment();

        assert!(matches!(result, Err(HsError::Url(_))));
    }

    #[test]
    fn init_logging_should_fail_for_missing_configuration() {
        let path = std::env::temp_dir().join("hojas-missing-log-config.yml");

        let result = init_logging(&path);

        assert!(matches!(result, Err(HsError::Generic(_))));
    }
}
