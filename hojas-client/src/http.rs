use std::sync::Arc;

use common::error::{HsError, HsResult};
use percent_encoding::percent_decode_str;
use reqwest::{
    cookie::{CookieStore, Jar},
    header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER},
    Client, Method, RequestBuilder,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ClientSettings;

/// Successful (2xx) response from the backend, fully buffered
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> HsResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body as an optional `T`. An empty body or a JSON `null` yields [None].
    /// # Errors
    /// This function will return an error if the body is not empty and not valid JSON for `T`
    pub fn json_opt<T: DeserializeOwned>(&self) -> HsResult<Option<T>> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(serde_json::from_slice::<Option<T>>(&self.body)?)
    }
}

/// Transport used by every store to reach the backend. Paths are relative to the backend origin.
/// Non-2xx answers are returned as [HsError::Response].
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get(&self, path: &str) -> HsResult<ApiResponse>;
    async fn post(&self, path: &str, body: Option<Value>) -> HsResult<ApiResponse>;
}

/// Shared HTTP client bound to the backend origin. Cookies set by the backend are kept in a jar
/// and sent back on every request, and the CSRF cookie is echoed as a header.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    csrf_cookie: String,
    csrf_header: HeaderName,
    origin: HeaderValue,
}

impl ApiClient {
    /// Build the client from `settings`
    /// # Errors
    /// This function will return an error if the CSRF header name or frontend origin are not
    /// valid header values, or the underlying [Client] cannot be created
    pub fn new(settings: &ClientSettings) -> HsResult<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder().cookie_provider(jar.clone()).build()?;
        let csrf_header = HeaderName::from_bytes(settings.csrf_header.as_bytes())
            .map_err(|error| format!("Invalid CSRF header name. {error}"))?;
        let origin = HeaderValue::from_str(&settings.frontend_origin)
            .map_err(|error| format!("Invalid frontend origin. {error}"))?;
        Ok(Self {
            client,
            jar,
            base_url: settings.api_url.clone(),
            csrf_cookie: settings.csrf_cookie.clone(),
            csrf_header,
            origin,
        })
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current value of the CSRF cookie for the backend origin, percent decoded. [None] when the
    /// backend has not set the cookie yet.
    pub fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.csrf_cookie)
            .map(|(_, raw)| percent_decode_str(raw).decode_utf8_lossy().into_owned())
            .filter(|token| !token.is_empty())
    }

    fn request(&self, method: Method, path: &str) -> HsResult<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ORIGIN, self.origin.clone())
            .header(REFERER, self.origin.clone());
        match self.csrf_token() {
            Some(token) => builder = builder.header(self.csrf_header.clone(), token),
            None => log::trace!("No {} cookie present for {path}", self.csrf_cookie),
        }
        Ok(builder)
    }

    async fn send(builder: RequestBuilder) -> HsResult<ApiResponse> {
        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();
        if !status.is_success() {
            log::debug!("Backend answered {status}");
            return Err(HsError::Response {
                status: status.as_u16(),
                content_type,
                body,
            });
        }
        Ok(ApiResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait::async_trait]
impl ApiTransport for ApiClient {
    async fn get(&self, path: &str) -> HsResult<ApiResponse> {
        Self::send(self.request(Method::GET, path)?).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> HsResult<ApiResponse> {
        let mut builder = self.request(Method::POST, path)?;
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        Self::send(builder).await
    }
}
