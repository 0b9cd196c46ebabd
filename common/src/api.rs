use serde::{Deserialize, Serialize};

/// Content formats the backend answers with that the client knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiContentFormat {
    Json,
    Pdf,
}

impl ApiContentFormat {
    /// Classify a `Content-Type` header value. Suffixed types such as `application/problem+json`
    /// count as [ApiContentFormat::Json].
    pub fn from_content_type(value: &str) -> Option<Self> {
        let mime = value.parse::<mime::Mime>().ok()?;
        if mime.subtype() == mime::JSON || mime.suffix() == Some(mime::JSON) {
            return Some(Self::Json);
        }
        if mime.subtype().as_str() == "pdf" {
            return Some(Self::Pdf);
        }
        None
    }
}

/// Body of an error response from the backend. Laravel validation and auth failures always carry
/// a top level `message`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Best effort extraction of the `message` field from an error response body. Only attempted
/// when the `content_type` is JSON, mirroring how a binary download reports failures.
pub fn error_message(content_type: Option<&str>, body: &[u8]) -> Option<String> {
    let format = content_type.and_then(ApiContentFormat::from_content_type)?;
    if format != ApiContentFormat::Json {
        return None;
    }
    match serde_json::from_slice::<ApiMessage>(body) {
        Ok(ApiMessage { message }) if !message.is_empty() => Some(message),
        Ok(_) => None,
        Err(error) => {
            log::debug!("Error body is not a message object. {error}");
            None
        }
    }
}
