//! API Error Types
//!
//! Errors raised while talking to the studio backend, and extraction of the
//! human-readable message the backend puts in its error bodies.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling the studio backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Backend could not be reached
    #[error("Backend unavailable")]
    Unavailable,

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("API error {status}: {}", message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    /// Response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client was misconfigured (bad base URL, bad header value)
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Message suitable for an operator-facing banner.
    ///
    /// Prefers the message the server sent; otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ApiError::Timeout => "The server did not respond in time".to_string(),
            ApiError::Unavailable => "The server is unavailable".to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error body shapes the backend is known to send
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorField>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Nested { message: String },
}

/// Pull a message out of an error response body.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}`,
/// `{"message": "..."}` and `{"detail": "..."}`; a short plain-text body is
/// used as-is.
pub fn extract_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let message = match parsed.error {
            Some(ErrorField::Text(text)) => Some(text),
            Some(ErrorField::Nested { message }) => Some(message),
            None => parsed.message.or(parsed.detail),
        };
        return message.filter(|m| !m.trim().is_empty());
    }

    if body.starts_with('<') || body.len() > 300 {
        return None;
    }
    Some(body.to_string())
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
