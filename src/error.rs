//! Error types for the FalconX client library.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for all FalconX client operations.
#[derive(Error, Debug)]
pub enum FalconxError {
    /// Missing or malformed credential, raised before any network activity.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced a response (DNS, refused connection, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server rejected the signature or the credentials (401/403).
    #[error("Authentication rejected: {0}")]
    Auth(ApiError),

    /// Any other 4xx response.
    #[error("Client error: {0}")]
    Client(ApiError),

    /// A 5xx response.
    #[error("Server error: {0}")]
    Server(ApiError),

    /// Streaming session failure (socket, protocol, or session not usable).
    #[error("Stream error: {0}")]
    Stream(String),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// A successful response whose body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl FalconxError {
    /// Map a non-2xx HTTP response into the matching error kind.
    ///
    /// Statuses outside 4xx and 5xx (informational, unfollowed redirects)
    /// are reported as [`FalconxError::InvalidResponse`].
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let error = ApiError::from_response(status, body);
        match status.as_u16() {
            401 | 403 => FalconxError::Auth(error),
            400..=499 => FalconxError::Client(error),
            500..=599 => FalconxError::Server(error),
            _ => FalconxError::InvalidResponse(format!("unexpected status {error}")),
        }
    }

    /// The server-supplied error details, when the error came from an HTTP response.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            FalconxError::Auth(e) | FalconxError::Client(e) | FalconxError::Server(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status code, when a response was received.
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }
}

/// Error details reported by the FalconX REST API.
///
/// Serializes as `{status, statusText, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase for the status code (e.g. "Unauthorized").
    #[serde(rename = "statusText")]
    pub status_text: String,
    /// Message supplied by the server.
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status, self.status_text, self.message)
    }
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: u16, status_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            message: message.into(),
        }
    }

    /// Build an API error from a response status and its raw body.
    ///
    /// FalconX error bodies carry a `message` field; when it is missing the
    /// raw body text is kept instead.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());

        Self::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            message,
        )
    }
}
