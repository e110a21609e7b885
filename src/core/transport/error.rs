//! Transport error types.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A message referenced a session that is not open.
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// A message body was not a JSON-RPC message.
    #[error("Could not parse message: {0}")]
    ParseError(String),

    /// HTTP-specific error.
    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl TransportError {
    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    /// Create an unknown session error.
    pub fn unknown_session(id: impl Into<String>) -> Self {
        Self::UnknownSession(id.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl ToString) -> Self {
        Self::ParseError(msg.to_string())
    }

    /// Create an HTTP error.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::HttpError(msg.into())
    }
}

impl IntoResponse for TransportError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::UnknownSession(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::ParseError(_) => (StatusCode::BAD_REQUEST, "Could not parse message".to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
