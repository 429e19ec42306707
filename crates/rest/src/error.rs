//! REST error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use meshgate_gateway::DispatchError;
use meshgate_primitives::MAX_TEXT_CHARS;

/// Failures surfaced to REST callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The message exceeds the outbound bound.
    #[error("message exceeds {MAX_TEXT_CHARS} characters")]
    MessageTooLong,

    /// The destination id could not be parsed.
    #[error("invalid destination id: {0:?}")]
    BadDestination(String),

    /// The gateway has no mesh link right now.
    #[error("gateway is not connected to the mesh")]
    NotConnected,

    /// The transport accepted the request but transmission failed.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MessageTooLong | ApiError::BadDestination(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::NotConnected => ApiError::NotConnected,
            DispatchError::TextTooLong { .. } => ApiError::MessageTooLong,
            other => ApiError::Transport(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
