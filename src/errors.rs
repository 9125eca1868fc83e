//! Errors surfaced to callers of the shim.
//!
//! Every failure is rendered as a JSON `{"error": ..., "message": ...}` body with a matching
//! status code. Nothing is retried and nothing is swallowed.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::backend::BackendError;

pub(crate) const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, thiserror::Error)]
pub enum ShimError {
    /// A required field was missing or malformed.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Known path, wrong verb.
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    /// The inference backend rejected the call.
    #[error("Inference failed: {0}")]
    Backend(#[from] BackendError),

    /// Anything else. `None` when no message could be recovered.
    #[error("Internal server error")]
    Internal(Option<String>),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}

impl ShimError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Backend(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, message) = match self {
            Self::BadRequest(msg) => ("Invalid request", Some(msg.clone())),
            Self::MethodNotAllowed => ("Method not allowed", None),
            Self::NotFound => ("Not found", None),
            Self::Backend(e) => ("Inference failed", Some(e.to_string())),
            Self::Internal(msg) => (
                "Internal server error",
                Some(msg.clone().unwrap_or_else(|| UNKNOWN_ERROR.to_string())),
            ),
        };

        ErrorBody {
            error: error.to_string(),
            message,
        }
    }
}

impl IntoResponse for ShimError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
