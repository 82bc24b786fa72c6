//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry and logged before responding; the client only ever sees
//! a fixed message in a `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog_core::IdError;
use serde_json::json;
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::store::StoreError;

/// Application-level error type for the cart service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Repository(RepositoryError::Store(StoreError::Cancelled)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Repository(RepositoryError::Store(StoreError::DeadlineExceeded)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client.
    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Repository(RepositoryError::Store(StoreError::Cancelled)) => {
                "Request cancelled".to_string()
            }
            Self::Repository(RepositoryError::Store(StoreError::DeadlineExceeded)) => {
                "Request timed out".to_string()
            }
            Self::Repository(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if status.is_server_error() {
            tracing::warn!(error = %self, "Request interrupted");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
