//! Unified error handling with Sentry integration.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use catalog_core::{ArticleError, IdError};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type for the article service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

impl From<ArticleError> for AppError {
    fn from(err: ArticleError) -> Self {
        Self::BadRequest(err.to_string())
    }
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
            Self::Database(RepositoryError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(RepositoryError::DeadlineExceeded) => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(RepositoryError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
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

        // Don't expose internal error details to clients
        let message = match &self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Database(RepositoryError::Cancelled) => "Request cancelled".to_string(),
            Self::Database(RepositoryError::DeadlineExceeded) => "Request timed out".to_string(),
            Self::Database(RepositoryError::Database(_)) => "Internal server error".to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
