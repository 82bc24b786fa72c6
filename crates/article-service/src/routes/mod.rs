//! HTTP route handlers for the article service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                        - Readiness check (alias)
//! GET    /health                  - Liveness check
//! GET    /healthz                 - Readiness check
//! GET    /health/ready            - Readiness check
//!
//! GET    /article/                - List articles
//! POST   /article/                - Create article
//! DELETE /article/{article_id}/   - Delete article
//! ```

pub mod article;
pub mod health;

use axum::{Router, http::Method, middleware, routing::{delete, get}};
use catalog_observe::{AccessLog, access_log_middleware, cors_layer, request_id_middleware};

use crate::state::AppState;

/// Paths excluded from the access log.
pub const QUIET_PATHS: [&str; 3] = ["/", "/health", "/healthz"];

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::readiness))
        .route("/health", get(health::liveness))
        .route("/healthz", get(health::readiness))
        .route("/health/ready", get(health::readiness))
        .route("/article/", get(article::list).post(article::create))
        .route("/article/{article_id}/", delete(article::remove))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            AccessLog::skipping(QUIET_PATHS),
            access_log_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&[Method::GET, Method::POST, Method::DELETE]))
}
