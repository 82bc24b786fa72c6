//! HTTP route handlers for the cart service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                     - Readiness check (alias)
//! GET    /health               - Liveness check
//! GET    /healthz              - Readiness check
//! GET    /health/ready         - Readiness check
//!
//! GET    /cart/{cart_id}/       - Get cart (empty if never written)
//! PUT    /cart/{cart_id}/       - Replace cart items
//! POST   /cart/{cart_id}/items/ - Append one item
//! DELETE /cart/{cart_id}/       - Delete cart
//! ```

pub mod cart;
pub mod health;

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use catalog_observe::{AccessLog, access_log_middleware, cors_layer, request_id_middleware};

use crate::state::AppState;

/// Paths excluded from the access log (health check traffic).
pub const QUIET_PATHS: [&str; 3] = ["/", "/health", "/healthz"];

/// Build the full application router.
///
/// Layer order, outermost first: CORS, request ID, access log. Sentry layers
/// are added by the binary on top of this.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::readiness))
        .route("/health", get(health::liveness))
        .route("/healthz", get(health::readiness))
        .route("/health/ready", get(health::readiness))
        .route(
            "/cart/{cart_id}/",
            get(cart::show).put(cart::update).delete(cart::remove),
        )
        .route("/cart/{cart_id}/items/", post(cart::add_item))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            AccessLog::skipping(QUIET_PATHS),
            access_log_middleware,
        ))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&[
            Method::GET,
            Method::PUT,
            Method::POST,
            Method::DELETE,
        ]))
}
