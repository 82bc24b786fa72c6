//! Liveness and readiness checks.

use std::collections::HashMap;
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use catalog_observe::RequestContext;

use crate::db::ArticleRepository;
use crate::state::AppState;

/// Upper bound on a readiness query.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Name of the backend in readiness responses.
const BACKEND: &str = "postgres";

/// Liveness health check endpoint.
pub async fn liveness() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Runs `SELECT 1` and returns 503 Service Unavailable if the database is
/// not reachable within [`READINESS_TIMEOUT`].
pub async fn readiness(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> (StatusCode, Json<HashMap<&'static str, bool>>) {
    let ctx = ctx.with_timeout(READINESS_TIMEOUT);
    match ArticleRepository::new(state.pool()).ping(&ctx).await {
        Ok(()) => (StatusCode::OK, Json(HashMap::from([(BACKEND, true)]))),
        Err(e) => {
            tracing::warn!(error = %e, "readiness query failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HashMap::from([(BACKEND, false)])),
            )
        }
    }
}
