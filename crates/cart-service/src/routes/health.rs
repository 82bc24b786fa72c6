//! Liveness and readiness checks.

use std::collections::HashMap;
use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use catalog_observe::RequestContext;

use crate::state::AppState;

/// Upper bound on a readiness ping.
pub const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn liveness() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the store and reports `{"<backend>": true}`, or 503 with `false`
/// when the ping fails or takes longer than [`READINESS_TIMEOUT`].
pub async fn readiness(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> (StatusCode, Json<HashMap<&'static str, bool>>) {
    let ctx = ctx.with_timeout(READINESS_TIMEOUT);
    let store = state.store();
    let healthy = match store.ping(&ctx).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(backend = store.backend(), error = %e, "readiness ping failed");
            false
        }
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HashMap::from([(store.backend(), healthy)])))
}
