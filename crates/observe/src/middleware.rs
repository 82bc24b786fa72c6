//! HTTP middleware shared by the catalog services.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, outermost)
//! 2. CORS (per service)
//! 3. Request ID (assign or propagate `x-request-id`)
//! 4. Access log (one line per request, skipping health check paths)

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that ensures every request has a unique request ID.
///
/// If the incoming request has an `x-request-id` header (from a load balancer
/// or another upstream proxy), that value is used. Otherwise, a new UUID v4 is
/// generated and written into the request headers so that handlers and the
/// [`RequestContext`](crate::RequestContext) extractor see the same value.
///
/// The request ID is also added to the Sentry scope and to the response
/// headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;

    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Paths excluded from the access log (health checks hit them constantly).
#[derive(Debug, Clone, Default)]
pub struct AccessLog {
    skipped: Arc<HashSet<String>>,
}

impl AccessLog {
    /// Create an access log that skips the given request paths.
    #[must_use]
    pub fn skipping<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            skipped: Arc::new(paths.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn is_skipped(&self, path: &str) -> bool {
        self.skipped.contains(path)
    }
}

/// Log one structured line per processed request.
///
/// 5xx responses are logged at ERROR, 4xx at WARN, everything else at INFO.
/// Install with `axum::middleware::from_fn_with_state(AccessLog::skipping(..), access_log_middleware)`.
pub async fn access_log_middleware(
    State(log): State<AccessLog>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let path = request.uri().path().to_owned();

    if log.is_skipped(&path) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let request_id = header_str(request.headers().get(REQUEST_ID_HEADER));
    let user_agent = header_str(request.headers().get(header::USER_AGENT));
    let referer = header_str(request.headers().get(header::REFERER));

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            %method, %path, status = status.as_u16(), latency_ms, %request_id, %user_agent, %referer,
            "Error when processing request"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            %method, %path, status = status.as_u16(), latency_ms, %request_id, %user_agent, %referer,
            "Invalid request"
        );
    } else {
        tracing::info!(
            %method, %path, status = status.as_u16(), latency_ms, %request_id, %user_agent, %referer,
            "Processed request"
        );
    }

    response
}

/// How long browsers may cache a preflight response.
pub const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// CORS policy for browser front-ends.
///
/// Any origin is accepted by mirroring it back (credentials forbid `*`).
/// Only `methods` are allowed; `Content-Length` is exposed.
#[must_use]
pub fn cors_layer(methods: &[Method]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(methods.to_vec())
        .allow_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(crate::context::TRACEPARENT_HEADER),
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

fn header_str(value: Option<&HeaderValue>) -> String {
    value
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
