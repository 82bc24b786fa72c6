//! Per-request trace context.
//!
//! A [`RequestContext`] is built once at the transport boundary from the
//! inbound headers, then passed explicitly through every call that does I/O on
//! behalf of the request. It carries:
//!
//! - the correlation IDs (`x-request-id`, W3C `traceparent` trace and parent IDs)
//! - a `tracing` span for the logical operation
//! - a cancellation token and an optional deadline that bound every store call
//!
//! The context is closed when it is dropped. Handlers own it by value, so it
//! is closed on every exit path: success, validation failure, or store error.
//!
//! Nothing here reads task-locals or global state. Code under test builds a
//! context with [`RequestContext::detached`].

use std::borrow::Cow;
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;

use axum::extract::{FromRequestParts, MatchedPath};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::middleware::REQUEST_ID_HEADER;

/// The W3C trace context header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Why a bounded call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    /// The context was cancelled.
    #[error("operation cancelled")]
    Cancelled,
    /// The context deadline elapsed.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A parsed W3C `traceparent` header.
///
/// Format: `{version}-{trace-id}-{parent-id}-{flags}`, e.g.
/// `00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParent {
    /// 32 lowercase hex digits, never all zero.
    pub trace_id: String,
    /// 16 lowercase hex digits identifying the caller's span.
    pub parent_id: String,
    /// Whether the caller sampled this trace (flag bit 0).
    pub sampled: bool,
}

impl TraceParent {
    /// Parse a `traceparent` value. Returns `None` for anything malformed.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let parent_id = parts.next()?;
        let flags = parts.next()?;

        // Version 00 has exactly four fields; later versions may append more.
        if version == "00" && parts.next().is_some() {
            return None;
        }
        if !is_lower_hex(version, 2) || version == "ff" {
            return None;
        }
        if !is_lower_hex(trace_id, 32) || is_all_zero(trace_id) {
            return None;
        }
        if !is_lower_hex(parent_id, 16) || is_all_zero(parent_id) {
            return None;
        }
        if !is_lower_hex(flags, 2) {
            return None;
        }
        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_owned(),
            parent_id: parent_id.to_owned(),
            sampled: flags & 0x01 == 0x01,
        })
    }
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn is_all_zero(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn new_span_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// Correlation and cancellation handle for one request.
#[derive(Debug)]
pub struct RequestContext {
    request_id: String,
    trace_id: String,
    span_id: String,
    parent_span_id: Option<String>,
    operation: Cow<'static, str>,
    span: Span,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    opened_at: Instant,
}

impl RequestContext {
    /// Build a context from inbound headers.
    ///
    /// Uses `x-request-id` when present (otherwise generates a UUID v4) and
    /// continues the trace from `traceparent` when it is well-formed
    /// (otherwise starts a new trace).
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, operation: impl Into<Cow<'static, str>>) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), String::from);

        let parent = headers
            .get(TRACEPARENT_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(TraceParent::parse);

        let (trace_id, parent_span_id) = match parent {
            Some(tp) => (tp.trace_id, Some(tp.parent_id)),
            None => (new_trace_id(), None),
        };

        Self::open(
            request_id,
            trace_id,
            parent_span_id,
            operation.into(),
            None,
            CancellationToken::new(),
            None,
        )
    }

    /// Build a context that is not attached to any inbound request.
    ///
    /// Used by background tasks, health checks and tests.
    #[must_use]
    pub fn detached(operation: impl Into<Cow<'static, str>>) -> Self {
        Self::open(
            Uuid::new_v4().to_string(),
            new_trace_id(),
            None,
            operation.into(),
            None,
            CancellationToken::new(),
            None,
        )
    }

    fn open(
        request_id: String,
        trace_id: String,
        parent_span_id: Option<String>,
        operation: Cow<'static, str>,
        parent_span: Option<&Span>,
        cancel: CancellationToken,
        deadline: Option<Instant>,
    ) -> Self {
        let span_id = new_span_id();
        let parent_field = parent_span_id.as_deref().unwrap_or("");
        let span = match parent_span {
            Some(parent) => tracing::info_span!(
                parent: parent,
                "operation",
                operation = %operation,
                request_id = %request_id,
                trace_id = %trace_id,
                span_id = %span_id,
                parent_span_id = %parent_field,
            ),
            None => tracing::info_span!(
                "request",
                operation = %operation,
                request_id = %request_id,
                trace_id = %trace_id,
                span_id = %span_id,
                parent_span_id = %parent_field,
            ),
        };

        Self {
            request_id,
            trace_id,
            span_id,
            parent_span_id,
            operation,
            span,
            cancel,
            deadline,
            opened_at: Instant::now(),
        }
    }

    /// Open a nested context for a sub-operation.
    ///
    /// The child shares the request and trace IDs and the deadline. Cancelling
    /// the parent cancels the child; cancelling the child leaves the parent
    /// running.
    #[must_use]
    pub fn child(&self, operation: impl Into<Cow<'static, str>>) -> Self {
        Self::open(
            self.request_id.clone(),
            self.trace_id.clone(),
            Some(self.span_id.clone()),
            operation.into(),
            Some(&self.span),
            self.cancel.child_token(),
            self.deadline,
        )
    }

    /// Bound the context by a timeout from now.
    ///
    /// An existing earlier deadline is kept.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// Run `fut` inside this context's span, failing fast if the context is
    /// cancelled or its deadline elapses first.
    ///
    /// # Errors
    ///
    /// Returns `Interrupted::Cancelled` or `Interrupted::DeadlineExceeded`.
    /// The future is dropped in either case.
    pub async fn bound<F, T>(&self, fut: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        let fut = fut.instrument(self.span.clone());
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            () = wait_for(self.deadline) => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once this context or an ancestor has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The `x-request-id` shared by every context of this request.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// W3C trace ID, continued from `traceparent` or freshly generated.
    #[must_use]
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// This context's own 16-hex-digit span ID.
    #[must_use]
    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    /// Span ID of the parent context or upstream caller, if any.
    #[must_use]
    pub fn parent_span_id(&self) -> Option<&str> {
        self.parent_span_id.as_deref()
    }

    /// Logical operation name, e.g. `GET /cart/{cart_id}/` or `get_cart`.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The `tracing` span opened for this context.
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Instant after which bounded calls fail with `DeadlineExceeded`.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        let elapsed_ms = self.opened_at.elapsed().as_millis();
        let _entered = self.span.enter();
        tracing::debug!(
            operation = %self.operation,
            elapsed_ms,
            cancelled = self.cancel.is_cancelled(),
            "request context closed"
        );
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Extracts a fresh [`RequestContext`] for every handler invocation.
///
/// The operation name is the HTTP method plus the matched route template,
/// e.g. `PUT /cart/{cart_id}/`.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let route = parts
            .extensions
            .get::<MatchedPath>()
            .map_or_else(|| parts.uri.path().to_owned(), |p| p.as_str().to_owned());
        let operation = format!("{} {route}", parts.method);
        Ok(Self::from_headers(&parts.headers, operation))
    }
}
