//! Catalog Observe - request tracing and logging for the catalog services.
//!
//! # Modules
//!
//! - [`context`] - [`RequestContext`], the explicit per-request trace handle
//! - [`middleware`] - Request ID, access log, and CORS middleware
//! - [`tracing_setup`] - Subscriber and Sentry initialization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod context;
pub mod middleware;
pub mod tracing_setup;

pub use context::{Interrupted, RequestContext, TraceParent};
pub use middleware::{
    AccessLog, REQUEST_ID_HEADER, access_log_middleware, cors_layer, request_id_middleware,
};
