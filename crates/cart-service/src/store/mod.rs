//! Key-value store client for cart entries.
//!
//! # Architecture
//!
//! The [`KeyValueStore`] trait is the whole capability surface the cart
//! repository needs: get, set, delete, plus a ping for readiness checks.
//! Values are written as strings and read back as raw bytes, so a value that
//! is not valid UTF-8 reaches the codec in `catalog-core` and is reported as
//! corrupt rather than as a backend failure.
//!
//! Every operation takes a [`RequestContext`] and runs under
//! [`RequestContext::bound`], so cancellation and deadlines fail the call fast
//! instead of leaving it hanging on the backend. Backends do not retry.
//!
//! # Backends
//!
//! - [`RedisStore`] - production backend (`GET`/`SET`/`DEL`, no expiry)
//! - [`MemoryStore`] - in-process map for tests and local development

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use catalog_observe::{Interrupted, RequestContext};
use thiserror::Error;

/// Errors returned by a key-value backend.
///
/// A missing key is not an error: `get` returns `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Connection, protocol, or server-side failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// The request context was cancelled while the call was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// The request context deadline elapsed before the backend answered.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for StoreError {
    fn from(err: Interrupted) -> Self {
        match err {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

/// Minimal key-value capability used by the cart repository.
///
/// Individual calls are atomic with respect to each other. Nothing makes a
/// `get` followed by a `set` atomic.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value at `key`, or `None` if the key does not exist.
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrite the value at `key` unconditionally, with no expiry.
    async fn set(&self, ctx: &RequestContext, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Deleting a missing key succeeds.
    async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError>;

    /// Short backend name, used as the key of the readiness response.
    fn backend(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_maps_to_store_error() {
        assert_eq!(
            StoreError::from(Interrupted::Cancelled),
            StoreError::Cancelled
        );
        assert_eq!(
            StoreError::from(Interrupted::DeadlineExceeded),
            StoreError::DeadlineExceeded
        );
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::Backend("connection refused".into()).to_string(),
            "backend error: connection refused"
        );
    }
}
