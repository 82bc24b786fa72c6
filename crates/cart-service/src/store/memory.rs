//! In-process key-value backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_observe::RequestContext;
use tokio::sync::RwLock;

use super::{KeyValueStore, StoreError};

/// A `HashMap` behind an async `RwLock`.
///
/// Each operation takes the lock on its own, matching the guarantees of a
/// single-node cache: individual calls are serialized, read-modify-write
/// sequences are not. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no key is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let value = ctx
            .bound(async { self.entries.read().await.get(key).cloned() })
            .await?;
        Ok(value)
    }

    async fn set(&self, ctx: &RequestContext, key: &str, value: &str) -> Result<(), StoreError> {
        ctx.bound(async {
            self.entries
                .write()
                .await
                .insert(key.to_owned(), value.as_bytes().to_vec());
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), StoreError> {
        ctx.bound(async {
            self.entries.write().await.remove(key);
        })
        .await?;
        Ok(())
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError> {
        ctx.bound(async {}).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = MemoryStore::new();
        let ctx = RequestContext::detached("test");
        assert_eq!(store.get(&ctx, "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        let ctx = RequestContext::detached("test");
        store.set(&ctx, "k", "v1").await.unwrap();
        store.set(&ctx, "k", "v2").await.unwrap();
        assert_eq!(store.get(&ctx, "k").await.unwrap().as_deref(), Some(&b"v2"[..]));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let ctx = RequestContext::detached("test");
        store.set(&ctx, "k", "v").await.unwrap();
        store.delete(&ctx, "k").await.unwrap();
        store.delete(&ctx, "k").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        let ctx = RequestContext::detached("test");
        store.set(&ctx, "k", "v").await.unwrap();
        assert_eq!(other.get(&ctx, "k").await.unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let store = MemoryStore::new();
        let ctx = RequestContext::detached("test");
        ctx.cancel();
        assert_eq!(
            store.set(&ctx, "k", "v").await,
            Err(StoreError::Cancelled)
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_ping() {
        let store = MemoryStore::new();
        let ctx = RequestContext::detached("test");
        assert!(store.ping(&ctx).await.is_ok());
        assert_eq!(store.backend(), "memory");
    }
}
