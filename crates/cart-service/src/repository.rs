//! Cart repository over the key-value store.
//!
//! This is the only code path that reads or writes cart keys. Each call is a
//! fresh read-modify-write against the store; no cart state is cached in
//! process, and every returned [`Cart`] is a new value.
//!
//! # Consistency
//!
//! - A missing key reads as an empty cart. This is the only case where a
//!   default value replaces a store result.
//! - A present but undecodable value is an error. It is never replaced by an
//!   empty cart, so a corrupted entry is not silently overwritten by the next
//!   read-modify-write.
//! - Mutations are last-writer-wins. `update_cart` and `add_to_cart` read the
//!   cart, change it in memory, and write it back as two separate store calls.
//!   Two overlapping calls on the same ID can each read the same state, and the
//!   second `set` discards the first call's change (a lost update). For
//!   `add_to_cart` this drops an item. Closing the window needs a protocol
//!   change in the store (conditional write or a server-side append); until
//!   then the hazard is accepted and covered by tests.

use std::sync::Arc;

use catalog_core::{Cart, CartId, CodecError};
use catalog_observe::RequestContext;
use thiserror::Error;
use tracing::Instrument;

use crate::store::{KeyValueStore, StoreError};

/// Errors returned by the cart repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The key-value backend failed, was cancelled, or timed out.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A stored cart could not be decoded, or a cart could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Repository for cart read-modify-write operations.
///
/// Cheap to clone; clones share the injected store handle.
#[derive(Clone)]
pub struct CartRepository {
    store: Arc<dyn KeyValueStore>,
}

impl CartRepository {
    /// Create a repository over an injected store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Get a cart, or an empty cart if none has been written for `id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the backend fails and
    /// `RepositoryError::Codec` if the stored value is corrupt.
    pub async fn get_cart(&self, ctx: &RequestContext, id: &CartId) -> Result<Cart, RepositoryError> {
        let ctx = ctx.child("get_cart");
        self.load(&ctx, id).instrument(ctx.span().clone()).await
    }

    /// Replace the cart's items with `items`.
    ///
    /// Creates the cart if it does not exist. Last writer wins: a concurrent
    /// `update_cart` or `add_to_cart` on the same ID may be overwritten.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the backend fails and
    /// `RepositoryError::Codec` if the stored value is corrupt.
    pub async fn update_cart(
        &self,
        ctx: &RequestContext,
        id: &CartId,
        items: Vec<String>,
    ) -> Result<(), RepositoryError> {
        let ctx = ctx.child("update_cart");
        async {
            let mut cart = self.load(&ctx, id).await?;
            cart.replace_items(items);
            self.save(&ctx, &cart).await?;
            tracing::debug!(cart_id = %id, items = cart.items().len(), "update successful");
            Ok::<_, RepositoryError>(())
        }
        .instrument(ctx.span().clone())
        .await
    }

    /// Append `item` to the end of the cart.
    ///
    /// Creates the cart if it does not exist. Duplicates are kept. Two
    /// concurrent calls on the same ID can both read the pre-append cart, in
    /// which case only one of the two items survives.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the backend fails and
    /// `RepositoryError::Codec` if the stored value is corrupt.
    pub async fn add_to_cart(
        &self,
        ctx: &RequestContext,
        id: &CartId,
        item: String,
    ) -> Result<(), RepositoryError> {
        let ctx = ctx.child("add_to_cart");
        async {
            let mut cart = self.load(&ctx, id).await?;
            tracing::debug!(cart_id = %id, item_id = %item, "appending item");
            cart.push_item(item);
            self.save(&ctx, &cart).await?;
            tracing::debug!(cart_id = %id, items = cart.items().len(), "append successful");
            Ok::<_, RepositoryError>(())
        }
        .instrument(ctx.span().clone())
        .await
    }

    /// Delete the cart. Deleting a cart that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the backend fails.
    pub async fn delete_cart(&self, ctx: &RequestContext, id: &CartId) -> Result<(), RepositoryError> {
        let ctx = ctx.child("delete_cart");
        async {
            self.store
                .delete(&ctx, id.as_str())
                .await
                .inspect_err(|e| tracing::debug!(cart_id = %id, error = %e, "delete failed"))?;
            tracing::debug!(cart_id = %id, "delete successful");
            Ok::<_, RepositoryError>(())
        }
        .instrument(ctx.span().clone())
        .await
    }

    async fn load(&self, ctx: &RequestContext, id: &CartId) -> Result<Cart, RepositoryError> {
        let raw = self
            .store
            .get(ctx, id.as_str())
            .await
            .inspect_err(|e| tracing::debug!(cart_id = %id, error = %e, "get failed"))?;

        let Some(raw) = raw else {
            tracing::debug!(cart_id = %id, "cart not found, using an empty one");
            return Ok(Cart::empty(id.clone()));
        };

        let cart = Cart::decode_for(id, &raw)
            .inspect_err(|e| tracing::debug!(cart_id = %id, error = %e, "cannot decode cart"))?;
        tracing::debug!(cart_id = %id, items = cart.items().len(), "cart found");
        Ok(cart)
    }

    async fn save(&self, ctx: &RequestContext, cart: &Cart) -> Result<(), RepositoryError> {
        let raw = cart.encode().inspect_err(
            |e| tracing::debug!(cart_id = %cart.id(), error = %e, "cannot encode cart"),
        )?;
        self.store
            .set(ctx, cart.id().as_str(), &raw)
            .await
            .inspect_err(|e| tracing::debug!(cart_id = %cart.id(), error = %e, "cannot store cart"))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use super::*;
    use crate::store::MemoryStore;

    fn id(s: &str) -> CartId {
        CartId::parse(s).unwrap()
    }

    fn items(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn repo_with(store: &MemoryStore) -> CartRepository {
        CartRepository::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_get_absent_cart_is_empty() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        let cart = repo.get_cart(&ctx, &id("never-written")).await.unwrap();
        assert_eq!(cart.id().as_str(), "never-written");
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_get_absent_cart_does_not_write() {
        let store = MemoryStore::new();
        let repo = repo_with(&store);
        let ctx = RequestContext::detached("test");

        repo.get_cart(&ctx, &id("c1")).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_then_get_returns_items() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        repo.update_cart(&ctx, &id("c1"), items(&["sku-1", "sku-2"]))
            .await
            .unwrap();

        let cart = repo.get_cart(&ctx, &id("c1")).await.unwrap();
        assert_eq!(cart, Cart::with_items(id("c1"), items(&["sku-1", "sku-2"])));
    }

    #[tokio::test]
    async fn test_update_replaces_wholesale() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        repo.update_cart(&ctx, &id("c1"), items(&["a", "b", "c"]))
            .await
            .unwrap();
        repo.update_cart(&ctx, &id("c1"), items(&["z"])).await.unwrap();
        assert_eq!(repo.get_cart(&ctx, &id("c1")).await.unwrap().items(), ["z"]);

        repo.update_cart(&ctx, &id("c1"), Vec::new()).await.unwrap();
        assert!(repo.get_cart(&ctx, &id("c1")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_stores_canonical_json_at_cart_key() {
        let store = MemoryStore::new();
        let repo = repo_with(&store);
        let ctx = RequestContext::detached("test");

        repo.update_cart(&ctx, &id("c1"), items(&["sku-1"]))
            .await
            .unwrap();

        let raw = store.get(&ctx, "c1").await.unwrap().unwrap();
        assert_eq!(raw, br#"{"id":"c1","items":["sku-1"]}"#);
    }

    #[tokio::test]
    async fn test_add_to_absent_cart() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        repo.add_to_cart(&ctx, &id("c1"), "x".into()).await.unwrap();
        assert_eq!(repo.get_cart(&ctx, &id("c1")).await.unwrap().items(), ["x"]);
    }

    #[tokio::test]
    async fn test_add_appends_and_keeps_duplicates() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        repo.update_cart(&ctx, &id("c1"), items(&["a"])).await.unwrap();
        repo.add_to_cart(&ctx, &id("c1"), "b".into()).await.unwrap();
        repo.add_to_cart(&ctx, &id("c1"), "a".into()).await.unwrap();

        assert_eq!(
            repo.get_cart(&ctx, &id("c1")).await.unwrap().items(),
            ["a", "b", "a"]
        );
    }

    #[tokio::test]
    async fn test_delete_then_get_is_empty() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        repo.update_cart(&ctx, &id("c1"), items(&["a"])).await.unwrap();
        repo.delete_cart(&ctx, &id("c1")).await.unwrap();

        let cart = repo.get_cart(&ctx, &id("c1")).await.unwrap();
        assert_eq!(cart, Cart::empty(id("c1")));
    }

    #[tokio::test]
    async fn test_delete_never_written_succeeds() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        assert!(repo.delete_cart(&ctx, &id("ghost")).await.is_ok());
    }

    #[tokio::test]
    async fn test_carts_are_isolated_by_id() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");

        repo.add_to_cart(&ctx, &id("c1"), "a".into()).await.unwrap();
        repo.add_to_cart(&ctx, &id("c2"), "b".into()).await.unwrap();
        repo.delete_cart(&ctx, &id("c1")).await.unwrap();

        assert!(repo.get_cart(&ctx, &id("c1")).await.unwrap().is_empty());
        assert_eq!(repo.get_cart(&ctx, &id("c2")).await.unwrap().items(), ["b"]);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error_not_an_empty_cart() {
        let store = MemoryStore::new();
        let repo = repo_with(&store);
        let ctx = RequestContext::detached("test");
        store.set(&ctx, "c1", "{not json").await.unwrap();

        let err = repo.get_cart(&ctx, &id("c1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Codec(CodecError::Decode(_))));
    }

    #[tokio::test]
    async fn test_mutations_do_not_overwrite_corrupt_entry() {
        let store = MemoryStore::new();
        let repo = repo_with(&store);
        let ctx = RequestContext::detached("test");
        store.set(&ctx, "c1", "{not json").await.unwrap();

        assert!(repo.add_to_cart(&ctx, &id("c1"), "a".into()).await.is_err());
        assert!(repo.update_cart(&ctx, &id("c1"), items(&["a"])).await.is_err());
        assert_eq!(
            store.get(&ctx, "c1").await.unwrap().as_deref(),
            Some(&b"{not json"[..])
        );
    }

    #[tokio::test]
    async fn test_entry_for_another_key_is_an_error() {
        let store = MemoryStore::new();
        let repo = repo_with(&store);
        let ctx = RequestContext::detached("test");
        store
            .set(&ctx, "c1", r#"{"id":"c2","items":[]}"#)
            .await
            .unwrap();

        let err = repo.get_cart(&ctx, &id("c1")).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Codec(CodecError::IdMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_context_surfaces_store_error() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");
        ctx.cancel();

        let err = repo.get_cart(&ctx, &id("c1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Store(StoreError::Cancelled)));
    }

    /// A store holding one value that is not UTF-8.
    struct BinaryStore;

    #[async_trait]
    impl KeyValueStore for BinaryStore {
        async fn get(&self, _ctx: &RequestContext, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(Some(vec![0xff, 0xfe, 0x00]))
        }

        async fn set(&self, _ctx: &RequestContext, _key: &str, _value: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete(&self, _ctx: &RequestContext, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn ping(&self, _ctx: &RequestContext) -> Result<(), StoreError> {
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "binary"
        }
    }

    #[tokio::test]
    async fn test_non_utf8_entry_is_a_codec_error() {
        let repo = CartRepository::new(Arc::new(BinaryStore));
        let ctx = RequestContext::detached("test");

        let err = repo.get_cart(&ctx, &id("c1")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Codec(CodecError::Decode(_))));
    }

    #[tokio::test]
    async fn test_null_items_written_by_older_clients_read_as_empty() {
        let store = MemoryStore::new();
        let repo = repo_with(&store);
        let ctx = RequestContext::detached("test");
        store
            .set(&ctx, "c1", r#"{"id":"c1","items":null}"#)
            .await
            .unwrap();

        assert!(repo.get_cart(&ctx, &id("c1")).await.unwrap().is_empty());
        repo.add_to_cart(&ctx, &id("c1"), "sku-1".into()).await.unwrap();
        assert_eq!(repo.get_cart(&ctx, &id("c1")).await.unwrap().items(), ["sku-1"]);
    }

    /// A store whose reads never return.
    struct StalledStore;

    #[async_trait]
    impl KeyValueStore for StalledStore {
        async fn get(&self, ctx: &RequestContext, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            ctx.bound(std::future::pending()).await?
        }

        async fn set(&self, _ctx: &RequestContext, _key: &str, _value: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete(&self, _ctx: &RequestContext, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn ping(&self, _ctx: &RequestContext) -> Result<(), StoreError> {
            Ok(())
        }

        fn backend(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_deadline_bounds_a_stalled_backend() {
        let repo = CartRepository::new(Arc::new(StalledStore));
        let ctx = RequestContext::detached("test").with_timeout(Duration::from_millis(20));

        let err = repo
            .add_to_cart(&ctx, &id("c1"), "a".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Store(StoreError::DeadlineExceeded)
        ));
    }

    /// Holds every `get` until `parties` reads have completed, so concurrent
    /// read-modify-write calls all observe the same pre-write state.
    struct InterleavingStore {
        inner: MemoryStore,
        barrier: Barrier,
    }

    #[async_trait]
    impl KeyValueStore for InterleavingStore {
        async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            let value = self.inner.get(ctx, key).await?;
            self.barrier.wait().await;
            Ok(value)
        }

        async fn set(&self, ctx: &RequestContext, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(ctx, key, value).await
        }

        async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), StoreError> {
            self.inner.delete(ctx, key).await
        }

        async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError> {
            self.inner.ping(ctx).await
        }

        fn backend(&self) -> &'static str {
            "interleaving"
        }
    }

    #[tokio::test]
    async fn test_concurrent_adds_can_lose_an_item() {
        let inner = MemoryStore::new();
        let repo = CartRepository::new(Arc::new(InterleavingStore {
            inner: inner.clone(),
            barrier: Barrier::new(2),
        }));
        let ctx = RequestContext::detached("test");
        let cart_id = id("c1");

        let (a, b) = tokio::join!(
            repo.add_to_cart(&ctx, &cart_id, "a".into()),
            repo.add_to_cart(&ctx, &cart_id, "b".into()),
        );
        a.unwrap();
        b.unwrap();

        // Both calls succeeded, yet the cart holds only one item.
        let cart = CartRepository::new(Arc::new(inner))
            .get_cart(&ctx, &cart_id)
            .await
            .unwrap();
        assert_eq!(cart.items().len(), 1);
        assert!(cart.items() == ["a"] || cart.items() == ["b"]);
    }

    #[tokio::test]
    async fn test_concurrent_updates_last_writer_wins() {
        let inner = MemoryStore::new();
        let repo = CartRepository::new(Arc::new(InterleavingStore {
            inner: inner.clone(),
            barrier: Barrier::new(2),
        }));
        let ctx = RequestContext::detached("test");
        let cart_id = id("c1");

        let (a, b) = tokio::join!(
            repo.update_cart(&ctx, &cart_id, items(&["a1", "a2"])),
            repo.update_cart(&ctx, &cart_id, items(&["b1"])),
        );
        a.unwrap();
        b.unwrap();

        // One update is discarded entirely; the result is never a merge.
        let cart = CartRepository::new(Arc::new(inner))
            .get_cart(&ctx, &cart_id)
            .await
            .unwrap();
        assert!(cart.items() == ["a1", "a2"] || cart.items() == ["b1"]);
    }

    #[tokio::test]
    async fn test_sequential_adds_keep_every_item() {
        let repo = repo_with(&MemoryStore::new());
        let ctx = RequestContext::detached("test");
        let cart_id = id("c1");

        repo.add_to_cart(&ctx, &cart_id, "a".into()).await.unwrap();
        repo.add_to_cart(&ctx, &cart_id, "b".into()).await.unwrap();

        assert_eq!(
            repo.get_cart(&ctx, &cart_id).await.unwrap().items(),
            ["a", "b"]
        );
    }
}
