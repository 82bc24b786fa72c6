//! Application state shared across handlers.

use std::sync::Arc;

use crate::repository::CartRepository;
use crate::store::KeyValueStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The store is injected so tests and local
/// runs can swap Redis for [`crate::store::MemoryStore`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn KeyValueStore>,
    carts: CartRepository,
}

impl AppState {
    /// Create a new application state over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let carts = CartRepository::new(Arc::clone(&store));
        Self {
            inner: Arc::new(AppStateInner { store, carts }),
        }
    }

    /// Get the raw key-value store (used by readiness checks).
    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.inner.store.as_ref()
    }

    /// Get the cart repository.
    #[must_use]
    pub fn carts(&self) -> &CartRepository {
        &self.inner.carts
    }
}
