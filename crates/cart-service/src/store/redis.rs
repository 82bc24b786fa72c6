//! Redis backend.

use async_trait::async_trait;
use catalog_observe::RequestContext;
use ::redis::AsyncCommands;
use ::redis::aio::{ConnectionLike, ConnectionManager};
use secrecy::{ExposeSecret, SecretString};

use super::{KeyValueStore, StoreError};

impl From<::redis::RedisError> for StoreError {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Redis-backed store using a reconnecting, cloneable connection manager.
///
/// Cart values are written with plain `SET` (no `EX`), so entries live until
/// deleted.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at `uri` (e.g. `redis://localhost:6379`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the URI is invalid or the initial
    /// connection fails.
    pub async fn connect(uri: &SecretString) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(uri.expose_secret())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, ctx: &RequestContext, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let value = ctx
            .bound(async { conn.get::<_, Option<Vec<u8>>>(key).await })
            .await??;
        Ok(value)
    }

    async fn set(&self, ctx: &RequestContext, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        ctx.bound(async { conn.set::<_, _, ()>(key, value).await })
            .await??;
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        ctx.bound(async { conn.del::<_, ()>(key).await }).await??;
        Ok(())
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let ping = ::redis::cmd("PING");
        ctx.bound(async { conn.req_packed_command(&ping).await })
            .await??;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
