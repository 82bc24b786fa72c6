//! Database operations for the article `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `article.article` - catalog articles (`id UUID`, `title`, `description`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/article-service/migrations/` and run via:
//! ```bash
//! cargo run -p catalog-cli -- migrate article
//! ```

pub mod articles;

use std::time::Duration;

use catalog_observe::Interrupted;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use articles::ArticleRepository;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Errors returned by article repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The request context was cancelled while the query was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// The request context deadline elapsed before the query finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for RepositoryError {
    fn from(err: Interrupted) -> Self {
        match err {
            Interrupted::Cancelled => Self::Cancelled,
            Interrupted::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}
