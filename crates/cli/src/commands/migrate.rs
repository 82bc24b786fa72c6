//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `ARTICLE_DATABASE_URL` - `PostgreSQL` connection string for the article
//!   service (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Article migrations: `crates/article-service/migrations/`

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

fn article_database_url() -> Result<SecretString, MigrationError> {
    std::env::var("ARTICLE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("ARTICLE_DATABASE_URL"))
}

/// Run article database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the connection fails, or a
/// migration fails to apply.
pub async fn article() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = article_database_url()?;

    tracing::info!("Connecting to article database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running article migrations...");
    sqlx::migrate!("../article-service/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Article migrations complete!");
    Ok(())
}
