//! Article repository for database operations.
//!
//! Queries are built at runtime with `sqlx::query_as`, so the crate compiles
//! without a live database or an offline query cache.

use catalog_core::{Article, ArticleId, NewArticle};
use catalog_observe::RequestContext;
use sqlx::PgPool;

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: ArticleId,
    title: String,
    description: String,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
        }
    }
}

/// Repository for article database operations.
pub struct ArticleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArticleRepository<'a> {
    /// Create a new article repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every article, unfiltered and unpaginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or an
    /// interruption error if `ctx` is cancelled or times out.
    pub async fn list(&self, ctx: &RequestContext) -> Result<Vec<Article>, RepositoryError> {
        let rows = ctx
            .bound(
                sqlx::query_as::<_, ArticleRow>(
                    "SELECT id, title, description FROM article.article ORDER BY title, id",
                )
                .fetch_all(self.pool),
            )
            .await?
            .inspect_err(|e| tracing::debug!(error = %e, "list articles failed"))?;

        tracing::debug!(count = rows.len(), "found articles");
        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Insert a new article under a freshly generated ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, or an
    /// interruption error if `ctx` is cancelled or times out.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        article: NewArticle,
    ) -> Result<Article, RepositoryError> {
        let id = ArticleId::generate();
        let row = ctx
            .bound(
                sqlx::query_as::<_, ArticleRow>(
                    r"
                    INSERT INTO article.article (id, title, description)
                    VALUES ($1, $2, $3)
                    RETURNING id, title, description
                    ",
                )
                .bind(id)
                .bind(article.title())
                .bind(article.description())
                .fetch_one(self.pool),
            )
            .await?
            .inspect_err(|e| tracing::debug!(error = %e, "insert article failed"))?;

        tracing::debug!(article_id = %row.id, "article inserted");
        Ok(row.into())
    }

    /// Delete an article by ID.
    ///
    /// Returns whether a row was removed. Deleting an unknown ID is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails, or an
    /// interruption error if `ctx` is cancelled or times out.
    pub async fn delete(&self, ctx: &RequestContext, id: ArticleId) -> Result<bool, RepositoryError> {
        let result = ctx
            .bound(
                sqlx::query("DELETE FROM article.article WHERE id = $1")
                    .bind(id)
                    .execute(self.pool),
            )
            .await?
            .inspect_err(|e| tracing::debug!(article_id = %id, error = %e, "delete article failed"))?;

        let deleted = result.rows_affected() > 0;
        tracing::debug!(article_id = %id, deleted, "delete finished");
        Ok(deleted)
    }

    /// Check that the database answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails or is interrupted.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<(), RepositoryError> {
        ctx.bound(sqlx::query("SELECT 1").execute(self.pool))
            .await??;
        Ok(())
    }
}
