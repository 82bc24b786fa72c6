//! Article route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use catalog_core::{Article, ArticleId, NewArticle};
use catalog_observe::RequestContext;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::ArticleRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body of `POST /article/`.
///
/// Missing fields deserialize as empty strings so they fail validation with
/// a field-specific message instead of a generic JSON error.
#[derive(Debug, Deserialize)]
pub struct AddArticleRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<Article>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub article: Article,
}

/// List every article.
#[instrument(skip_all, fields(request_id = %ctx.request_id()))]
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> Result<Json<ArticlesResponse>> {
    let articles = ArticleRepository::new(state.pool()).list(&ctx).await?;
    tracing::info!(count = articles.len(), "articles listed");
    Ok(Json(ArticlesResponse { articles }))
}

/// Validate and insert a new article.
#[instrument(skip_all, fields(request_id = %ctx.request_id()))]
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<AddArticleRequest>, JsonRejection>,
) -> Result<Json<ArticleResponse>> {
    let Json(request) = body.map_err(|e| {
        AppError::BadRequest(format!("invalid request body: {}", e.body_text()))
    })?;
    let new_article = NewArticle::new(&request.name, &request.description)?;

    let article = ArticleRepository::new(state.pool())
        .create(&ctx, new_article)
        .await?;
    tracing::info!(article_id = %article.id, "article created");
    Ok(Json(ArticleResponse { article }))
}

/// Delete an article. Unknown IDs still return 202.
#[instrument(skip_all, fields(article_id = %article_id, request_id = %ctx.request_id()))]
pub async fn remove(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(article_id): Path<String>,
) -> Result<StatusCode> {
    let id = ArticleId::parse(&article_id)?;
    let deleted = ArticleRepository::new(state.pool()).delete(&ctx, id).await?;
    tracing::info!(deleted, "article delete processed");
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_missing_fields_default_to_empty() {
        let request: AddArticleRequest = serde_json::from_str(r#"{"name":"Lamp"}"#).unwrap();
        assert_eq!(request.name, "Lamp");
        assert!(request.description.is_empty());
        assert!(NewArticle::new(&request.name, &request.description).is_err());
    }
}
