//! Article entity.

use serde::{Deserialize, Serialize};

use super::id::ArticleId;

/// Validation errors for a new article.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArticleError {
    /// A required field is missing or blank.
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A catalog article as stored and returned by the article service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub description: String,
}

/// A validated article that has not been assigned an ID yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    title: String,
    description: String,
}

impl NewArticle {
    /// Validate the fields of a new article.
    ///
    /// # Errors
    ///
    /// Returns `ArticleError::MissingField` if the title or description is
    /// empty or only whitespace. The title is checked first.
    pub fn new(title: &str, description: &str) -> Result<Self, ArticleError> {
        if title.trim().is_empty() {
            return Err(ArticleError::MissingField("articleName"));
        }
        if description.trim().is_empty() {
            return Err(ArticleError::MissingField("articleDescription"));
        }
        Ok(Self {
            title: title.to_owned(),
            description: description.to_owned(),
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
