//! Core types for the catalog services.
//!
//! This module provides type-safe wrappers for the two catalog entities.

pub mod article;
pub mod cart;
pub mod id;

pub use article::{Article, ArticleError, NewArticle};
pub use cart::{Cart, CodecError};
pub use id::*;
