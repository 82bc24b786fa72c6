//! Catalog Core - Shared types library.
//!
//! This crate provides the types used by both catalog services:
//! - `cart-service` - Per-user shopping carts in a key-value cache
//! - `article-service` - Article records in `PostgreSQL`
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. The cart codec lives here because it is a pure
//! transformation between a [`Cart`] and its cache representation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, the cart entity and codec, and the article entity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
