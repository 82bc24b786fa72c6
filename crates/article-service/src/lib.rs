//! Catalog article service.
//!
//! Lists, creates, and deletes catalog articles stored in `PostgreSQL`, served
//! over HTTP on port 8080.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
