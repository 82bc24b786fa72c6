//! Catalog cart service.
//!
//! Stores one shopping cart per caller-supplied ID in a key-value cache and
//! exposes it over HTTP on port 8081.
//!
//! The binary in `main.rs` wires [`store::RedisStore`] into [`routes::router`];
//! everything else lives here so integration tests can drive the router with
//! an in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod repository;
pub mod routes;
pub mod state;
pub mod store;
