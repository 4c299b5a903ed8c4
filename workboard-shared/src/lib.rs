//! # Workboard Shared Library
//!
//! Domain types, persistence and business logic for the Workboard API.
//!
//! ## Module Organization
//!
//! - `models`: database models and their SQL
//! - `store`: the `WorkStore` persistence boundary (PostgreSQL and in-memory)
//! - `auth`: password hashing, tokens, request auth context, project authorization
//! - `services`: project lifecycle, task and session services
//! - `db`: connection pool lifecycle and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Workboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
