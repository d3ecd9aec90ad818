//! Database layer for ghstats
//!
//! This module provides the storage layer using SQLite with:
//! - Additive-only schema setup
//! - Typed queries for the dedup state the loaders need
//! - Transactional batch appends

pub mod repo;
pub mod schema;

pub use repo::Database;
