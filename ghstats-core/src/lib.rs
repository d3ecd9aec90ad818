//! # ghstats-core
//!
//! Core library for ghstats - a collector for GitHub repository traffic
//! statistics.
//!
//! This library provides:
//! - Domain types for traffic samples and stored rows
//! - A SQLite storage layer holding one append-only table per metric
//! - A blocking client for the GitHub traffic API
//! - The loaders and the sequential ingestion driver
//!
//! ## Why a collector at all
//!
//! GitHub keeps only the trailing 14 days of views and clones, and popular
//! paths/referrers have no history whatsoever. Running a pass often enough
//! (cron every few days) accumulates the full history locally; the dedup
//! rules make overlapping passes harmless.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use ghstats_core::ingest::{self, IngestOptions};
//! use ghstats_core::{ClientConfig, Database, GithubClient};
//!
//! # fn main() -> ghstats_core::Result<()> {
//! let db = Database::open(Path::new("traffic.db"))?;
//! let client = GithubClient::new(&ClientConfig::new("ghp_token"))?;
//!
//! let repos = vec!["acme/widget".to_string()];
//! let report = ingest::run(&client, &db, &repos, &IngestOptions::default())?;
//! println!("{} new view days", report.view_days);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::ClientConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use github::{GithubClient, TrafficApi};
pub use ingest::{IngestOptions, IngestReport};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod github;
pub mod ingest;
pub mod logging;
pub mod types;
