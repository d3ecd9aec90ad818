//! Ingestion layer
//!
//! This module orchestrates one collection pass: every loader runs against
//! every configured repository, strictly in order, on the caller's thread.
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────┐
//! │ TrafficApi  │ ──► │  loaders   │ ──► │     Database     │
//! │ (GitHub)    │     │ (dedup)    │     │ (repo_views, ..) │
//! └─────────────┘     └────────────┘     └──────────────────┘
//! ```
//!
//! The first loader failure aborts the run. Batches committed before the
//! failure stay committed; the dedup rules make the next run pick up from
//! whatever state was reached.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ghstats_core::{ClientConfig, Database, GithubClient};
//! use ghstats_core::ingest::{self, IngestOptions};
//!
//! let db = Database::open(Path::new("traffic.db"))?;
//! let client = GithubClient::new(&ClientConfig::new(token))?;
//! let report = ingest::run(&client, &db, &repos, &IngestOptions::default())?;
//! println!("{} new view days", report.view_days);
//! ```

mod loaders;

pub use loaders::{load_series, load_snapshot};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::github::TrafficApi;
use crate::types::{SeriesMetric, SnapshotMetric};

/// Default minimum days between popular-content snapshots
pub const DEFAULT_SAMPLE_PERIOD: i64 = 5;

/// The loaders in their fixed execution order.
const LOADERS: &[Loader] = &[
    Loader::Series(SeriesMetric::Views),
    Loader::Series(SeriesMetric::Clones),
    Loader::Snapshot(SnapshotMetric::Paths),
    Loader::Snapshot(SnapshotMetric::Referrers),
];

/// One of the four ingestion routines.
#[derive(Debug, Clone, Copy)]
enum Loader {
    Series(SeriesMetric),
    Snapshot(SnapshotMetric),
}

impl Loader {
    fn name(&self) -> &'static str {
        match self {
            Loader::Series(metric) => metric.as_str(),
            Loader::Snapshot(metric) => metric.as_str(),
        }
    }
}

/// Knobs for one collection pass.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Minimum days between snapshot ingests for paths and referrers
    pub sample_period: i64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            sample_period: DEFAULT_SAMPLE_PERIOD,
        }
    }
}

/// Result of a full collection pass across all repositories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of repositories visited
    pub repos: usize,
    /// New daily view samples inserted
    pub view_days: usize,
    /// New daily clone samples inserted
    pub clone_days: usize,
    /// Popular-path records inserted
    pub path_rows: usize,
    /// Popular-referrer records inserted
    pub referrer_rows: usize,
    /// Snapshot fetches skipped because the sampling window was still open
    pub snapshots_gated: usize,
}

impl IngestReport {
    /// Total rows inserted across all tables
    pub fn total_rows(&self) -> usize {
        self.view_days + self.clone_days + self.path_rows + self.referrer_rows
    }

    fn add_series(&mut self, metric: SeriesMetric, rows: usize) {
        match metric {
            SeriesMetric::Views => self.view_days += rows,
            SeriesMetric::Clones => self.clone_days += rows,
        }
    }

    fn add_snapshot(&mut self, metric: SnapshotMetric, rows: usize) {
        match metric {
            SnapshotMetric::Paths => self.path_rows += rows,
            SnapshotMetric::Referrers => self.referrer_rows += rows,
        }
    }
}

/// Run every loader against every repository, sequentially.
///
/// Ensures the schema first, so a fresh database file works without any
/// separate setup step. Errors are wrapped with the loader name and the
/// repository that failed.
pub fn run(
    api: &dyn TrafficApi,
    db: &Database,
    repos: &[String],
    options: &IngestOptions,
) -> Result<IngestReport> {
    db.init_schema()?;

    let mut report = IngestReport {
        repos: repos.len(),
        ..Default::default()
    };

    for loader in LOADERS {
        for repo in repos {
            match loader {
                Loader::Series(metric) => {
                    let rows = load_series(api, db, *metric, repo)
                        .map_err(|e| loader_error(loader.name(), repo, e))?;
                    report.add_series(*metric, rows);
                }
                Loader::Snapshot(metric) => {
                    let outcome = load_snapshot(api, db, *metric, repo, options.sample_period)
                        .map_err(|e| loader_error(loader.name(), repo, e))?;
                    match outcome {
                        Some(rows) => report.add_snapshot(*metric, rows),
                        None => report.snapshots_gated += 1,
                    }
                }
            }
        }
    }

    Ok(report)
}

fn loader_error(loader: &'static str, repo: &str, source: Error) -> Error {
    Error::Loader {
        loader,
        repo: repo.to_string(),
        source: Box::new(source),
    }
}
