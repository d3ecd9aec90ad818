//! Core domain types for ghstats
//!
//! These types cover both sides of the pipeline: the samples deserialized
//! from the GitHub traffic API and the rows read back out of the datastore.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Series** | A daily time series (views, clones); one row per UTC day |
//! | **Snapshot** | A point-in-time ranking (popular paths, referrers) captured whole |
//! | **Sample** | One record as returned by the API, before storage |
//! | **Ingest date** | The moment a snapshot was stored; drives the sampling gate |
//!
//! GitHub reports at most the trailing 14 days of a series, so a series is
//! only complete if it is collected often enough. Snapshots have no history
//! at all on the API side; the datastore accumulates one copy per sampling
//! window.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================
// API samples
// ============================================

/// One day of a views or clones series, as returned by the traffic API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    /// UTC midnight bucket for the day
    pub timestamp: DateTime<Utc>,
    /// Total hits for the day
    pub count: i64,
    /// Distinct visitors for the day
    pub uniques: i64,
}

/// One entry of the popular-paths snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSample {
    /// Content path, e.g. `/acme/widget/issues`
    pub path: String,
    /// Page title as reported by the API
    pub title: String,
    /// Visits over the trailing window
    pub count: i64,
    /// Distinct visitors over the trailing window
    pub uniques: i64,
}

/// One entry of the popular-referrers snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerSample {
    /// Referring site, e.g. `news.ycombinator.com`
    pub referrer: String,
    /// Visits over the trailing window
    pub count: i64,
    /// Distinct visitors over the trailing window
    pub uniques: i64,
}

// ============================================
// Metrics
// ============================================

/// Daily time-series metrics. Deduplicated per sample timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesMetric {
    Views,
    Clones,
}

impl SeriesMetric {
    /// Table the series is stored in.
    pub fn table(&self) -> &'static str {
        match self {
            SeriesMetric::Views => "repo_views",
            SeriesMetric::Clones => "repo_clones",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesMetric::Views => "views",
            SeriesMetric::Clones => "clones",
        }
    }
}

impl std::fmt::Display for SeriesMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot metrics. Deduplicated per sampling window, not per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotMetric {
    Paths,
    Referrers,
}

impl SnapshotMetric {
    /// Table the snapshots are stored in.
    pub fn table(&self) -> &'static str {
        match self {
            SnapshotMetric::Paths => "repo_paths",
            SnapshotMetric::Referrers => "repo_refer",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotMetric::Paths => "paths",
            SnapshotMetric::Referrers => "referrers",
        }
    }
}

impl std::fmt::Display for SnapshotMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Stored rows
// ============================================

/// Row read back from `repo_views` or `repo_clones`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    pub repo: String,
    pub timestamp: DateTime<Utc>,
    pub count: i64,
    pub uniques: i64,
}

/// Row read back from `repo_paths`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRow {
    pub repo: String,
    pub ingest_date: DateTime<Utc>,
    pub path: String,
    pub title: String,
    pub count: i64,
    pub uniques: i64,
}

/// Row read back from `repo_refer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerRow {
    pub repo: String,
    pub ingest_date: DateTime<Utc>,
    pub referrer: String,
    pub count: i64,
    pub uniques: i64,
}

// ============================================
// Timestamps
// ============================================

/// Canonical storage format: RFC 3339 at second precision with a `Z` suffix,
/// e.g. `2024-01-01T00:00:00Z`.
///
/// Every timestamp column holds this one fixed-width rendering so that text
/// `ORDER BY` is also chronological order.
pub fn format_utc(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp back into UTC.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| Error::Timestamp {
            value: value.to_string(),
            source,
        })
}
