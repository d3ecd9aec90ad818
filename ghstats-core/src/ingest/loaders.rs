//! The two loader routines
//!
//! Views and clones share [`load_series`]: fetch the daily series, drop
//! everything at or before the stored high-water mark, append the rest.
//! Paths and referrers share [`load_snapshot`]: store the whole current
//! ranking, but only once per sampling window.

use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::github::TrafficApi;
use crate::types::{SeriesMetric, SnapshotMetric};

/// Fetch one daily series and append the samples newer than anything stored.
///
/// Returns the number of rows inserted. Samples whose timestamp equals the
/// stored maximum are duplicates of a day already recorded and are dropped
/// along with everything older.
pub fn load_series(
    api: &dyn TrafficApi,
    db: &Database,
    metric: SeriesMetric,
    repo: &str,
) -> Result<usize> {
    let samples = match metric {
        SeriesMetric::Views => api.views(repo)?,
        SeriesMetric::Clones => api.clones(repo)?,
    };

    let latest = db.latest_series_timestamp(metric, repo)?;
    let fresh: Vec<_> = samples
        .into_iter()
        .filter(|sample| latest.map_or(true, |last| sample.timestamp > last))
        .collect();

    if fresh.is_empty() {
        tracing::debug!(repo, metric = %metric, "No new samples");
        return Ok(0);
    }

    let inserted = db.insert_series(metric, repo, &fresh)?;
    tracing::info!(repo, metric = %metric, days = inserted, "Inserted daily samples");
    Ok(inserted)
}

/// Store one popular-content snapshot unless a snapshot was taken within the
/// sampling window.
///
/// Returns `None` when the window has not elapsed (nothing is fetched in
/// that case), otherwise the number of rows inserted. An empty snapshot
/// inserts nothing and, because no rows carry an ingest date, leaves the
/// window open.
pub fn load_snapshot(
    api: &dyn TrafficApi,
    db: &Database,
    metric: SnapshotMetric,
    repo: &str,
    sample_period: i64,
) -> Result<Option<usize>> {
    let now = Utc::now();
    let last = db.latest_snapshot_date(metric, repo)?;

    if let Some(days) = days_until_resample(last, now, sample_period) {
        tracing::info!(
            repo,
            metric = %metric,
            days_left = days,
            "Snapshot taken recently, waiting for next sampling period"
        );
        return Ok(None);
    }

    let inserted = match metric {
        SnapshotMetric::Paths => {
            let samples = api.popular_paths(repo)?;
            db.insert_paths(repo, now, &samples)?
        }
        SnapshotMetric::Referrers => {
            let samples = api.popular_referrers(repo)?;
            db.insert_referrers(repo, now, &samples)?
        }
    };

    if inserted > 0 {
        tracing::info!(repo, metric = %metric, rows = inserted, "Inserted snapshot");
    } else {
        tracing::debug!(repo, metric = %metric, "Snapshot is empty");
    }
    Ok(Some(inserted))
}

/// Days remaining in the sampling window, or `None` once it has elapsed.
///
/// Elapsed time is truncated to whole days, so a window of 5 days reopens at
/// the first moment 5 full days have passed since the last snapshot.
fn days_until_resample(
    last: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    sample_period: i64,
) -> Option<i64> {
    let last = last?;
    let elapsed = (now - last).num_days();
    if elapsed < sample_period {
        Some(sample_period - elapsed)
    } else {
        None
    }
}
