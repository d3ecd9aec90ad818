//! Database repository layer
//!
//! Query and insert operations for the traffic tables. Stored timestamps are
//! the canonical text rendering from [`format_utc`], so the latest-row
//! queries can sort on the column directly; parsing back out happens in a
//! separate step so corrupt values surface as [`Error::Timestamp`] instead
//! of being papered over.

use crate::error::{Error, Result};
use crate::types::{
    format_utc, parse_utc, PathRow, PathSample, ReferrerRow, ReferrerSample, SeriesMetric,
    SeriesRow, SnapshotMetric, TrafficSample,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// Database handle (single connection; the ingest pass is sequential)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Ensure all traffic tables exist
    pub fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::init_schema(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Series operations (repo_views, repo_clones)
    // ============================================

    /// Latest stored sample timestamp for a repository, if any.
    ///
    /// This is the high-water mark the loaders filter against: only samples
    /// strictly newer than it get inserted.
    pub fn latest_series_timestamp(
        &self,
        metric: SeriesMetric,
        repo: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        self.latest_text(metric.table(), "timestamp", repo)?
            .map(|s| parse_utc(&s))
            .transpose()
    }

    /// Append a batch of daily samples for a repository in one transaction.
    ///
    /// Returns the number of rows inserted. Callers filter before inserting;
    /// this method appends exactly what it is given.
    pub fn insert_series(
        &self,
        metric: SeriesMetric,
        repo: &str,
        samples: &[TrafficSample],
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            // Columns are named so the table layout (which differs between
            // repo_views and repo_clones) cannot swap count and uniques.
            let sql = format!(
                "INSERT INTO {} (repo, timestamp, count, uniques) VALUES (?1, ?2, ?3, ?4)",
                metric.table()
            );
            let mut stmt = tx.prepare(&sql)?;
            for sample in samples {
                stmt.execute(params![
                    repo,
                    format_utc(sample.timestamp),
                    sample.count,
                    sample.uniques,
                ])?;
            }
        }

        tx.commit()?;
        Ok(samples.len())
    }

    /// All stored samples for a repository, oldest first
    pub fn series_rows(&self, metric: SeriesMetric, repo: &str) -> Result<Vec<SeriesRow>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT repo, timestamp, count, uniques FROM {} WHERE repo = ? ORDER BY timestamp ASC",
            metric.table()
        );
        let mut stmt = conn.prepare(&sql)?;

        let raw = stmt
            .query_map([repo], Self::row_to_series_raw)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(repo, timestamp, count, uniques)| {
                Ok(SeriesRow {
                    repo,
                    timestamp: parse_utc(&timestamp)?,
                    count,
                    uniques,
                })
            })
            .collect()
    }

    fn row_to_series_raw(row: &Row) -> rusqlite::Result<(String, String, i64, i64)> {
        Ok((
            row.get("repo")?,
            row.get("timestamp")?,
            row.get("count")?,
            row.get("uniques")?,
        ))
    }

    // ============================================
    // Snapshot operations (repo_paths, repo_refer)
    // ============================================

    /// When the last snapshot for a repository was taken, if ever.
    ///
    /// The sampling gate compares this against the current time; nothing is
    /// fetched while the sampling window is still open.
    pub fn latest_snapshot_date(
        &self,
        metric: SnapshotMetric,
        repo: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        self.latest_text(metric.table(), "ingest_date", repo)?
            .map(|s| parse_utc(&s))
            .transpose()
    }

    /// Append a popular-paths snapshot, every record stamped with `ingest_date`
    pub fn insert_paths(
        &self,
        repo: &str,
        ingest_date: DateTime<Utc>,
        samples: &[PathSample],
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO repo_paths (repo, ingest_date, path, title, count, uniques)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let date = format_utc(ingest_date);
            for sample in samples {
                stmt.execute(params![
                    repo,
                    date,
                    sample.path,
                    sample.title,
                    sample.count,
                    sample.uniques,
                ])?;
            }
        }

        tx.commit()?;
        Ok(samples.len())
    }

    /// Append a popular-referrers snapshot, every record stamped with `ingest_date`
    pub fn insert_referrers(
        &self,
        repo: &str,
        ingest_date: DateTime<Utc>,
        samples: &[ReferrerSample],
    ) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO repo_refer (repo, ingest_date, referrer, count, uniques)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let date = format_utc(ingest_date);
            for sample in samples {
                stmt.execute(params![
                    repo,
                    date,
                    sample.referrer,
                    sample.count,
                    sample.uniques,
                ])?;
            }
        }

        tx.commit()?;
        Ok(samples.len())
    }

    /// All stored path records for a repository, oldest snapshot first
    pub fn path_rows(&self, repo: &str) -> Result<Vec<PathRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT repo, ingest_date, path, title, count, uniques
             FROM repo_paths WHERE repo = ? ORDER BY ingest_date ASC",
        )?;

        let raw = stmt
            .query_map([repo], Self::row_to_path_raw)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(repo, ingest_date, path, title, count, uniques)| {
                Ok(PathRow {
                    repo,
                    ingest_date: parse_utc(&ingest_date)?,
                    path,
                    title,
                    count,
                    uniques,
                })
            })
            .collect()
    }

    #[allow(clippy::type_complexity)]
    fn row_to_path_raw(row: &Row) -> rusqlite::Result<(String, String, String, String, i64, i64)> {
        Ok((
            row.get("repo")?,
            row.get("ingest_date")?,
            row.get("path")?,
            row.get("title")?,
            row.get("count")?,
            row.get("uniques")?,
        ))
    }

    /// All stored referrer records for a repository, oldest snapshot first
    pub fn referrer_rows(&self, repo: &str) -> Result<Vec<ReferrerRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT repo, ingest_date, referrer, count, uniques
             FROM repo_refer WHERE repo = ? ORDER BY ingest_date ASC",
        )?;

        let raw = stmt
            .query_map([repo], Self::row_to_referrer_raw)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(repo, ingest_date, referrer, count, uniques)| {
                Ok(ReferrerRow {
                    repo,
                    ingest_date: parse_utc(&ingest_date)?,
                    referrer,
                    count,
                    uniques,
                })
            })
            .collect()
    }

    fn row_to_referrer_raw(row: &Row) -> rusqlite::Result<(String, String, String, i64, i64)> {
        Ok((
            row.get("repo")?,
            row.get("ingest_date")?,
            row.get("referrer")?,
            row.get("count")?,
            row.get("uniques")?,
        ))
    }

    // ============================================
    // Shared helpers
    // ============================================

    /// Largest text value in `column` for a repository.
    ///
    /// Works because every stored timestamp uses the same fixed-width
    /// rendering, making text order identical to time order.
    fn latest_text(&self, table: &str, column: &str, repo: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {column} FROM {table} WHERE repo = ? ORDER BY {column} DESC LIMIT 1"
        );
        conn.query_row(&sql, [repo], |row| row.get(0))
            .optional()
            .map_err(Error::from)
    }
}
