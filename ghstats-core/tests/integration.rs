//! Integration tests for the ingestion pipeline
//!
//! These tests run the full loader pass against a canned [`TrafficApi`]
//! implementation and verify what lands in the database.

use chrono::{DateTime, Duration, Utc};
use ghstats_core::db::Database;
use ghstats_core::ingest::{self, load_snapshot, IngestOptions};
use ghstats_core::types::{
    PathSample, ReferrerSample, SeriesMetric, SnapshotMetric, TrafficSample,
};
use ghstats_core::{Error, Result, TrafficApi};
use tempfile::TempDir;

/// Canned traffic data; every repository gets the same answers.
#[derive(Debug, Default, Clone)]
struct StubApi {
    views: Vec<TrafficSample>,
    clones: Vec<TrafficSample>,
    paths: Vec<PathSample>,
    referrers: Vec<ReferrerSample>,
}

impl TrafficApi for StubApi {
    fn views(&self, _repo: &str) -> Result<Vec<TrafficSample>> {
        Ok(self.views.clone())
    }

    fn clones(&self, _repo: &str) -> Result<Vec<TrafficSample>> {
        Ok(self.clones.clone())
    }

    fn popular_paths(&self, _repo: &str) -> Result<Vec<PathSample>> {
        Ok(self.paths.clone())
    }

    fn popular_referrers(&self, _repo: &str) -> Result<Vec<ReferrerSample>> {
        Ok(self.referrers.clone())
    }
}

/// Stub that serves views but fails on clones, for abort-path tests.
#[derive(Debug, Default)]
struct FailingClonesApi {
    inner: StubApi,
}

impl TrafficApi for FailingClonesApi {
    fn views(&self, repo: &str) -> Result<Vec<TrafficSample>> {
        self.inner.views(repo)
    }

    fn clones(&self, _repo: &str) -> Result<Vec<TrafficSample>> {
        Err(Error::Api {
            status: 500,
            body: "upstream broke".to_string(),
        })
    }

    fn popular_paths(&self, repo: &str) -> Result<Vec<PathSample>> {
        self.inner.popular_paths(repo)
    }

    fn popular_referrers(&self, repo: &str) -> Result<Vec<ReferrerSample>> {
        self.inner.popular_referrers(repo)
    }
}

fn ts(value: &str) -> DateTime<Utc> {
    value.parse().unwrap()
}

fn sample(timestamp: &str, count: i64, uniques: i64) -> TrafficSample {
    TrafficSample {
        timestamp: ts(timestamp),
        count,
        uniques,
    }
}

fn path(path: &str, title: &str, count: i64, uniques: i64) -> PathSample {
    PathSample {
        path: path.to_string(),
        title: title.to_string(),
        count,
        uniques,
    }
}

fn referrer(referrer: &str, count: i64, uniques: i64) -> ReferrerSample {
    ReferrerSample {
        referrer: referrer.to_string(),
        count,
        uniques,
    }
}

fn two_day_views() -> Vec<TrafficSample> {
    vec![
        sample("2024-01-01T00:00:00Z", 10, 5),
        sample("2024-01-02T00:00:00Z", 20, 8),
    ]
}

fn repos(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ============================================
// Series Dedup Tests
// ============================================

#[test]
fn test_fresh_database_ingests_all_samples() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(&temp_dir.path().join("traffic.db")).expect("database should open");

    let api = StubApi {
        views: two_day_views(),
        ..Default::default()
    };

    let report = ingest::run(
        &api,
        &db,
        &repos(&["acme/widget"]),
        &IngestOptions::default(),
    )
    .expect("ingest should succeed");

    assert_eq!(report.repos, 1);
    assert_eq!(report.view_days, 2);
    assert_eq!(report.clone_days, 0);

    let rows = db
        .series_rows(SeriesMetric::Views, "acme/widget")
        .expect("query should succeed");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].timestamp, ts("2024-01-01T00:00:00Z"));
    assert_eq!(rows[0].count, 10);
    assert_eq!(rows[0].uniques, 5);
    assert_eq!(rows[1].timestamp, ts("2024-01-02T00:00:00Z"));
    assert_eq!(rows[1].count, 20);
    assert_eq!(rows[1].uniques, 8);
}

#[test]
fn test_second_run_with_same_data_inserts_nothing() {
    let db = Database::open_in_memory().unwrap();
    let api = StubApi {
        views: two_day_views(),
        ..Default::default()
    };
    let repos = repos(&["acme/widget"]);
    let options = IngestOptions::default();

    let first = ingest::run(&api, &db, &repos, &options).expect("first run should succeed");
    assert_eq!(first.view_days, 2);

    let second = ingest::run(&api, &db, &repos, &options).expect("second run should succeed");
    assert_eq!(second.view_days, 0);
    assert_eq!(second.total_rows(), 0);

    let rows = db.series_rows(SeriesMetric::Views, "acme/widget").unwrap();
    assert_eq!(rows.len(), 2, "rerun must not duplicate rows");
}

#[test]
fn test_only_samples_newer_than_high_water_mark_are_inserted() {
    let db = Database::open_in_memory().unwrap();
    let repos = repos(&["acme/widget"]);
    let options = IngestOptions::default();

    let api = StubApi {
        views: two_day_views(),
        ..Default::default()
    };
    ingest::run(&api, &db, &repos, &options).unwrap();

    // The API window slides forward: one overlapping day, one new day
    let api = StubApi {
        views: vec![
            sample("2024-01-02T00:00:00Z", 20, 8),
            sample("2024-01-03T00:00:00Z", 7, 4),
        ],
        ..Default::default()
    };
    let report = ingest::run(&api, &db, &repos, &options).unwrap();
    assert_eq!(report.view_days, 1);

    let rows = db.series_rows(SeriesMetric::Views, "acme/widget").unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].timestamp, ts("2024-01-03T00:00:00Z"));
}

#[test]
fn test_stale_api_data_is_ignored() {
    let db = Database::open_in_memory().unwrap();
    let repos = repos(&["acme/widget"]);
    let options = IngestOptions::default();

    let api = StubApi {
        views: two_day_views(),
        ..Default::default()
    };
    ingest::run(&api, &db, &repos, &options).unwrap();

    // Everything the API now reports is at or before the stored maximum
    let api = StubApi {
        views: vec![
            sample("2023-12-30T00:00:00Z", 1, 1),
            sample("2024-01-02T00:00:00Z", 99, 99),
        ],
        ..Default::default()
    };
    let report = ingest::run(&api, &db, &repos, &options).unwrap();
    assert_eq!(report.view_days, 0);

    let rows = db.series_rows(SeriesMetric::Views, "acme/widget").unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_dedup_state_is_per_repository() {
    let db = Database::open_in_memory().unwrap();
    let options = IngestOptions::default();
    let api = StubApi {
        views: two_day_views(),
        ..Default::default()
    };

    // First repo already collected
    ingest::run(&api, &db, &repos(&["acme/widget"]), &options).unwrap();

    // Adding a second repo must not be blocked by the first one's state
    let report = ingest::run(
        &api,
        &db,
        &repos(&["acme/widget", "acme/gadget"]),
        &options,
    )
    .unwrap();
    assert_eq!(report.view_days, 2, "only the new repo inserts");

    assert_eq!(
        db.series_rows(SeriesMetric::Views, "acme/widget")
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        db.series_rows(SeriesMetric::Views, "acme/gadget")
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_views_and_clones_track_separately() {
    let db = Database::open_in_memory().unwrap();
    let repos = repos(&["acme/widget"]);
    let options = IngestOptions::default();

    let api = StubApi {
        views: two_day_views(),
        clones: vec![sample("2024-01-02T00:00:00Z", 4, 2)],
        ..Default::default()
    };
    let report = ingest::run(&api, &db, &repos, &options).unwrap();
    assert_eq!(report.view_days, 2);
    assert_eq!(report.clone_days, 1);

    // Clones lag behind views; the clone high-water mark must not be
    // affected by the view rows.
    let api = StubApi {
        views: two_day_views(),
        clones: vec![
            sample("2024-01-02T00:00:00Z", 4, 2),
            sample("2024-01-03T00:00:00Z", 6, 3),
        ],
        ..Default::default()
    };
    let report = ingest::run(&api, &db, &repos, &options).unwrap();
    assert_eq!(report.view_days, 0);
    assert_eq!(report.clone_days, 1);
}

// ============================================
// Snapshot Sampling Gate Tests
// ============================================

#[test]
fn test_first_snapshot_is_taken_immediately() {
    let db = Database::open_in_memory().unwrap();
    let api = StubApi {
        paths: vec![
            path("/acme/widget", "Home", 40, 20),
            path("/acme/widget/issues", "Issues", 12, 9),
        ],
        referrers: vec![referrer("news.ycombinator.com", 9, 7)],
        ..Default::default()
    };

    let report = ingest::run(
        &api,
        &db,
        &repos(&["acme/widget"]),
        &IngestOptions::default(),
    )
    .unwrap();

    assert_eq!(report.path_rows, 2);
    assert_eq!(report.referrer_rows, 1);
    assert_eq!(report.snapshots_gated, 0);
}

#[test]
fn test_snapshot_within_window_is_gated() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();

    // A snapshot from 4 days ago keeps a 5-day window closed
    db.insert_paths(
        "acme/widget",
        Utc::now() - Duration::days(4),
        &[path("/acme/widget", "Home", 40, 20)],
    )
    .unwrap();

    let api = StubApi {
        paths: vec![path("/acme/widget", "Home", 41, 21)],
        ..Default::default()
    };

    let outcome = load_snapshot(&api, &db, SnapshotMetric::Paths, "acme/widget", 5)
        .expect("gated loader should not error");
    assert_eq!(outcome, None);

    let rows = db.path_rows("acme/widget").unwrap();
    assert_eq!(rows.len(), 1, "no rows added while gated");
}

#[test]
fn test_snapshot_after_window_elapses_is_taken() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();

    db.insert_paths(
        "acme/widget",
        Utc::now() - Duration::days(5),
        &[path("/acme/widget", "Home", 40, 20)],
    )
    .unwrap();

    let api = StubApi {
        paths: vec![path("/acme/widget", "Home", 41, 21)],
        ..Default::default()
    };

    let outcome = load_snapshot(&api, &db, SnapshotMetric::Paths, "acme/widget", 5)
        .expect("loader should succeed");
    assert_eq!(outcome, Some(1));

    // Both copies of the path survive; they differ by ingest date
    let rows = db.path_rows("acme/widget").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].path, rows[1].path);
    assert!(rows[0].ingest_date < rows[1].ingest_date);
}

#[test]
fn test_referrer_gate_is_independent_of_paths() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();

    // Only paths were sampled recently
    db.insert_paths(
        "acme/widget",
        Utc::now() - Duration::days(1),
        &[path("/acme/widget", "Home", 40, 20)],
    )
    .unwrap();

    let api = StubApi {
        paths: vec![path("/acme/widget", "Home", 41, 21)],
        referrers: vec![referrer("news.ycombinator.com", 9, 7)],
        ..Default::default()
    };

    let report = ingest::run(
        &api,
        &db,
        &repos(&["acme/widget"]),
        &IngestOptions::default(),
    )
    .unwrap();

    assert_eq!(report.path_rows, 0);
    assert_eq!(report.snapshots_gated, 1);
    assert_eq!(report.referrer_rows, 1, "referrers have their own window");
}

#[test]
fn test_custom_sample_period_is_respected() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();

    db.insert_paths(
        "acme/widget",
        Utc::now() - Duration::days(4),
        &[path("/acme/widget", "Home", 40, 20)],
    )
    .unwrap();

    let api = StubApi {
        paths: vec![path("/acme/widget", "Home", 41, 21)],
        ..Default::default()
    };

    // 4 elapsed days gate a 5-day window but satisfy a 3-day one
    let gated = load_snapshot(&api, &db, SnapshotMetric::Paths, "acme/widget", 5).unwrap();
    assert_eq!(gated, None);

    let taken = load_snapshot(&api, &db, SnapshotMetric::Paths, "acme/widget", 3).unwrap();
    assert_eq!(taken, Some(1));
}

// ============================================
// Empty Response Tests
// ============================================

#[test]
fn test_empty_api_responses_insert_nothing() {
    let db = Database::open_in_memory().unwrap();
    let api = StubApi::default();

    let report = ingest::run(
        &api,
        &db,
        &repos(&["acme/widget"]),
        &IngestOptions::default(),
    )
    .expect("empty responses are not an error");

    assert_eq!(report.total_rows(), 0);
    assert_eq!(report.snapshots_gated, 0);
    assert!(db
        .series_rows(SeriesMetric::Views, "acme/widget")
        .unwrap()
        .is_empty());
    assert!(db.path_rows("acme/widget").unwrap().is_empty());
}

#[test]
fn test_empty_snapshot_leaves_window_open() {
    let db = Database::open_in_memory().unwrap();
    db.init_schema().unwrap();

    let empty = StubApi::default();
    let outcome = load_snapshot(&empty, &db, SnapshotMetric::Paths, "acme/widget", 5).unwrap();
    assert_eq!(outcome, Some(0));

    // No rows means no ingest date, so the next attempt still fetches
    let api = StubApi {
        paths: vec![path("/acme/widget", "Home", 40, 20)],
        ..Default::default()
    };
    let outcome = load_snapshot(&api, &db, SnapshotMetric::Paths, "acme/widget", 5).unwrap();
    assert_eq!(outcome, Some(1));
}

// ============================================
// Failure Propagation Tests
// ============================================

#[test]
fn test_loader_failure_aborts_run_and_keeps_prior_work() {
    let db = Database::open_in_memory().unwrap();
    let api = FailingClonesApi {
        inner: StubApi {
            views: two_day_views(),
            ..Default::default()
        },
    };

    let err = ingest::run(
        &api,
        &db,
        &repos(&["acme/widget"]),
        &IngestOptions::default(),
    )
    .expect_err("clones failure should abort the run");

    match err {
        Error::Loader { loader, repo, .. } => {
            assert_eq!(loader, "clones");
            assert_eq!(repo, "acme/widget");
        }
        other => panic!("expected loader error, got {other:?}"),
    }

    // The views loader ran first; its batch stays committed
    let rows = db.series_rows(SeriesMetric::Views, "acme/widget").unwrap();
    assert_eq!(rows.len(), 2);
    assert!(db.path_rows("acme/widget").unwrap().is_empty());
}

#[test]
fn test_rerun_after_failure_does_not_duplicate() {
    let db = Database::open_in_memory().unwrap();
    let repos = repos(&["acme/widget"]);
    let options = IngestOptions::default();

    let failing = FailingClonesApi {
        inner: StubApi {
            views: two_day_views(),
            ..Default::default()
        },
    };
    ingest::run(&failing, &db, &repos, &options).expect_err("first run fails at clones");

    // The retry sees the committed views and only fills in the rest
    let healthy = StubApi {
        views: two_day_views(),
        clones: vec![sample("2024-01-02T00:00:00Z", 4, 2)],
        ..Default::default()
    };
    let report = ingest::run(&healthy, &db, &repos, &options).expect("retry should succeed");

    assert_eq!(report.view_days, 0);
    assert_eq!(report.clone_days, 1);
    assert_eq!(
        db.series_rows(SeriesMetric::Views, "acme/widget")
            .unwrap()
            .len(),
        2
    );
}
