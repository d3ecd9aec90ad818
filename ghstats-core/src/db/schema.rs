//! Database schema
//!
//! One table per metric, created with `CREATE TABLE IF NOT EXISTS` on every
//! startup and never altered afterwards. There are no keys or indexes: the
//! datastore is an append-only record of what the traffic API returned, and
//! dedup happens in the loaders, not in the engine.

use rusqlite::Connection;

/// Table registry: name plus the DDL that creates it.
///
/// Column order matches datastores produced by earlier collectors, including
/// `repo_views` listing `uniques` before `count` while `repo_clones` lists
/// `count` first. Inserts always name their columns, so the order here is
/// layout only.
pub const TABLES: &[(&str, &str)] = &[
    (
        "repo_views",
        r#"
        CREATE TABLE IF NOT EXISTS repo_views (
            repo      VARCHAR,
            timestamp DATETIME,
            uniques   INTEGER,
            count     INTEGER
        )
        "#,
    ),
    (
        "repo_clones",
        r#"
        CREATE TABLE IF NOT EXISTS repo_clones (
            repo      VARCHAR,
            timestamp DATETIME,
            count     INTEGER,
            uniques   INTEGER
        )
        "#,
    ),
    (
        "repo_paths",
        r#"
        CREATE TABLE IF NOT EXISTS repo_paths (
            repo        VARCHAR,
            ingest_date DATETIME,
            path        VARCHAR,
            title       VARCHAR,
            count       INTEGER,
            uniques     INTEGER
        )
        "#,
    ),
    (
        "repo_refer",
        r#"
        CREATE TABLE IF NOT EXISTS repo_refer (
            repo        VARCHAR,
            ingest_date DATETIME,
            referrer    VARCHAR,
            count       INTEGER,
            uniques     INTEGER
        )
        "#,
    ),
];

/// Create any table that does not exist yet
pub fn init_schema(conn: &Connection) -> crate::error::Result<()> {
    for (name, ddl) in TABLES {
        tracing::debug!(table = name, "Ensuring table exists");
        conn.execute_batch(ddl)?;
    }
    Ok(())
}
