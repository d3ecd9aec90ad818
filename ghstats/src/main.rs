//! ghstats - collect GitHub repository traffic statistics into SQLite
//!
//! The traffic API only keeps the trailing 14 days of views and clones, and
//! no history at all for popular paths and referrers. This tool fetches all
//! four metrics for each configured repository and appends whatever the
//! local database has not seen yet, so a cron entry every few days
//! accumulates the full history.
//!
//! Designed to run unattended: logs go to stderr, the summary goes to
//! stdout, and any loader failure exits non-zero with the error chain.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ghstats_core::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use ghstats_core::ingest::{self, IngestOptions, DEFAULT_SAMPLE_PERIOD};
use ghstats_core::{ClientConfig, Database, GithubClient};

#[derive(Parser)]
#[command(name = "ghstats")]
#[command(about = "Collect GitHub repository traffic statistics into SQLite")]
#[command(version)]
struct Args {
    /// GitHub access token (needs push access to the repositories)
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Repository to collect in owner/name form (repeat for several)
    #[arg(short, long = "repo", required = true, value_name = "OWNER/NAME")]
    repo: Vec<String>,

    /// SQLite database file (created on first run)
    #[arg(short = 'f', long = "db", value_name = "PATH")]
    db: PathBuf,

    /// Minimum days between popular paths/referrers snapshots
    #[arg(long, default_value_t = DEFAULT_SAMPLE_PERIOD, value_name = "DAYS")]
    sample_period: i64,

    /// Base URL of the GitHub REST API (override for Enterprise hosts)
    #[arg(long, default_value = DEFAULT_API_URL, value_name = "URL")]
    api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECS")]
    timeout: u64,

    /// Verbose output (debug-level logs)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    ghstats_core::logging::init(if args.verbose { "debug" } else { "info" });

    tracing::info!(
        db = %args.db.display(),
        repos = args.repo.len(),
        "ghstats starting"
    );

    let db = Database::open(&args.db).context("failed to open database")?;

    let config = ClientConfig {
        token: args.token,
        api_url: args.api_url,
        timeout_secs: args.timeout,
    };
    let client = GithubClient::new(&config).context("failed to create GitHub client")?;

    let options = IngestOptions {
        sample_period: args.sample_period,
    };

    let report = ingest::run(&client, &db, &args.repo, &options)
        .map_err(|e| {
            tracing::error!(error = %e, "Ingest aborted");
            e
        })
        .context("ingest failed")?;

    println!("Ingest complete:");
    println!("  Repositories:    {}", report.repos);
    println!("  View days:       {}", report.view_days);
    println!("  Clone days:      {}", report.clone_days);
    println!("  Path rows:       {}", report.path_rows);
    println!("  Referrer rows:   {}", report.referrer_rows);
    if report.snapshots_gated > 0 {
        println!("  Snapshots gated: {}", report.snapshots_gated);
    }

    tracing::info!(rows = report.total_rows(), "ghstats complete");

    Ok(())
}
