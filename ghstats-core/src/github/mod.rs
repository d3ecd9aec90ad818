//! GitHub traffic API access
//!
//! [`TrafficApi`] is the seam the loaders call through; [`GithubClient`] is
//! the production implementation against the REST API. Tests substitute
//! canned implementations.

pub mod client;

pub use client::GithubClient;

use crate::error::Result;
use crate::types::{PathSample, ReferrerSample, TrafficSample};

/// Read access to one repository's traffic analytics.
///
/// All methods are blocking; the ingest pass is strictly sequential.
/// Repository identifiers are `owner/name` strings passed through verbatim.
pub trait TrafficApi {
    /// Daily page-view series (the API returns at most the trailing 14 days)
    fn views(&self, repo: &str) -> Result<Vec<TrafficSample>>;

    /// Daily clone series (same trailing window as views)
    fn clones(&self, repo: &str) -> Result<Vec<TrafficSample>>;

    /// Current most-visited content paths, most popular first
    fn popular_paths(&self, repo: &str) -> Result<Vec<PathSample>>;

    /// Current top referring sites, most popular first
    fn popular_referrers(&self, repo: &str) -> Result<Vec<ReferrerSample>>;
}
