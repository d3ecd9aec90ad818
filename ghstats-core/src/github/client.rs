//! HTTP client for the GitHub repository traffic API
//!
//! This client speaks to the four traffic endpoints under
//! `/repos/{owner}/{name}/traffic/`. The endpoints require a token with push
//! access to the repository.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::types::{PathSample, ReferrerSample, TrafficSample};

use super::TrafficApi;

/// REST API version pinned via the `X-GitHub-Api-Version` header
const API_VERSION: &str = "2022-11-28";

/// Sent with every request; GitHub rejects clients without a user agent
const AGENT: &str = concat!("ghstats/", env!("CARGO_PKG_VERSION"));

/// Response envelope for GET /traffic/views
#[derive(Debug, Deserialize)]
struct ViewsResponse {
    /// Daily breakdown; absent when the repo has no traffic yet
    #[serde(default)]
    views: Vec<TrafficSample>,
}

/// Response envelope for GET /traffic/clones
#[derive(Debug, Deserialize)]
struct ClonesResponse {
    #[serde(default)]
    clones: Vec<TrafficSample>,
}

/// HTTP client for the traffic endpoints
///
/// reqwest is async; a private current-thread runtime drives each call so
/// callers stay synchronous.
pub struct GithubClient {
    http_client: reqwest::Client,
    base_url: String,
    runtime: tokio::runtime::Runtime,
}

impl GithubClient {
    /// Create a new client from configuration
    ///
    /// Returns an error if the configuration is invalid or the token cannot
    /// be carried in a header.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.api_url.trim_end_matches('/').to_string();

        // Build default headers
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));

        let auth_value = format!("Bearer {}", config.token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| Error::Config(format!("invalid token: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            runtime,
        })
    }

    /// Build `{base_url}/repos/{owner}/{name}/{tail}` with each repository
    /// segment percent-encoded.
    fn repo_url(&self, repo: &str, tail: &str) -> String {
        let repo_path = repo
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/repos/{}/{}", self.base_url, repo_path, tail)
    }

    /// GET a JSON document, turning non-success statuses into [`Error::Api`]
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!(url, "GET");
        self.runtime.block_on(async {
            let response = self.http_client.get(url).send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown".to_string());
                return Err(Error::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            Ok(response.json::<T>().await?)
        })
    }
}

impl TrafficApi for GithubClient {
    fn views(&self, repo: &str) -> Result<Vec<TrafficSample>> {
        let url = self.repo_url(repo, "traffic/views");
        Ok(self.get_json::<ViewsResponse>(&url)?.views)
    }

    fn clones(&self, repo: &str) -> Result<Vec<TrafficSample>> {
        let url = self.repo_url(repo, "traffic/clones");
        Ok(self.get_json::<ClonesResponse>(&url)?.clones)
    }

    fn popular_paths(&self, repo: &str) -> Result<Vec<PathSample>> {
        // This endpoint returns a bare array, no envelope
        let url = self.repo_url(repo, "traffic/popular/paths");
        self.get_json(&url)
    }

    fn popular_referrers(&self, repo: &str) -> Result<Vec<ReferrerSample>> {
        let url = self.repo_url(repo, "traffic/popular/referrers");
        self.get_json(&url)
    }
}
