//! Client configuration
//!
//! All settings arrive from the command line (or environment), so this is a
//! plain struct with defaults rather than a config-file loader.

use crate::error::{Error, Result};

/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`GithubClient`](crate::github::GithubClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Access token. Traffic endpoints require push access to the repository.
    pub token: String,

    /// Base URL of the REST API. Override for GitHub Enterprise hosts
    /// (e.g. `https://github.example.com/api/v3`).
    pub api_url: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Configuration with the default endpoint and timeout.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(Error::Config("token must not be empty".to_string()));
        }
        if self.api_url.is_empty() {
            return Err(Error::Config("api_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
