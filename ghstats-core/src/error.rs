//! Error types for ghstats-core

use thiserror::Error;

/// Main error type for the ghstats-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the traffic API
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Stored timestamp that no longer parses as RFC 3339
    #[error("invalid stored timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A loader failed for one repository; the run stops here
    #[error("{loader} loader failed for {repo}")]
    Loader {
        loader: &'static str,
        repo: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for ghstats-core
pub type Result<T> = std::result::Result<T, Error>;
