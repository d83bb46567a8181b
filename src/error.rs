//! Error types for scrape-pool
//!
//! Two layers of errors exist:
//! - [`Error`] — surfaced to the caller of the pool API (construction,
//!   batch admission, sink delivery)
//! - [`FetchError`] — the failure of a single fetch attempt; contained
//!   inside a task's retry loop and never propagated to sibling tasks
//!   or to the caller's control flow
//!
//! A drain timeout is deliberately *not* an error: it is reported as the
//! [`TerminalState::ForceStopped`](crate::types::TerminalState) terminal
//! state instead.

use thiserror::Error;

/// Result type alias for scrape-pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scrape-pool
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "parallelism")
        key: Option<String>,
    },

    /// Fetch failure surfaced outside a task's retry loop
    /// (e.g., building the HTTP client)
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pool already ran its batch - not accepting new work
    #[error("shutdown in progress: not accepting new work")]
    ShuttingDown,
}

/// Failure of a single fetch attempt
///
/// The retry loop treats every variant identically (flat retry policy),
/// so the classification exists for diagnostics, not for retry decisions.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("unexpected status {status} for {url}")]
    Status {
        /// The HTTP status code returned by the server
        status: u16,
        /// The URL that produced the status
        url: String,
    },

    /// The identifier or response body could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Any other failure a custom fetcher wants to surface
    #[error("{0}")]
    Other(String),
}
