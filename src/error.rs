//! Error types for tube-dl
//!
//! This module provides the error handling for the library:
//! - [`Error`] for failures of the manager's public operations
//! - [`FetchError`] for the outcome of a single fetch, classified as
//!   operation-specific or unexpected
//!
//! Fetch failures never cross the manager's public API. They are converted into
//! a `Failed` status and a completion event for the task they belong to.

use thiserror::Error;

/// Result type alias for tube-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tube-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MAX_CONCURRENT_DOWNLOADS")
        key: Option<String>,
    },

    /// URL rejected before it reached the queue
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// Error reported by the fetcher outside of a queued download (e.g. a probe)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Logging could not be initialized
    #[error("logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Build a [`Error::Config`] for a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

/// Outcome of a failed fetch
///
/// `Download` and `Unexpected` both end a task as `Failed`; the distinction only
/// changes how the failure is logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The extraction tool reported a failure (network, extraction, unavailable media)
    #[error("Download error: {0}")]
    Download(String),

    /// Any other fault while running the fetch (spawn failure, I/O, panic)
    #[error("Unexpected error during download: {0}")]
    Unexpected(String),

    /// The fetch stopped because its cancellation token fired
    #[error("download cancelled")]
    Cancelled,

    /// The fetcher does not support the requested operation
    #[error("not supported: {0}")]
    Unsupported(String),
}

impl FetchError {
    /// Whether this is a failure the extraction tool itself reported
    pub fn is_operation_specific(&self) -> bool {
        matches!(self, FetchError::Download(_))
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Unexpected(e.to_string())
    }
}
