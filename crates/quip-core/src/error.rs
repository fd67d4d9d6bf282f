//! Error types for quip-core

use thiserror::Error;

/// Result type alias using quip-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quip-core operations
///
/// Payloads are plain strings so a sync outcome can be cloned out to every
/// caller waiting on the same cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Empty quote text or category
    #[error("Validation error: {0}")]
    Validation(String),

    /// Local storage read/write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Network, HTTP status, timeout or response decoding failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed import payload or persisted data
    #[error("Parse error: {0}")]
    Parse(String),

    /// Quote not found
    #[error("Quote not found: {0}")]
    NotFound(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// No remote gateway attached
    #[error("Sync is not configured")]
    SyncNotConfigured,

    /// The in-flight sync cycle was dropped before it produced a result
    #[error("Sync cycle was cancelled before completing")]
    SyncCancelled,
}

impl From<libsql::Error> for Error {
    fn from(error: libsql::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
