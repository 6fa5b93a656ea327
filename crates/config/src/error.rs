//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Every variant is an operator mistake: fix the flags or environment and
/// run again.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A layer could not be merged or deserialized (bad type in an env var).
    #[display("invalid configuration: {_0}")]
    Extract(#[error(not(source))] String),
    /// A required setting was not provided by any layer.
    #[display("missing required setting: {_0}")]
    MissingField(#[error(not(source))] &'static str),
    /// Worker pool must have at least one worker.
    #[display("worker count must be at least 1 (got {_0})")]
    InvalidWorkers(#[error(not(source))] usize),
    /// Queue wait ceiling must be non-zero.
    #[display("queue timeout must be at least 1 second")]
    InvalidTimeout,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
