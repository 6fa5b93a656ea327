//! Fixer Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Only run-level failures surface here. Per-key failures (lookup, inference,
//! rewrite) are reported as [`Outcome`](crate::Outcome)s and never abort a run.

use derive_more::{Display, Error};

/// A fixer error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fixer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listing candidate keys under a prefix failed.
    #[display("could not enumerate candidates under prefix {_0:?}")]
    Enumerate(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Enumerate(_) => true,
        }
    }
}
