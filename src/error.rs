//! Application Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An application error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for top-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of a run failed.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings could not be loaded or are invalid.
    #[display("invalid settings")]
    Config,
    /// The object store client could not be created.
    #[display("could not connect to bucket")]
    Storage,
    /// The audit itself failed before any key was processed.
    #[display("content type audit failed")]
    Run,
}
