//! Commit error types.

use thiserror::Error;

/// Commit-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommitError {
    /// A commit type name outside the known set.
    #[error("unknown commit type: {0}")]
    UnknownType(String),
}

/// Result type for commit operations.
pub type CommitResult<T> = Result<T, CommitError>;
