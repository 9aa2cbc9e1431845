//! Git error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors of the local repository.
#[derive(Debug, Error)]
pub enum GitError {
    /// The path holds no repository.
    #[error("not a git repository: {0}")]
    NotARepo(PathBuf),

    /// Files cannot be committed without a working tree.
    #[error("repository has no working directory")]
    Bare,

    /// `HEAD` points to an unborn branch.
    #[error("repository has no commits yet")]
    NoCommits,

    /// A tag with this name already exists.
    #[error("tag {0} already exists")]
    TagExists(String),

    /// libgit2 failure.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;
