//! Commit model for semrel.
//!
//! This crate provides the commit types the version engine works on:
//! - [`RawCommit`]: a commit as retrieved from Git
//! - [`Commit`]: a commit after Conventional Commits parsing
//! - [`CommitType`]: the closed set of declared commit types

mod commit;
mod conventional;
mod error;
mod raw;

pub use commit::{Commit, CommitBuilder, CommitType};
pub use conventional::parse;
pub use error::{CommitError, CommitResult};
pub use raw::RawCommit;
