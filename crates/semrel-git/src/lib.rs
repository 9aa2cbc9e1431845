//! Git access for semrel.
//!
//! This crate provides the local VCS collaborator:
//! - Unreleased history since the nearest release tag
//! - Tag listing and creation
//! - Committing files

mod error;
mod repository;

pub use error::{GitError, GitResult};
pub use repository::{History, Repository};
