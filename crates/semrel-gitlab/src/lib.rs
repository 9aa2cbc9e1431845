//! GitLab release API for semrel.
//!
//! [`GitlabClient`] implements [`semrel_workflow::ReleaseApi`] on top of
//! the GitLab REST v4 API.

pub mod client;
pub mod error;

pub use client::{GitlabClient, GitlabOptions};
pub use error::{GitlabError, GitlabResult};
