//! Core library for semrel.
//!
//! This crate turns parsed commits into a release:
//! - [`BumpRules`] classifies commits into a [`BumpLevel`]
//! - [`Release`] aggregates the [`ReleaseVersion`] and categorized changes
//! - [`PrereleaseTemplates`] stamps pre-release identifiers with sequence numbers
//! - [`changelog`] renders release notes and changelog entries

mod bump;
pub mod changelog;
mod error;
mod prerelease;
mod release;
mod version;

pub use bump::{BumpLevel, BumpRules};
pub use error::{CoreError, CoreResult};
pub use prerelease::{PrereleaseTemplates, TemplateContext, resolve_sequence, versions_from_tags};
pub use release::{Category, Release, ReleaseLink, analyze_commits};
pub use version::ReleaseVersion;
