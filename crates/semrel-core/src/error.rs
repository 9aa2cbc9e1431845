//! Core error types.

use thiserror::Error;

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] semrel_config::ConfigError),

    /// Commit type lists reference an unusable type.
    #[error("invalid commit type list: {0}")]
    CommitType(#[from] semrel_commit::CommitError),

    /// Malformed identifier template.
    #[error("invalid template `{template}`: {reason}")]
    Template {
        /// The template source.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A template rendered to something semver rejects.
    #[error("template `{template}` rendered an invalid identifier `{identifier}`")]
    InvalidIdentifier {
        /// The template source.
        template: String,
        /// The rendered value.
        identifier: String,
    },

    /// A pre-release needs at least one pre-release identifier.
    #[error("no pre-release templates configured")]
    NoPrereleaseTemplates,

    /// The highest existing sequence number has no successor.
    #[error("template `{template}` has no sequence number left after {version}")]
    SequenceExhausted {
        /// The template source.
        template: String,
        /// The version being stamped.
        version: semver::Version,
    },

    /// Pre-release or build metadata stamped twice.
    #[error("version {0} already carries pre-release or build identifiers")]
    AlreadyStamped(semver::Version),

    /// Changelog file lacks the insertion marker.
    #[error("changelog {0} has no `<!--- next entry here -->` marker")]
    ChangelogFormat(std::path::PathBuf),

    /// Version parsing error.
    #[error("version error: {0}")]
    Version(#[from] semver::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
