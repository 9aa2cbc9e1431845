//! Error types for the GitLab client.

/// Result type for GitLab client setup.
pub type GitlabResult<T> = Result<T, GitlabError>;

/// GitLab client setup errors.
#[derive(Debug, thiserror::Error)]
pub enum GitlabError {
    /// No access token was given.
    #[error("gitlab token not set")]
    MissingToken,

    /// No project was given.
    #[error("gitlab project not set")]
    MissingProject,

    /// The API URL is unusable.
    #[error("invalid gitlab API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}
