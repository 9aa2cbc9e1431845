//! Commits as read from the repository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of abbreviated hashes in release notes.
const SHORT_HASH_LEN: usize = 7;

/// An unparsed commit yielded by the history walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    /// Full object id.
    pub hash: String,

    /// Message including the header line.
    pub message: String,

    pub author: String,

    pub email: String,

    /// Commit time.
    pub date: DateTime<Utc>,

    /// Reachable from a pre-release tag, i.e. already shipped in a
    /// pre-release of the upcoming version.
    #[serde(default)]
    pub pre_released: bool,
}

impl RawCommit {
    #[must_use]
    pub fn new(
        hash: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        email: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
            author: author.into(),
            email: email.into(),
            date,
            pre_released: false,
        }
    }

    /// Sets the pre-released flag.
    #[must_use]
    pub fn with_pre_released(mut self, pre_released: bool) -> Self {
        self.pre_released = pre_released;
        self
    }

    /// The header line.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Everything below the header, or `None` when that is blank.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        let body = self.message.split_once('\n')?.1.trim();
        (!body.is_empty()).then_some(body)
    }

    /// The abbreviated hash used in release notes.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        self.hash.get(..SHORT_HASH_LEN).unwrap_or(&self.hash)
    }
}
