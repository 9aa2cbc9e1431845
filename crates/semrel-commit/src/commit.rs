//! Parsed commit type.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CommitError;

/// Declared type of a commit.
///
/// Anything outside the known Conventional Commits vocabulary is
/// [`CommitType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    /// A bug fix.
    Fix,
    /// A new feature.
    Feat,
    /// A code change that neither fixes a bug nor adds a feature.
    Refactor,
    /// A performance improvement.
    Perf,
    /// Documentation only.
    Docs,
    /// Formatting, whitespace and similar.
    Style,
    /// Adding or correcting tests.
    Test,
    /// Maintenance.
    Chore,
    /// Unrecognized or missing type.
    Other,
}

impl CommitType {
    /// All known types, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Fix,
        Self::Feat,
        Self::Refactor,
        Self::Perf,
        Self::Docs,
        Self::Style,
        Self::Test,
        Self::Chore,
        Self::Other,
    ];

    /// Maps a declared type name to a type, falling back to [`CommitType::Other`].
    #[must_use]
    pub fn from_declared(name: &str) -> Self {
        name.parse().unwrap_or(Self::Other)
    }

    /// Returns the lowercase type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fix => "fix",
            Self::Feat => "feat",
            Self::Refactor => "refactor",
            Self::Perf => "perf",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Test => "test",
            Self::Chore => "chore",
            Self::Other => "other",
        }
    }
}

impl FromStr for CommitType {
    type Err = CommitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| CommitError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A commit after Conventional Commits parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// The commit hash (SHA).
    pub hash: String,

    /// The declared commit type.
    pub r#type: CommitType,

    /// The optional scope.
    pub scope: Option<String>,

    /// The subject (without type and scope prefix).
    pub subject: String,

    /// The raw first line of the message.
    pub title: String,

    /// The optional body.
    pub body: Option<String>,

    /// Whether this is a breaking change.
    pub breaking: bool,

    /// Text of the `BREAKING CHANGE:` footer, if any.
    pub breaking_message: Option<String>,

    /// Whether the change already shipped in a pre-release.
    pub pre_released: bool,

    /// The commit author name.
    pub author: String,

    /// The commit date.
    pub date: DateTime<Utc>,
}

impl Commit {
    /// Creates a new commit builder.
    #[must_use]
    pub fn builder(hash: impl Into<String>, r#type: CommitType) -> CommitBuilder {
        CommitBuilder::new(hash, r#type)
    }

    /// Returns the short hash (first 7 characters).
    #[must_use]
    pub fn short_hash(&self) -> &str {
        &self.hash[..7.min(self.hash.len())]
    }
}

/// Builder for [`Commit`].
#[derive(Debug)]
pub struct CommitBuilder {
    hash: String,
    r#type: CommitType,
    scope: Option<String>,
    subject: String,
    title: Option<String>,
    body: Option<String>,
    breaking: bool,
    breaking_message: Option<String>,
    pre_released: bool,
    author: String,
    date: DateTime<Utc>,
}

impl CommitBuilder {
    fn new(hash: impl Into<String>, r#type: CommitType) -> Self {
        Self {
            hash: hash.into(),
            r#type,
            scope: None,
            subject: String::new(),
            title: None,
            body: None,
            breaking: false,
            breaking_message: None,
            pre_released: false,
            author: String::new(),
            date: Utc::now(),
        }
    }

    /// Sets the scope. An empty scope is treated as none.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = (!scope.is_empty()).then_some(scope);
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the raw first message line. Defaults to the subject.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the breaking flag.
    #[must_use]
    pub fn breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }

    /// Sets the breaking change description. Implies `breaking`.
    #[must_use]
    pub fn breaking_message(mut self, message: impl Into<String>) -> Self {
        self.breaking = true;
        self.breaking_message = Some(message.into());
        self
    }

    /// Sets the pre-released flag.
    #[must_use]
    pub fn pre_released(mut self, pre_released: bool) -> Self {
        self.pre_released = pre_released;
        self
    }

    /// Sets the author.
    #[must_use]
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Sets the date.
    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Builds the [`Commit`].
    #[must_use]
    pub fn build(self) -> Commit {
        Commit {
            hash: self.hash,
            r#type: self.r#type,
            scope: self.scope,
            title: self.title.unwrap_or_else(|| self.subject.clone()),
            subject: self.subject,
            body: self.body,
            breaking: self.breaking,
            breaking_message: self.breaking_message,
            pre_released: self.pre_released,
            author: self.author,
            date: self.date,
        }
    }
}
