//! Bump levels and commit classification.

use std::fmt;

use semrel_commit::{Commit, CommitError, CommitType};
use semrel_config::VersionConfig;
use semver::Version;

use crate::CoreResult;

/// Magnitude of a version increment.
///
/// Ordered `None < Patch < Minor < Major`, so a release's level is the
/// `max` over its commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BumpLevel {
    /// No version bump needed.
    #[default]
    None,
    /// Patch version bump (bug fixes).
    Patch,
    /// Minor version bump (new features).
    Minor,
    /// Major version bump (breaking changes).
    Major,
}

impl BumpLevel {
    /// Applies this level to `version`, dropping pre-release and build data.
    #[must_use]
    pub fn apply(self, version: &Version) -> Version {
        match self {
            Self::Major => Version::new(version.major + 1, 0, 0),
            Self::Minor => Version::new(version.major, version.minor + 1, 0),
            Self::Patch => Version::new(version.major, version.minor, version.patch + 1),
            Self::None => Version::new(version.major, version.minor, version.patch),
        }
    }
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Which commit types trigger which bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpRules {
    patch_types: Vec<CommitType>,
    minor_types: Vec<CommitType>,
}

impl BumpRules {
    /// Creates rules from explicit type lists.
    #[must_use]
    pub fn new(patch_types: Vec<CommitType>, minor_types: Vec<CommitType>) -> Self {
        Self {
            patch_types,
            minor_types,
        }
    }

    /// Builds rules from the `[version]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if a list names an unknown type or `other`.
    pub fn from_config(config: &VersionConfig) -> CoreResult<Self> {
        Ok(Self::new(
            parse_types(&config.patch_types)?,
            parse_types(&config.minor_types)?,
        ))
    }

    /// Classifies a single commit.
    ///
    /// Breaking always wins, then minor types, then patch types.
    #[must_use]
    pub fn classify(&self, commit: &Commit) -> BumpLevel {
        if commit.breaking {
            BumpLevel::Major
        } else if self.minor_types.contains(&commit.r#type) {
            BumpLevel::Minor
        } else if self.patch_types.contains(&commit.r#type) {
            BumpLevel::Patch
        } else {
            BumpLevel::None
        }
    }
}

impl Default for BumpRules {
    fn default() -> Self {
        Self::new(
            vec![
                CommitType::Fix,
                CommitType::Refactor,
                CommitType::Perf,
                CommitType::Docs,
                CommitType::Style,
                CommitType::Test,
            ],
            vec![CommitType::Feat],
        )
    }
}

fn parse_types(names: &[String]) -> CoreResult<Vec<CommitType>> {
    names
        .iter()
        .map(|name| -> CoreResult<CommitType> {
            match name.parse::<CommitType>()? {
                CommitType::Other => Err(CommitError::UnknownType(name.clone()).into()),
                known => Ok(known),
            }
        })
        .collect()
}
