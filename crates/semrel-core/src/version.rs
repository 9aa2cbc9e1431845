//! Version model.

use semver::{BuildMetadata, Prerelease, Version};

use crate::{BumpLevel, CoreError, CoreResult};

/// Current and candidate version of a release.
///
/// `level` only ever rises, and `next` is always derived from `current`
/// with the accumulated level. Pre-release and build identifiers are
/// stamped onto `next` once, after all bumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    current: Version,
    next: Version,
    level: BumpLevel,
    initial_development: bool,
}

impl ReleaseVersion {
    /// Creates a version with no bump applied.
    #[must_use]
    pub fn new(current: Version) -> Self {
        Self {
            next: BumpLevel::None.apply(&current),
            current,
            level: BumpLevel::None,
            initial_development: false,
        }
    }

    /// While `current` is below 1.0.0, turn breaking changes into minor
    /// bumps of `next`. The recorded level stays `Major`.
    #[must_use]
    pub fn initial_development(mut self, enabled: bool) -> Self {
        self.initial_development = enabled;
        self.next = self.effective_level().apply(&self.current);
        self
    }

    /// The last released version.
    #[must_use]
    pub fn current(&self) -> &Version {
        &self.current
    }

    /// The candidate version.
    #[must_use]
    pub fn next(&self) -> &Version {
        &self.next
    }

    /// The highest level applied so far.
    #[must_use]
    pub fn level(&self) -> BumpLevel {
        self.level
    }

    /// Raises the level to `level` and recomputes `next`.
    ///
    /// A level not above the current one is a no-op. Returns whether
    /// anything changed.
    pub fn bump(&mut self, level: BumpLevel) -> bool {
        if level <= self.level {
            return false;
        }
        self.level = level;
        self.next = self.effective_level().apply(&self.current);
        true
    }

    /// Whether `next` carries pre-release or build identifiers.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.next.pre.is_empty() || !self.next.build.is_empty()
    }

    /// Attaches pre-release and build identifiers to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyStamped`] if `next` was stamped before.
    pub fn stamp(&mut self, pre: Prerelease, build: BuildMetadata) -> CoreResult<()> {
        if self.is_prerelease() {
            return Err(CoreError::AlreadyStamped(self.next.clone()));
        }
        self.next.pre = pre;
        self.next.build = build;
        Ok(())
    }

    fn effective_level(&self) -> BumpLevel {
        if self.initial_development && self.current.major == 0 && self.level == BumpLevel::Major
        {
            BumpLevel::Minor
        } else {
            self.level
        }
    }
}
