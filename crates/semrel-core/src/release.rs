//! Release aggregate and commit analysis.

use std::collections::BTreeMap;
use std::fmt;

use semrel_commit::{Commit, CommitType};
use semver::Version;
use tracing::{debug, info};

use crate::{BumpLevel, BumpRules, ReleaseVersion};

/// Change category of a release, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Any breaking change.
    Breaking,
    /// `feat`
    Feature,
    /// `fix`
    Fix,
    /// `perf`
    Performance,
    /// `refactor`
    Refactor,
    /// `docs`
    Documentation,
    /// `style`
    Style,
    /// `test`
    Test,
    /// `chore`
    Chore,
    /// Commits that did not affect the version.
    Other,
}

impl Category {
    /// All categories in rendering order.
    pub const ALL: [Self; 10] = [
        Self::Breaking,
        Self::Feature,
        Self::Fix,
        Self::Performance,
        Self::Refactor,
        Self::Documentation,
        Self::Style,
        Self::Test,
        Self::Chore,
        Self::Other,
    ];

    /// Category of a classified commit.
    #[must_use]
    pub fn of(commit: &Commit, level: BumpLevel) -> Self {
        if commit.breaking {
            return Self::Breaking;
        }
        if level == BumpLevel::None {
            return Self::Other;
        }
        Self::from(commit.r#type)
    }

    /// Section heading used in release notes.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Breaking => "Breaking changes",
            Self::Feature => "Features",
            Self::Fix => "Fixes",
            Self::Performance => "Performance improvements",
            Self::Refactor => "Refactoring",
            Self::Documentation => "Documentation",
            Self::Style => "Style",
            Self::Test => "Tests",
            Self::Chore => "Chores",
            Self::Other => "Other changes",
        }
    }

    /// Reverse of [`Category::label`].
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label.trim())
    }

    /// Short key, e.g. `breaking` or `fix`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Breaking => "breaking",
            Self::Feature => "feat",
            Self::Fix => "fix",
            Self::Performance => "perf",
            Self::Refactor => "refactor",
            Self::Documentation => "docs",
            Self::Style => "style",
            Self::Test => "test",
            Self::Chore => "chore",
            Self::Other => "other",
        }
    }
}

impl From<CommitType> for Category {
    fn from(r#type: CommitType) -> Self {
        match r#type {
            CommitType::Feat => Self::Feature,
            CommitType::Fix => Self::Fix,
            CommitType::Perf => Self::Performance,
            CommitType::Refactor => Self::Refactor,
            CommitType::Docs => Self::Documentation,
            CommitType::Style => Self::Style,
            CommitType::Test => Self::Test,
            CommitType::Chore => Self::Chore,
            CommitType::Other => Self::Other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLink {
    /// Link text.
    pub name: String,
    /// Absolute URL.
    pub url: String,
    /// Human description.
    pub description: String,
}

/// A release being prepared.
#[derive(Debug, Clone)]
pub struct Release {
    version: ReleaseVersion,
    tag_prefix: String,
    changes: BTreeMap<Category, Vec<Commit>>,
    links: Vec<ReleaseLink>,
}

impl Release {
    /// Creates an empty release on top of `version`.
    #[must_use]
    pub fn new(version: ReleaseVersion, tag_prefix: impl Into<String>) -> Self {
        Self {
            version,
            tag_prefix: tag_prefix.into(),
            changes: BTreeMap::new(),
            links: Vec::new(),
        }
    }

    /// Creates an empty release for a project without prior releases.
    #[must_use]
    pub fn initial(tag_prefix: &str) -> Self {
        Self::new(ReleaseVersion::new(Version::new(0, 0, 0)), tag_prefix)
    }

    /// The version model.
    #[must_use]
    pub fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Mutable access for pre-release stamping.
    pub fn version_mut(&mut self) -> &mut ReleaseVersion {
        &mut self.version
    }

    /// Tag name of the next version.
    #[must_use]
    pub fn tag_name(&self) -> String {
        format!("{}{}", self.tag_prefix, self.version.next())
    }

    /// Tag prefix.
    #[must_use]
    pub fn tag_prefix(&self) -> &str {
        &self.tag_prefix
    }

    /// Non-empty categories with their commits, in rendering order.
    pub fn changes(&self) -> impl Iterator<Item = (Category, &[Commit])> {
        self.changes.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    /// Commits of one category.
    #[must_use]
    pub fn commits(&self, category: Category) -> &[Commit] {
        self.changes
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Classifies `commit`, bumps the version and records the change.
    pub fn add_commit(&mut self, commit: Commit, rules: &BumpRules) {
        let level = rules.classify(&commit);
        self.version.bump(level);
        let category = Category::of(&commit, level);
        debug!(hash = %commit.short_hash(), %level, %category, "classified commit");
        self.changes.entry(category).or_default().push(commit);
    }

    /// Links added after upload.
    #[must_use]
    pub fn links(&self) -> &[ReleaseLink] {
        &self.links
    }

    /// Records a download link.
    pub fn add_link(&mut self, link: ReleaseLink) {
        self.links.push(link);
    }

    /// Whether the release has anything worth publishing.
    ///
    /// Requires a bump, and for a pre-release at least one versioned
    /// change not already shipped in an earlier pre-release.
    #[must_use]
    pub fn has_content(&self) -> bool {
        if self.version.level() == BumpLevel::None {
            return false;
        }
        if !self.version.is_prerelease() {
            return true;
        }
        self.changes
            .iter()
            .filter(|(category, _)| **category != Category::Other)
            .flat_map(|(_, commits)| commits)
            .any(|c| !c.pre_released)
    }

    /// Forces a patch release when no commit bumped the version.
    ///
    /// Each unreleased commit gets a synthetic fix entry titled with its
    /// first message line. Returns whether the release was changed.
    pub fn force_patch(&mut self) -> bool {
        if self.version.level() != BumpLevel::None {
            return false;
        }
        self.version.bump(BumpLevel::Patch);

        let fixes: Vec<Commit> = self
            .commits(Category::Other)
            .iter()
            .map(|c| {
                let mut fix = c.clone();
                fix.r#type = CommitType::Fix;
                fix.scope = None;
                fix.subject = c.title.clone();
                fix
            })
            .collect();
        info!(count = fixes.len(), "forcing patch release");
        self.changes.entry(Category::Fix).or_default().extend(fixes);
        true
    }
}

/// Builds a release from unreleased commits, newest first.
#[must_use]
pub fn analyze_commits(
    commits: impl IntoIterator<Item = Commit>,
    rules: &BumpRules,
    version: ReleaseVersion,
    tag_prefix: &str,
) -> Release {
    let mut release = Release::new(version, tag_prefix);
    let mut count = 0usize;
    for commit in commits {
        release.add_commit(commit, rules);
        count += 1;
    }
    info!(
        count,
        level = %release.version.level(),
        current = %release.version.current(),
        next = %release.version.next(),
        "analyzed commits"
    );
    release
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::{BuildMetadata, Prerelease};

    fn commit(hash: &str, r#type: CommitType, subject: &str) -> Commit {
        Commit::builder(hash, r#type)
            .subject(subject)
            .title(format!("{}: {subject}", r#type))
            .build()
    }

    fn analyze(commits: Vec<Commit>, current: &str) -> Release {
        analyze_commits(
            commits,
            &BumpRules::default(),
            ReleaseVersion::new(Version::parse(current).unwrap()),
            "v",
        )
    }

    fn subjects(release: &Release, category: Category) -> Vec<&str> {
        release
            .commits(category)
            .iter()
            .map(|c| c.subject.as_str())
            .collect()
    }

    #[test]
    fn test_category_labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("Downloads"), None);
    }

    #[test]
    fn test_category_of() {
        let breaking = Commit::builder("a", CommitType::Chore).breaking(true).build();
        assert_eq!(Category::of(&breaking, BumpLevel::Major), Category::Breaking);

        let chore = Commit::builder("b", CommitType::Chore).build();
        assert_eq!(Category::of(&chore, BumpLevel::None), Category::Other);

        let docs = Commit::builder("c", CommitType::Docs).build();
        assert_eq!(Category::of(&docs, BumpLevel::Patch), Category::Documentation);
    }

    #[test]
    fn test_analyze_groups_by_category_in_order() {
        let release = analyze(
            vec![
                commit("1", CommitType::Fix, "first fix"),
                commit("2", CommitType::Feat, "feature"),
                commit("3", CommitType::Fix, "second fix"),
                commit("4", CommitType::Chore, "tidy"),
            ],
            "1.0.0",
        );

        assert_eq!(release.version().level(), BumpLevel::Minor);
        assert_eq!(release.version().next(), &Version::new(1, 1, 0));
        assert_eq!(release.tag_name(), "v1.1.0");
        assert_eq!(subjects(&release, Category::Fix), vec!["first fix", "second fix"]);
        assert_eq!(subjects(&release, Category::Other), vec!["tidy"]);

        let order: Vec<Category> = release.changes().map(|(c, _)| c).collect();
        assert_eq!(
            order,
            vec![Category::Feature, Category::Fix, Category::Other]
        );
    }

    #[test]
    fn test_analyze_breaking() {
        let mut breaking = commit("1", CommitType::Fix, "drop api");
        breaking.breaking = true;
        let release = analyze(
            vec![commit("2", CommitType::Feat, "feature"), breaking],
            "1.4.2",
        );
        assert_eq!(release.version().next(), &Version::new(2, 0, 0));
        assert_eq!(subjects(&release, Category::Breaking), vec!["drop api"]);
    }

    #[test]
    fn test_no_commits_has_no_content() {
        let release = analyze(vec![], "1.0.0");
        assert!(!release.has_content());
        assert_eq!(release.version().next(), &Version::new(1, 0, 0));
    }

    #[test]
    fn test_only_other_has_no_content() {
        let release = analyze(vec![commit("1", CommitType::Chore, "tidy")], "1.0.0");
        assert!(!release.has_content());
    }

    #[test]
    fn test_final_release_has_content() {
        let release = analyze(vec![commit("1", CommitType::Fix, "bug")], "1.0.0");
        assert!(release.has_content());
    }

    #[test]
    fn test_prerelease_with_only_pre_released_commits_has_no_content() {
        let mut shipped = commit("1", CommitType::Feat, "shipped in rc.1");
        shipped.pre_released = true;
        let mut release = analyze(
            vec![shipped, commit("2", CommitType::Chore, "tidy")],
            "1.0.0",
        );
        release
            .version_mut()
            .stamp(Prerelease::new("rc.2").unwrap(), BuildMetadata::EMPTY)
            .unwrap();
        assert!(!release.has_content());
    }

    #[test]
    fn test_prerelease_with_new_commit_has_content() {
        let mut shipped = commit("1", CommitType::Feat, "shipped in rc.1");
        shipped.pre_released = true;
        let mut release = analyze(
            vec![commit("2", CommitType::Fix, "new fix"), shipped],
            "1.0.0",
        );
        release
            .version_mut()
            .stamp(Prerelease::new("rc.2").unwrap(), BuildMetadata::EMPTY)
            .unwrap();
        assert!(release.has_content());
    }

    #[test]
    fn test_pre_released_commits_do_not_block_final_release() {
        let mut shipped = commit("1", CommitType::Feat, "shipped in rc.1");
        shipped.pre_released = true;
        let release = analyze(vec![shipped], "1.0.0");
        assert!(release.has_content());
    }

    #[test]
    fn test_force_patch() {
        let mut release = analyze(
            vec![
                commit("1", CommitType::Chore, "update deps"),
                Commit::builder("2", CommitType::Other)
                    .subject("Merge branch 'x'")
                    .build(),
            ],
            "1.2.3",
        );
        assert!(!release.has_content());

        assert!(release.force_patch());
        assert!(release.has_content());
        assert_eq!(release.version().level(), BumpLevel::Patch);
        assert_eq!(release.version().next(), &Version::new(1, 2, 4));
        assert_eq!(
            subjects(&release, Category::Fix),
            vec!["chore: update deps", "Merge branch 'x'"]
        );
        assert!(
            release
                .commits(Category::Fix)
                .iter()
                .all(|c| c.r#type == CommitType::Fix)
        );
    }

    #[test]
    fn test_force_patch_noop_when_bumped() {
        let mut release = analyze(vec![commit("1", CommitType::Feat, "feature")], "1.2.3");
        assert!(!release.force_patch());
        assert_eq!(release.version().next(), &Version::new(1, 3, 0));
        assert!(release.commits(Category::Fix).is_empty());
    }

    #[test]
    fn test_links() {
        let mut release = Release::initial("v");
        release.add_link(ReleaseLink {
            name: "app.tar.gz".to_string(),
            url: "https://example.com/uploads/app.tar.gz".to_string(),
            description: "Linux build".to_string(),
        });
        assert_eq!(release.links().len(), 1);
        assert_eq!(release.tag_name(), "v0.0.0");
    }
}
