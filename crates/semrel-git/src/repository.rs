//! Git repository wrapper.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use git2::{ErrorCode, Oid, Repository as Git2Repo};
use semrel_commit::RawCommit;
use semver::Version;
use tracing::debug;

use crate::{GitError, GitResult};

/// Unreleased history as seen from `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    /// Highest final release reachable from `HEAD`, or `0.0.0`.
    pub current: Version,

    /// Tag name of `current`, if any release exists.
    pub current_tag: Option<String>,

    /// Commits not covered by a release tag, newest first.
    pub commits: Vec<RawCommit>,
}

/// A Git repository wrapper.
pub struct Repository {
    inner: Git2Repo,
}

struct VersionTag {
    name: String,
    version: Version,
    target: Oid,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Discovers the repository from the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found.
    pub fn discover() -> GitResult<Self> {
        let inner = Git2Repo::discover(".")?;
        Ok(Self { inner })
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns all tags in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tags(&self) -> GitResult<Vec<String>> {
        let tags = self.inner.tag_names(None)?;
        Ok(tags.iter().flatten().map(String::from).collect())
    }

    /// Returns the checked out branch name, or `None` when `HEAD` is detached.
    ///
    /// # Errors
    ///
    /// Returns an error if `HEAD` cannot be resolved.
    pub fn current_branch(&self) -> GitResult<Option<String>> {
        let head = match self.inner.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !head.is_branch() {
            return Ok(None);
        }
        Ok(head.shorthand().map(String::from))
    }

    /// Returns the commit time of `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository has no commits.
    pub fn head_time(&self) -> GitResult<DateTime<Utc>> {
        let commit = self.head_commit()?.ok_or(GitError::NoCommits)?;
        Ok(to_utc(commit.time().seconds()))
    }

    /// Returns the full id of the `HEAD` commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository has no commits.
    pub fn head_id(&self) -> GitResult<String> {
        let commit = self.head_commit()?.ok_or(GitError::NoCommits)?;
        Ok(commit.id().to_string())
    }

    /// Returns the version tag with `prefix` pointing at `HEAD`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tag_at_head(&self, prefix: &str) -> GitResult<Option<String>> {
        let Some(head) = self.head_commit()? else {
            return Ok(None);
        };
        let head = head.id();
        let best = self
            .version_tags(prefix)?
            .into_iter()
            .filter(|t| t.target == head)
            .max_by(|a, b| a.version.cmp(&b.version));
        Ok(best.map(|t| t.name))
    }

    /// Collects the unreleased history of `HEAD`.
    ///
    /// Tags named `prefix` + semver are considered. Final release tags
    /// reachable from `HEAD` bound the walk on every ancestry path; the
    /// highest of them is the current version. Commits reachable from a
    /// pre-release tag are flagged as pre-released.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be walked.
    pub fn history(&self, prefix: &str) -> GitResult<History> {
        let Some(head) = self.head_commit()? else {
            return Ok(History {
                current: Version::new(0, 0, 0),
                current_tag: None,
                commits: Vec::new(),
            });
        };
        let head = head.id();

        let mut releases = Vec::new();
        let mut pre_releases = Vec::new();
        for tag in self.version_tags(prefix)? {
            if tag.target != head && !self.inner.graph_descendant_of(head, tag.target)? {
                continue;
            }
            if tag.version.pre.is_empty() {
                releases.push(tag);
            } else {
                pre_releases.push(tag);
            }
        }

        let latest = releases.iter().max_by(|a, b| a.version.cmp(&b.version));
        let current = latest.map_or_else(|| Version::new(0, 0, 0), |t| t.version.clone());
        let current_tag = latest.map(|t| t.name.clone());
        debug!(%current, releases = releases.len(), pre_releases = pre_releases.len(), "resolved version tags");

        let boundaries: Vec<Oid> = releases.iter().map(|t| t.target).collect();

        let pre_released: HashSet<Oid> = if pre_releases.is_empty() {
            HashSet::new()
        } else {
            let mut revwalk = self.inner.revwalk()?;
            for tag in &pre_releases {
                revwalk.push(tag.target)?;
            }
            for oid in &boundaries {
                revwalk.hide(*oid)?;
            }
            revwalk.collect::<Result<_, _>>()?
        };

        let mut revwalk = self.inner.revwalk()?;
        revwalk.push(head)?;
        for oid in &boundaries {
            revwalk.hide(*oid)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.inner.find_commit(oid)?;
            commits.push(to_raw(&commit).with_pre_released(pre_released.contains(&oid)));
        }

        Ok(History {
            current,
            current_tag,
            commits,
        })
    }

    /// Creates an annotated tag at `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::TagExists`] if `name` is taken, or
    /// [`GitError::NoCommits`] on an unborn branch.
    pub fn create_tag(&self, name: &str, message: &str) -> GitResult<()> {
        if self.inner.refname_to_id(&format!("refs/tags/{name}")).is_ok() {
            return Err(GitError::TagExists(name.to_string()));
        }
        let commit = self.head_commit()?.ok_or(GitError::NoCommits)?;
        let sig = self.inner.signature()?;

        let oid = self
            .inner
            .tag(name, commit.as_object(), &sig, message, false)?;
        debug!(%oid, tag = name, "created tag");
        Ok(())
    }

    /// Writes `files` into the working tree and commits them on the current
    /// branch. Returns the new commit id.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written or the commit fails.
    pub fn commit_files<P: AsRef<Path>>(
        &self,
        files: &[(P, String)],
        message: &str,
    ) -> GitResult<String> {
        let workdir = self.inner.workdir().ok_or(GitError::Bare)?;
        let mut index = self.inner.index()?;

        for (path, content) in files {
            let path = path.as_ref();
            let full = workdir.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full, content)?;
            index.add_path(path)?;
        }
        index.write()?;

        let tree = self.inner.find_tree(index.write_tree()?)?;
        let sig = self.inner.signature()?;
        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        debug!(%oid, files = files.len(), "committed files");
        Ok(oid.to_string())
    }

    fn head_commit(&self) -> GitResult<Option<git2::Commit<'_>>> {
        match self.inner.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn version_tags(&self, prefix: &str) -> GitResult<Vec<VersionTag>> {
        let mut tags = Vec::new();
        for name in self.tags()? {
            let Some(version) = name
                .strip_prefix(prefix)
                .and_then(|v| Version::parse(v).ok())
            else {
                continue;
            };
            let target = self
                .inner
                .revparse_single(&format!("refs/tags/{name}"))?
                .peel_to_commit()?
                .id();
            tags.push(VersionTag {
                name,
                version,
                target,
            });
        }
        Ok(tags)
    }
}

fn to_utc(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn to_raw(commit: &git2::Commit<'_>) -> RawCommit {
    let author = commit.author();
    RawCommit::new(
        commit.id().to_string(),
        commit.message().unwrap_or(""),
        author.name().unwrap_or("Unknown"),
        author.email().unwrap_or(""),
        to_utc(commit.time().seconds()),
    )
}
