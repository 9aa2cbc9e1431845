//! Command implementations and the plumbing they share.

pub mod add_download;
pub mod changelog;
pub mod commit_and_tag;
pub mod next_version;
pub mod tag;
pub mod test_api;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use semrel_config::{Config, load_config_or_default};
use semrel_core::{
    BumpLevel, BumpRules, PrereleaseTemplates, Release, ReleaseLink, ReleaseVersion,
    TemplateContext, analyze_commits, versions_from_tags,
};
use semrel_git::Repository;
use semrel_gitlab::{GitlabClient, GitlabOptions};
use semrel_workflow::{
    Action, AddLink, ReleaseApi, RetryPolicy, UndoError, Upload, Workflow, WorkflowContext,
};
use tracing::{debug, info};

use crate::cli::GlobalArgs;

/// A file to upload and link to the release, given as `PATH=DESCRIPTION`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub description: String,
}

impl Download {
    pub fn new(path: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
        }
    }

    /// File name shown as the link text.
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }
}

impl FromStr for Download {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((path, description)) if !path.is_empty() => Ok(Self::new(path, description)),
            _ => Err(format!("expected PATH=DESCRIPTION, got `{s}`")),
        }
    }
}

/// Adds the links of `downloads` uploaded by a finished workflow.
pub fn record_links(release: &mut Release, ctx: &WorkflowContext, downloads: &[Download]) {
    for download in downloads {
        if let Some(upload) = ctx.upload(&download.path) {
            release.add_link(ReleaseLink {
                name: download.name(),
                url: upload.url.clone(),
                description: download.description.clone(),
            });
        }
    }
}

/// Configuration with command-line overrides applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub token: Option<String>,
    pub branch: Option<String>,
}

impl Settings {
    /// Loads `semrel.toml` (or defaults) and applies the global flags.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let mut config = load_config_or_default(&cwd).context("failed to load configuration")?;

        if let Some(prefix) = &global.tag_prefix {
            config.version.tag_prefix.clone_from(prefix);
        }
        if global.api_url.is_some() {
            config.gitlab.api_url.clone_from(&global.api_url);
        }
        if global.project.is_some() {
            config.gitlab.project.clone_from(&global.project);
        }
        if global.project_url.is_some() {
            config.gitlab.project_url.clone_from(&global.project_url);
        }
        if global.skip_ssl_verify {
            config.gitlab.skip_ssl_verify = true;
        }
        config.validate().context("invalid configuration")?;

        Ok(Self {
            config,
            token: global.token.clone(),
            branch: global.branch.clone(),
        })
    }

    /// The configured tag prefix.
    pub fn tag_prefix(&self) -> &str {
        &self.config.version.tag_prefix
    }

    /// The branch from the flags, or the checked out one.
    pub fn branch(&self, repo: &Repository) -> Result<Option<String>> {
        if self.branch.is_some() {
            return Ok(self.branch.clone());
        }
        repo.current_branch().context("failed to read current branch")
    }

    /// Builds the release from the unreleased history of `repo`.
    ///
    /// Off the release branches the next version becomes a pre-release.
    pub fn prepare_release(&self, repo: &Repository, bump_patch: bool) -> Result<Release> {
        let prefix = self.tag_prefix();
        let history = repo
            .history(prefix)
            .context("failed to read commit history")?;
        info!(
            current = %history.current,
            tag = ?history.current_tag,
            count = history.commits.len(),
            "found unreleased commits"
        );

        let rules =
            BumpRules::from_config(&self.config.version).context("invalid commit types")?;
        let version = ReleaseVersion::new(history.current)
            .initial_development(self.config.version.initial_development);
        let commits = history.commits.iter().map(semrel_commit::parse);
        let mut release = analyze_commits(commits, &rules, version, prefix);

        if bump_patch {
            release.force_patch();
        }

        let branch = self.branch(repo)?;
        let is_release_branch = branch
            .as_ref()
            .is_some_and(|b| self.config.version.release_branches.contains(b));
        debug!(?branch, is_release_branch, "resolved branch");

        if !is_release_branch && release.version().level() != BumpLevel::None {
            self.stamp_prerelease(repo, &mut release)?;
        }
        Ok(release)
    }

    fn stamp_prerelease(&self, repo: &Repository, release: &mut Release) -> Result<()> {
        let prerelease = &self.config.prerelease;
        let templates =
            PrereleaseTemplates::parse(&prerelease.pre_templates, &prerelease.build_templates)
                .context("invalid pre-release template")?;
        let tags = repo.tags().context("failed to list tags")?;
        let existing = versions_from_tags(&tags, self.tag_prefix());
        let ctx = TemplateContext::from_env(repo.head_time().context("failed to read HEAD")?);

        templates
            .stamp(release.version_mut(), &existing, &ctx)
            .context("failed to build pre-release version")
    }

    /// Connects to GitLab.
    pub fn gitlab_client(&self) -> Result<GitlabClient> {
        let options = GitlabOptions::from_config(&self.config.gitlab, self.token.clone())
            .context("incomplete GitLab settings (see --token and --project)")?;
        GitlabClient::new(options).context("failed to create GitLab client")
    }

    /// Upload and link actions for `downloads`, to run once the tag exists.
    pub fn download_actions(&self, downloads: &[Download]) -> Result<Vec<Action>> {
        if downloads.is_empty() {
            return Ok(Vec::new());
        }
        if self.config.gitlab.project_url.is_none() {
            bail!("project URL is required; pass --project-url or set CI_PROJECT_URL");
        }

        let releases_api = self.config.gitlab.releases_api;
        let mut actions = Vec::with_capacity(downloads.len() * 2);
        for download in downloads {
            if !download.path.is_file() {
                bail!("file not found: {}", download.path.display());
            }
            actions.push(Action::Upload(Upload::new(&download.path)));
            actions.push(Action::AddLink(AddLink::new(
                &download.path,
                &download.description,
                releases_api,
            )));
        }
        Ok(actions)
    }

    /// Runs `actions` with the configured retry policy and returns what
    /// they published.
    ///
    /// Prints every compensation that needs an operator before returning
    /// the failure.
    pub fn run_workflow(
        &self,
        api: &dyn ReleaseApi,
        mut actions: Vec<Action>,
    ) -> Result<WorkflowContext> {
        let workflow = Workflow::new(RetryPolicy::from(&self.config.workflow));
        let mut ctx = WorkflowContext::new();

        if let Err(err) = workflow.apply(&mut actions, api, &mut ctx) {
            for failure in err.rollback_failures() {
                eprintln!("MANUAL ACTION REQUIRED: {failure}");
                if let UndoError::DescriptionNotRestored { tag, original, .. } = failure {
                    eprintln!("Original description of tag {tag}:\n{original}");
                }
            }
            return Err(err.into());
        }
        Ok(ctx)
    }
}

/// Opens the repository containing the current directory.
pub fn open_repo() -> Result<Repository> {
    Repository::discover().context("failed to open git repository")
}

/// Prints the links recorded on `release`.
pub fn print_links(release: &Release) {
    for link in release.links() {
        println!("  {} ({}): {}", link.name, link.description, link.url);
    }
}
