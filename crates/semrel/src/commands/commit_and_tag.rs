//! Commit-and-tag command.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use semrel_core::changelog::{RenderOptions, bump_commit_message, release_note};
use semrel_workflow::{Action, Commit, CreatePipeline, CreateTag, FileChange, RefSource};
use tracing::info;

use super::{Download, Settings, open_repo, print_links, record_links};
use crate::cli::GlobalArgs;

/// CI skip marker; the tag needs its own pipeline when the commit has one.
const SKIP_CI: &str = "[skip ci]";

/// Arguments for the commit-and-tag command.
#[derive(Debug, Args)]
pub struct CommitAndTagArgs {
    /// Files to commit, relative to the repository root
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Also list commits that do not change the version
    #[arg(long)]
    pub list_other_changes: bool,

    /// Upload a file and link it to the new release (PATH=DESCRIPTION)
    #[arg(long = "download", value_name = "PATH=DESCRIPTION")]
    pub downloads: Vec<Download>,
}

/// Runs the commit-and-tag command.
pub fn run(global: &GlobalArgs, args: &CommitAndTagArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let repo = open_repo()?;
    let mut release = settings.prepare_release(&repo, false)?;
    if !release.has_content() {
        bail!("no changes detected");
    }
    let Some(branch) = settings.branch(&repo)? else {
        bail!("cannot determine the branch to commit to; pass --branch");
    };
    let downloads = settings.download_actions(&args.downloads)?;
    let client = settings.gitlab_client()?;

    let files = args
        .files
        .iter()
        .map(|path| -> Result<FileChange> {
            let content = fs::read_to_string(repo.path().join(path))
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(FileChange {
                path: path.to_string_lossy().replace('\\', "/"),
                content,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let tag_name = release.tag_name();
    let message = bump_commit_message(&settings.config.changelog.bump_commit_template, &tag_name);
    let options = RenderOptions::today(
        args.list_other_changes || settings.config.changelog.list_other_changes,
    );
    info!(%branch, %tag_name, files = files.len(), "committing release files");

    let mut actions = vec![
        Action::Check,
        Action::Commit(Commit::new(&branch, &message, files)),
        Action::CreateTag(CreateTag::new(
            &tag_name,
            RefSource::Commit,
            release_note(&release, &options),
            settings.config.gitlab.releases_api,
        )),
    ];
    actions.extend(downloads);
    if message.contains(SKIP_CI) {
        actions.push(Action::CreatePipeline(CreatePipeline::new(RefSource::Tag)));
    }

    let ctx = settings.run_workflow(&client, actions)?;
    record_links(&mut release, &ctx, &args.downloads);
    println!("Committed to {branch} and created tag {tag_name}");
    print_links(&release);
    Ok(())
}
