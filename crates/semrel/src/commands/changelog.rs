//! Changelog command.

use anyhow::{Context, Result, bail};
use clap::Args;
use semrel_core::changelog::{
    RenderOptions, bump_commit_message, changelog_entry, update_changelog, updated_changelog,
};
use tracing::info;

use super::{Settings, open_repo};
use crate::cli::GlobalArgs;

/// Arguments for the changelog command.
#[derive(Debug, Args)]
pub struct ChangelogArgs {
    /// Print the entry instead of writing the file
    #[arg(short, long, conflicts_with = "commit")]
    pub dry_run: bool,

    /// Commit the updated file on the current branch of the local repository
    #[arg(long)]
    pub commit: bool,

    /// Also list commits that do not change the version
    #[arg(long)]
    pub list_other_changes: bool,
}

/// Runs the changelog command.
pub fn run(global: &GlobalArgs, args: &ChangelogArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let repo = open_repo()?;
    let release = settings.prepare_release(&repo, false)?;
    if !release.has_content() {
        bail!("no changes detected");
    }

    let changelog = &settings.config.changelog;
    let options = RenderOptions::today(args.list_other_changes || changelog.list_other_changes);
    let entry = changelog_entry(&release, &options);

    if args.dry_run {
        println!("{entry}");
        return Ok(());
    }

    let path = repo.path().join(&changelog.file);
    let tag_name = release.tag_name();
    if args.commit {
        let content = updated_changelog(&path, &entry)
            .with_context(|| format!("failed to update {}", path.display()))?;
        let message = bump_commit_message(&changelog.bump_commit_template, &tag_name);
        let id = repo
            .commit_files(&[(changelog.file.as_str(), content)], &message)
            .context("failed to commit changelog")?;
        info!(%id, path = %path.display(), "committed changelog");
        println!("Committed {} for {tag_name}", changelog.file);
        return Ok(());
    }

    update_changelog(&path, &entry)
        .with_context(|| format!("failed to update {}", path.display()))?;
    info!(path = %path.display(), version = %release.version().next(), "updated changelog");
    println!("Updated {} for {tag_name}", changelog.file);
    Ok(())
}
