//! Tag command.

use anyhow::{Context, Result, bail};
use clap::Args;
use semrel_core::changelog::{RenderOptions, release_note};
use semrel_workflow::{Action, CreatePipeline, CreateTag, RefSource};

use super::{Download, Settings, open_repo, print_links, record_links};
use crate::cli::GlobalArgs;

/// Arguments for the tag command.
#[derive(Debug, Args)]
pub struct TagArgs {
    /// Commit to tag (defaults to HEAD)
    #[arg(long = "ref", env = "CI_COMMIT_SHA")]
    pub git_ref: Option<String>,

    /// Start a pipeline for the new tag
    #[arg(long)]
    pub create_tag_pipeline: bool,

    /// Create an annotated tag at HEAD in the local repository instead of
    /// on GitLab
    #[arg(long, conflicts_with_all = ["create_tag_pipeline", "downloads"])]
    pub local: bool,

    /// Also list commits that do not change the version
    #[arg(long)]
    pub list_other_changes: bool,

    /// Upload a file and link it to the new release (PATH=DESCRIPTION)
    #[arg(long = "download", value_name = "PATH=DESCRIPTION")]
    pub downloads: Vec<Download>,
}

/// Runs the tag command.
pub fn run(global: &GlobalArgs, args: TagArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let repo = open_repo()?;
    let mut release = settings.prepare_release(&repo, false)?;
    if !release.has_content() {
        bail!("no changes detected");
    }
    let options = RenderOptions::today(
        args.list_other_changes || settings.config.changelog.list_other_changes,
    );
    let tag_name = release.tag_name();
    let head = repo.head_id().context("failed to read HEAD")?;

    if args.local {
        if let Some(git_ref) = args.git_ref.as_deref().filter(|r| *r != head) {
            bail!("--local tags HEAD ({head}), not {git_ref}");
        }
        repo.create_tag(&tag_name, &release_note(&release, &options))
            .with_context(|| format!("failed to create tag {tag_name}"))?;
        println!("Created local tag {tag_name}");
        return Ok(());
    }

    let downloads = settings.download_actions(&args.downloads)?;
    let client = settings.gitlab_client()?;
    let git_ref = args.git_ref.unwrap_or(head);

    let mut actions = vec![
        Action::Check,
        Action::CreateTag(CreateTag::new(
            &tag_name,
            RefSource::Fixed(git_ref),
            release_note(&release, &options),
            settings.config.gitlab.releases_api,
        )),
    ];
    actions.extend(downloads);
    if args.create_tag_pipeline {
        actions.push(Action::CreatePipeline(CreatePipeline::new(RefSource::Tag)));
    }

    let ctx = settings.run_workflow(&client, actions)?;
    record_links(&mut release, &ctx, &args.downloads);
    println!("Created tag {tag_name}");
    print_links(&release);
    Ok(())
}
