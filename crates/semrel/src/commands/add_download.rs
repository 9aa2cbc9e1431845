//! Add-download command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use semrel_workflow::{Action, GetTag};

use super::{Download, Settings, open_repo};
use crate::cli::GlobalArgs;

/// Arguments for the add-download command.
#[derive(Debug, Args)]
pub struct AddDownloadArgs {
    /// File to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// Description shown next to the link
    #[arg(short, long)]
    pub description: String,

    /// Release tag (defaults to the version tag at HEAD)
    #[arg(long, env = "CI_COMMIT_TAG")]
    pub tag: Option<String>,
}

/// Runs the add-download command.
pub fn run(global: &GlobalArgs, args: AddDownloadArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let download = Download::new(&args.file, args.description);
    let uploads = settings.download_actions(std::slice::from_ref(&download))?;

    let tag_name = match args.tag {
        Some(tag) => tag,
        None => open_repo()?
            .tag_at_head(settings.tag_prefix())
            .context("failed to read tags")?
            .context("no release tag at HEAD; pass --tag")?,
    };
    let client = settings.gitlab_client()?;

    let mut actions = vec![Action::Check, Action::GetTag(GetTag::new(&tag_name))];
    actions.extend(uploads);

    let ctx = settings.run_workflow(&client, actions)?;
    match ctx.upload(&download.path) {
        Some(upload) => println!("Added {} to {tag_name}: {}", download.name(), upload.url),
        None => println!("Added {} to {tag_name}", download.name()),
    }
    Ok(())
}
