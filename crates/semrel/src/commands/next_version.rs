//! Next-version command.

use anyhow::{Result, bail};
use clap::Args;

use super::{Settings, open_repo};
use crate::cli::GlobalArgs;

/// Arguments for the next-version command.
#[derive(Debug, Args)]
pub struct NextVersionArgs {
    /// Release a patch even when no commit requires one
    #[arg(long, conflicts_with = "allow_current")]
    pub bump_patch: bool,

    /// Print the current version when there is nothing to release
    #[arg(long)]
    pub allow_current: bool,
}

/// Runs the next-version command.
pub fn run(global: &GlobalArgs, args: &NextVersionArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let repo = open_repo()?;
    let release = settings.prepare_release(&repo, args.bump_patch)?;

    if release.has_content() {
        println!("{}", release.version().next());
    } else if args.allow_current {
        println!("{}", release.version().current());
    } else {
        bail!("no changes detected");
    }
    Ok(())
}
