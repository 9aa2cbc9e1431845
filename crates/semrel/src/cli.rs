//! CLI definition.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands;

/// Compute the next semantic version from commits and publish GitLab releases.
#[derive(Debug, Parser)]
#[command(name = "semrel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command; they override `semrel.toml`.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// GitLab API token
    #[arg(long, global = true, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitLab API URL
    #[arg(long = "gl-api", global = true, env = "CI_API_V4_URL")]
    pub api_url: Option<String>,

    /// GitLab project id or path
    #[arg(long, global = true, env = "CI_PROJECT_PATH")]
    pub project: Option<String>,

    /// GitLab project web URL
    #[arg(long, global = true, env = "CI_PROJECT_URL")]
    pub project_url: Option<String>,

    /// Current branch (defaults to the checked out branch)
    #[arg(long, global = true, env = "CI_COMMIT_REF_NAME")]
    pub branch: Option<String>,

    /// Prefix of version tags
    #[arg(long, global = true)]
    pub tag_prefix: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub skip_ssl_verify: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the next version
    NextVersion(commands::next_version::NextVersionArgs),

    /// Add a release entry to the changelog file
    Changelog(commands::changelog::ChangelogArgs),

    /// Create the release tag with its release note
    Tag(commands::tag::TagArgs),

    /// Commit files to the branch and tag the new commit
    CommitAndTag(commands::commit_and_tag::CommitAndTagArgs),

    /// Upload a file and link it to the release
    AddDownload(commands::add_download::AddDownloadArgs),

    /// Check access to the GitLab API
    TestApi,
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        let global = self.global;
        match self.command {
            Commands::NextVersion(args) => commands::next_version::run(&global, &args),
            Commands::Changelog(args) => commands::changelog::run(&global, &args),
            Commands::Tag(args) => commands::tag::run(&global, args),
            Commands::CommitAndTag(args) => commands::commit_and_tag::run(&global, &args),
            Commands::AddDownload(args) => commands::add_download::run(&global, args),
            Commands::TestApi => commands::test_api::run(&global),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bump_patch_conflicts_with_allow_current() {
        let result = Cli::try_parse_from([
            "semrel",
            "next-version",
            "--bump-patch",
            "--allow-current",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "semrel",
            "test-api",
            "--project",
            "group/app",
            "--tag-prefix",
            "release-",
        ])
        .unwrap();
        assert_eq!(cli.global.project.as_deref(), Some("group/app"));
        assert_eq!(cli.global.tag_prefix.as_deref(), Some("release-"));
        assert!(matches!(cli.command, Commands::TestApi));
    }
}
