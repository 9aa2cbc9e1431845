//! Test-api command.

use anyhow::Result;
use semrel_workflow::Action;

use super::Settings;
use crate::cli::GlobalArgs;

/// Runs the test-api command.
pub fn run(global: &GlobalArgs) -> Result<()> {
    let settings = Settings::load(global)?;
    let client = settings.gitlab_client()?;
    settings.run_workflow(&client, vec![Action::Check])?;
    println!("GitLab API access OK ({})", client.base_url());
    Ok(())
}
