//! Configuration management for semrel.
//!
//! This crate handles loading the `semrel.toml` configuration file.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, find_and_load_config_from, load_config, load_config_or_default,
    locate_config,
};
pub use schema::{
    ChangelogConfig, Config, GitlabConfig, PrereleaseConfig, VersionConfig, WorkflowConfig,
};
