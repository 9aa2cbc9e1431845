//! Locating and reading `semrel.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "semrel.toml";

/// Returns the nearest `semrel.toml` in `start_dir` or one of its parents.
#[must_use]
pub fn locate_config(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    start_dir
        .as_ref()
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Reads, parses and validates the file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] for a missing file, or an error if it
/// cannot be read, parsed or validated.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content).map_err(|source| ConfigError::InvalidToml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;

    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Loads the nearest configuration file above `start_dir`.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] when there is none, or the error of
/// [`load_config`].
pub fn find_and_load_config_from(start_dir: impl AsRef<Path>) -> ConfigResult<Config> {
    let start_dir = start_dir.as_ref();
    match locate_config(start_dir) {
        Some(path) => load_config(path),
        None => Err(ConfigError::NotFound(start_dir.join(CONFIG_FILE_NAME))),
    }
}

/// Like [`find_and_load_config_from`], but no file means defaults.
///
/// # Errors
///
/// Returns an error if a configuration file exists but is invalid.
pub fn load_config_or_default(start_dir: impl AsRef<Path>) -> ConfigResult<Config> {
    let Some(path) = locate_config(&start_dir) else {
        debug!(start = %start_dir.as_ref().display(), "no configuration file, using defaults");
        return Ok(Config::default());
    };
    load_config(path)
}
