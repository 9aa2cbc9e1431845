//! Configuration schema.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Version computation.
    #[serde(default)]
    pub version: VersionConfig,

    /// Pre-release identifier templates.
    #[serde(default)]
    pub prerelease: PrereleaseConfig,

    /// Changelog and release note output.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Release API access.
    #[serde(default)]
    pub gitlab: GitlabConfig,

    /// Retry policy of the action executor.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl Config {
    /// Checks values that deserialize fine but make no sense.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.version.tag_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "version.tag_prefix",
                reason: "must not contain whitespace".to_string(),
            });
        }
        if self.version.release_branches.is_empty() {
            return Err(ConfigError::Invalid {
                field: "version.release_branches",
                reason: "at least one release branch is required".to_string(),
            });
        }
        if self.prerelease.pre_templates.is_empty() {
            return Err(ConfigError::Invalid {
                field: "prerelease.pre_templates",
                reason: "at least one pre-release template is required".to_string(),
            });
        }
        if self.gitlab.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "gitlab.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Version configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConfig {
    /// Tag prefix (e.g., "v").
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Commit types that trigger a patch bump.
    #[serde(default = "default_patch_types")]
    pub patch_types: Vec<String>,

    /// Commit types that trigger a minor bump.
    #[serde(default = "default_minor_types")]
    pub minor_types: Vec<String>,

    /// Keep breaking changes below 1.0.0 on the minor component.
    #[serde(default = "default_true")]
    pub initial_development: bool,

    /// Branches that produce final releases.
    #[serde(default = "default_release_branches")]
    pub release_branches: Vec<String>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            tag_prefix: default_tag_prefix(),
            patch_types: default_patch_types(),
            minor_types: default_minor_types(),
            initial_development: true,
            release_branches: default_release_branches(),
        }
    }
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

fn default_patch_types() -> Vec<String> {
    ["fix", "refactor", "perf", "docs", "style", "test"]
        .map(String::from)
        .to_vec()
}

fn default_minor_types() -> Vec<String> {
    vec!["feat".to_string()]
}

fn default_release_branches() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn default_true() -> bool {
    true
}

/// Pre-release configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrereleaseConfig {
    /// One template per pre-release identifier.
    #[serde(default = "default_pre_templates")]
    pub pre_templates: Vec<String>,

    /// One template per build metadata identifier.
    #[serde(default)]
    pub build_templates: Vec<String>,
}

impl Default for PrereleaseConfig {
    fn default() -> Self {
        Self {
            pre_templates: default_pre_templates(),
            build_templates: Vec::new(),
        }
    }
}

fn default_pre_templates() -> Vec<String> {
    vec![
        r#"{{ env "CI_COMMIT_REF_SLUG" }}"#.to_string(),
        "{{ seq }}".to_string(),
    ]
}

/// Changelog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Changelog file path.
    #[serde(default = "default_changelog_file")]
    pub file: String,

    /// Include commits that did not bump the version.
    #[serde(default)]
    pub list_other_changes: bool,

    /// Message of the version bump commit; `{{tag}}` is replaced.
    #[serde(default = "default_bump_commit_template")]
    pub bump_commit_template: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            file: default_changelog_file(),
            list_other_changes: false,
            bump_commit_template: default_bump_commit_template(),
        }
    }
}

fn default_changelog_file() -> String {
    "CHANGELOG.md".to_string()
}

fn default_bump_commit_template() -> String {
    "chore: version bump for {{tag}} [skip ci]".to_string()
}

/// Release API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitlabConfig {
    /// API base URL.
    pub api_url: Option<String>,

    /// Project id or `namespace/path`.
    pub project: Option<String>,

    /// Web URL of the project, used to absolutize upload links.
    pub project_url: Option<String>,

    /// Use the Releases API instead of tag release descriptions.
    #[serde(default = "default_true")]
    pub releases_api: bool,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub skip_ssl_verify: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            project: None,
            project_url: None,
            releases_api: true,
            skip_ssl_verify: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    90
}

/// Executor retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Seconds to wait between attempts.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version.tag_prefix, "v");
        assert_eq!(config.version.minor_types, vec!["feat"]);
        assert_eq!(config.version.patch_types.len(), 6);
        assert!(config.version.initial_development);
        assert_eq!(config.version.release_branches, vec!["main", "master"]);
        assert_eq!(config.changelog.file, "CHANGELOG.md");
        assert!(config.gitlab.releases_api);
        assert_eq!(config.gitlab.timeout_secs, 90);
        assert_eq!(config.workflow.retry_count, 3);
        assert_eq!(config.workflow.retry_delay_secs, 10);
    }

    #[test]
    fn test_default_prerelease_templates() {
        let config = PrereleaseConfig::default();
        assert_eq!(
            config.pre_templates,
            vec![r#"{{ env "CI_COMMIT_REF_SLUG" }}"#, "{{ seq }}"]
        );
        assert!(config.build_templates.is_empty());
    }

    #[test]
    fn test_deserialize_empty_matches_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_deserialize_partial_section() {
        let toml = r#"
            [version]
            tag_prefix = "release-"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.version.tag_prefix, "release-");
        assert_eq!(config.version.minor_types, vec!["feat"]);
        assert!(config.version.initial_development);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            [version]
            tag_prefix = ""
            patch_types = ["fix"]
            minor_types = ["feat", "perf"]
            initial_development = false
            release_branches = ["trunk"]

            [prerelease]
            pre_templates = ["rc", "{{ seq }}"]
            build_templates = ["{{ commit_ts }}"]

            [changelog]
            file = "HISTORY.md"
            list_other_changes = true
            bump_commit_template = "release {{tag}}"

            [gitlab]
            api_url = "https://gitlab.example.com"
            project = "group/app"
            project_url = "https://gitlab.example.com/group/app"
            releases_api = false
            skip_ssl_verify = true
            timeout_secs = 30

            [workflow]
            retry_count = 5
            retry_delay_secs = 1
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.version.tag_prefix, "");
        assert_eq!(config.version.minor_types, vec!["feat", "perf"]);
        assert!(!config.version.initial_development);
        assert_eq!(config.prerelease.pre_templates, vec!["rc", "{{ seq }}"]);
        assert_eq!(config.changelog.file, "HISTORY.md");
        assert!(config.changelog.list_other_changes);
        assert_eq!(config.gitlab.project.as_deref(), Some("group/app"));
        assert!(!config.gitlab.releases_api);
        assert!(config.gitlab.skip_ssl_verify);
        assert_eq!(config.workflow.retry_count, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_whitespace_prefix() {
        let mut config = Config::default();
        config.version.tag_prefix = "v ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "version.tag_prefix",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.gitlab.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_no_release_branches() {
        let mut config = Config::default();
        config.version.release_branches.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_pre_templates() {
        let config: Config = toml::from_str("[prerelease]\npre_templates = []\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "prerelease.pre_templates",
                ..
            })
        ));
    }
}
