//! Configuration schema.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Main configuration structure.
///
/// The flat keys match the legacy `config.json` layout, so both formats share
/// one schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote username; also the commit author name.
    #[serde(default)]
    pub username: String,

    /// Commit author email.
    #[serde(default)]
    pub email: String,

    /// Access token for the remote and the release builder.
    #[serde(default)]
    pub accesstoken: String,

    /// Repository URL to release from.
    #[serde(default)]
    pub git_repo: String,

    /// Signing key fingerprint handed to the release builder.
    #[serde(default)]
    pub gpg_fingerprint: String,

    /// Directory the working copy lives in.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Prefix prepended to the version in tag names.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Changelog configuration.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Release builder configuration.
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Dependency tidy configuration.
    #[serde(default)]
    pub tidy: TidyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            accesstoken: String::new(),
            git_repo: String::new(),
            gpg_fingerprint: String::new(),
            workdir: default_workdir(),
            tag_prefix: default_tag_prefix(),
            changelog: ChangelogConfig::default(),
            builder: BuilderConfig::default(),
            tidy: TidyConfig::default(),
        }
    }
}

impl Config {
    /// Checks that the keys a release run needs are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming every missing key.
    pub fn validate_for_release(&self) -> ConfigResult<()> {
        let missing: Vec<&str> = [
            ("git_repo", &self.git_repo),
            ("username", &self.username),
            ("email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "missing required key(s): {}",
                missing.join(", ")
            )))
        }
    }
}

fn default_workdir() -> String {
    "./repo".to_string()
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

/// Which version component a release advances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
    Major,
    Minor,
    #[default]
    Patch,
}

/// How the next unreleased entry is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceKind {
    /// Replace the file with the new and previous headers, dropping the
    /// release notes.
    Fragment,
    /// Insert the new header above the existing history.
    #[default]
    Prepend,
}

/// Changelog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Changelog path, relative to the working copy.
    #[serde(default = "default_changelog_path")]
    pub path: String,

    /// Component bumped when opening the next version.
    #[serde(default)]
    pub bump: BumpKind,

    /// How the next version is written.
    #[serde(default)]
    pub advance: AdvanceKind,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: default_changelog_path(),
            bump: BumpKind::default(),
            advance: AdvanceKind::default(),
        }
    }
}

fn default_changelog_path() -> String {
    "CHANGELOG.md".to_string()
}

/// Release builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Builder program.
    #[serde(default = "default_builder_program")]
    pub program: String,

    /// Builder arguments.
    #[serde(default = "default_builder_args")]
    pub args: Vec<String>,

    /// Output directory, cleaned before and after the build.
    #[serde(default = "default_dist_dir")]
    pub dist_dir: String,

    /// Environment variable the access token is passed in.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Environment variable the signing fingerprint is passed in.
    #[serde(default = "default_fingerprint_env")]
    pub fingerprint_env: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            program: default_builder_program(),
            args: default_builder_args(),
            dist_dir: default_dist_dir(),
            token_env: default_token_env(),
            fingerprint_env: default_fingerprint_env(),
        }
    }
}

fn default_builder_program() -> String {
    "goreleaser".to_string()
}

fn default_builder_args() -> Vec<String> {
    vec!["release".to_string(), "--rm-dist".to_string()]
}

fn default_dist_dir() -> String {
    "dist".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_fingerprint_env() -> String {
    "GPG_FINGERPRINT".to_string()
}

/// Dependency tidy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TidyConfig {
    /// Whether to run the tidy step.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tidy program.
    #[serde(default = "default_tidy_program")]
    pub program: String,

    /// Tidy arguments.
    #[serde(default = "default_tidy_args")]
    pub args: Vec<String>,
}

impl Default for TidyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_tidy_program(),
            args: default_tidy_args(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tidy_program() -> String {
    "go".to_string()
}

fn default_tidy_args() -> Vec<String> {
    vec!["mod".to_string(), "tidy".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.username.is_empty());
        assert_eq!(config.workdir, "./repo");
        assert_eq!(config.tag_prefix, "v");
    }

    #[test]
    fn test_default_changelog_config() {
        let config = ChangelogConfig::default();
        assert_eq!(config.path, "CHANGELOG.md");
        assert_eq!(config.bump, BumpKind::Patch);
        assert_eq!(config.advance, AdvanceKind::Prepend);
    }

    #[test]
    fn test_default_builder_config() {
        let config = BuilderConfig::default();
        assert_eq!(config.program, "goreleaser");
        assert_eq!(config.args, vec!["release", "--rm-dist"]);
        assert_eq!(config.dist_dir, "dist");
        assert_eq!(config.token_env, "GITHUB_TOKEN");
        assert_eq!(config.fingerprint_env, "GPG_FINGERPRINT");
    }

    #[test]
    fn test_default_tidy_config() {
        let config = TidyConfig::default();
        assert!(config.enabled);
        assert_eq!(config.program, "go");
        assert_eq!(config.args, vec!["mod", "tidy"]);
    }

    #[test]
    fn test_deserialize_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.workdir, "./repo");
        assert_eq!(config.changelog.path, "CHANGELOG.md");
        assert!(config.tidy.enabled);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            username = "octo"
            email = "octo@example.com"
            accesstoken = "ghp_x"
            git_repo = "https://github.com/octo/app.git"
            gpg_fingerprint = "ABCD1234"
            workdir = "build/repo"
            tag_prefix = "release-"

            [changelog]
            path = "docs/CHANGES.md"
            bump = "minor"
            advance = "fragment"

            [builder]
            program = "make"
            args = ["dist"]
            dist_dir = "out"
            token_env = "TOKEN"
            fingerprint_env = "KEY"

            [tidy]
            enabled = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.username, "octo");
        assert_eq!(config.accesstoken, "ghp_x");
        assert_eq!(config.gpg_fingerprint, "ABCD1234");
        assert_eq!(config.workdir, "build/repo");
        assert_eq!(config.tag_prefix, "release-");
        assert_eq!(config.changelog.path, "docs/CHANGES.md");
        assert_eq!(config.changelog.bump, BumpKind::Minor);
        assert_eq!(config.changelog.advance, AdvanceKind::Fragment);
        assert_eq!(config.builder.program, "make");
        assert_eq!(config.builder.args, vec!["dist"]);
        assert_eq!(config.builder.dist_dir, "out");
        assert_eq!(config.builder.token_env, "TOKEN");
        assert_eq!(config.builder.fingerprint_env, "KEY");
        assert!(!config.tidy.enabled);
        assert_eq!(config.tidy.program, "go");
    }

    #[test]
    fn test_deserialize_legacy_json() {
        let json = r#"{
            "username": "octo",
            "email": "octo@example.com",
            "accesstoken": "ghp_x",
            "git_repo": "https://github.com/octo/app.git",
            "gpg_fingerprint": "ABCD1234"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.username, "octo");
        assert_eq!(config.git_repo, "https://github.com/octo/app.git");
        assert_eq!(config.builder.program, "goreleaser");
    }

    #[test]
    fn test_deserialize_unknown_bump() {
        let result: Result<Config, _> = toml::from_str("[changelog]\nbump = \"huge\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_for_release_ok() {
        let config = Config {
            username: "octo".to_string(),
            email: "octo@example.com".to_string(),
            git_repo: "https://github.com/octo/app.git".to_string(),
            ..Config::default()
        };
        assert!(config.validate_for_release().is_ok());
    }

    #[test]
    fn test_validate_for_release_lists_missing_keys() {
        let config = Config {
            username: "octo".to_string(),
            email: "  ".to_string(),
            ..Config::default()
        };

        let err = config.validate_for_release().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: missing required key(s): git_repo, email"
        );
    }

    #[test]
    fn test_serialize_config() {
        let toml = toml::to_string(&Config::default()).unwrap();
        assert!(toml.contains("tag_prefix = \"v\""));
        assert!(toml.contains("[changelog]"));
        assert!(toml.contains("advance = \"prepend\""));
        assert!(toml.contains("fingerprint_env = \"GPG_FINGERPRINT\""));
    }
}
