//! Configuration loader.

use std::path::Path;

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "releasekit.toml";

/// Legacy JSON configuration file name, looked for after [`CONFIG_FILE_NAME`].
pub const LEGACY_CONFIG_FILE_NAME: &str = "config.json";

/// Starting point written by `releasekit init`.
pub const CONFIG_TEMPLATE: &str = r#"# releasekit configuration

username = ""
email = ""
# Prefer RELEASEKIT_ACCESS_TOKEN over storing the token here.
accesstoken = ""
git_repo = ""
gpg_fingerprint = ""

workdir = "./repo"
tag_prefix = "v"

[changelog]
path = "CHANGELOG.md"
# major, minor or patch
bump = "patch"
# prepend keeps the history, fragment keeps only the last two headers
advance = "prepend"

[builder]
program = "goreleaser"
args = ["release", "--rm-dist"]
dist_dir = "dist"
token_env = "GITHUB_TOKEN"
fingerprint_env = "GPG_FINGERPRINT"

[tidy]
enabled = true
program = "go"
args = ["mod", "tidy"]
"#;

/// Loads configuration from the given path.
///
/// Files ending in `.json` are read as JSON, anything else as TOML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    debug!(?path, "loading configuration");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: Config = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };

    Ok(config)
}

/// Finds and loads configuration from the current directory or parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found or it cannot be parsed.
pub fn find_and_load_config() -> ConfigResult<Config> {
    let current_dir = std::env::current_dir()?;
    find_and_load_config_from(&current_dir)
}

/// Finds and loads configuration starting from the given directory.
///
/// Walks up the directory tree until a configuration file is found. In each
/// directory [`CONFIG_FILE_NAME`] wins over [`LEGACY_CONFIG_FILE_NAME`].
///
/// # Errors
///
/// Returns an error if no configuration file is found or it cannot be parsed.
pub fn find_and_load_config_from(start_dir: impl AsRef<Path>) -> ConfigResult<Config> {
    let start_dir = start_dir.as_ref();
    let mut dir = start_dir;

    loop {
        for name in [CONFIG_FILE_NAME, LEGACY_CONFIG_FILE_NAME] {
            let config_path = dir.join(name);
            if config_path.exists() {
                return load_config(config_path);
            }
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }

    Err(ConfigError::NotFound(start_dir.join(CONFIG_FILE_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_name() {
        assert_eq!(CONFIG_FILE_NAME, "releasekit.toml");
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        let defaults = Config::default();

        assert_eq!(config.workdir, defaults.workdir);
        assert_eq!(config.tag_prefix, defaults.tag_prefix);
        assert_eq!(config.changelog.bump, defaults.changelog.bump);
        assert_eq!(config.builder.args, defaults.builder.args);
        assert_eq!(config.tidy.args, defaults.tidy.args);
    }

    #[test]
    fn test_load_config_not_found() {
        let result = load_config("/nonexistent/path/releasekit.toml");
        match result {
            Err(ConfigError::NotFound(path)) => {
                assert!(path.to_string_lossy().contains("releasekit.toml"));
            }
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_load_config_valid() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("releasekit.toml");
        fs::write(
            &config_path,
            r#"
            username = "octo"
            git_repo = "https://github.com/octo/app.git"
        "#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.username, "octo");
        assert_eq!(config.git_repo, "https://github.com/octo/app.git");
    }

    #[test]
    fn test_load_config_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("releasekit.toml");
        fs::write(&config_path, "").unwrap();

        // Default values should be used
        let config = load_config(&config_path).unwrap();
        assert_eq!(config.changelog.path, "CHANGELOG.md");
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("releasekit.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = load_config(&config_path);
        assert!(matches!(result, Err(ConfigError::InvalidToml(_))));
    }

    #[test]
    fn test_load_config_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"username": "octo", "email": "octo@example.com", "accesstoken": "ghp_x"}"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.username, "octo");
        assert_eq!(config.accesstoken, "ghp_x");
        assert_eq!(config.workdir, "./repo");
    }

    #[test]
    fn test_load_config_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ not json").unwrap();

        let result = load_config(&config_path);
        assert!(matches!(result, Err(ConfigError::InvalidJson(_))));
    }

    #[test]
    fn test_find_and_load_config_in_temp_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("releasekit.toml"),
            "username = \"here\"\n",
        )
        .unwrap();

        let config = find_and_load_config_from(temp_dir.path()).unwrap();
        assert_eq!(config.username, "here");
    }

    #[test]
    fn test_find_and_load_config_in_parent() {
        let parent_dir = TempDir::new().unwrap();
        fs::write(
            parent_dir.path().join("releasekit.toml"),
            "username = \"parent\"\n",
        )
        .unwrap();

        let child_dir = parent_dir.path().join("subdir");
        fs::create_dir(&child_dir).unwrap();

        let config = find_and_load_config_from(&child_dir).unwrap();
        assert_eq!(config.username, "parent");
    }

    #[test]
    fn test_find_prefers_toml_over_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("releasekit.toml"),
            "username = \"toml\"\n",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("config.json"),
            r#"{"username": "json"}"#,
        )
        .unwrap();

        let config = find_and_load_config_from(temp_dir.path()).unwrap();
        assert_eq!(config.username, "toml");
    }

    #[test]
    fn test_find_falls_back_to_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("config.json"),
            r#"{"username": "json"}"#,
        )
        .unwrap();

        let config = find_and_load_config_from(temp_dir.path()).unwrap();
        assert_eq!(config.username, "json");
    }
}
