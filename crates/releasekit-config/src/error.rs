//! Configuration error types.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    NotFound(std::path::PathBuf),

    /// Invalid TOML syntax.
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// Invalid JSON syntax.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_config;
    use std::fs;
    use tempfile::TempDir;

    fn load(name: &str, content: &str) -> ConfigError {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(name);
        fs::write(&path, content).unwrap();
        load_config(&path).unwrap_err()
    }

    #[test]
    fn test_json_syntax_error() {
        let err = load("config.json", "{\n  \"username\": \"octo\",\n");
        assert!(matches!(err, ConfigError::InvalidJson(_)));
        assert!(err.to_string().starts_with("invalid JSON: "));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_json_type_error_names_field() {
        let err = load("config.json", r#"{"username": 5}"#);
        assert!(matches!(err, ConfigError::InvalidJson(_)));
        assert!(err.to_string().contains("invalid type: integer `5`"));
    }

    #[test]
    fn test_uppercase_json_extension_uses_json() {
        let err = load("CONFIG.JSON", "username = \"octo\"\n");
        assert!(matches!(err, ConfigError::InvalidJson(_)));
    }

    #[test]
    fn test_toml_error_for_other_extensions() {
        let err = load("releasekit.toml", r#"{"username": "octo"}"#);
        assert!(matches!(err, ConfigError::InvalidToml(_)));
        assert!(err.to_string().starts_with("invalid TOML: "));
    }

    #[test]
    fn test_unreadable_path_is_io() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("releasekit.toml");
        fs::create_dir(&dir).unwrap();

        let err = load_config(&dir).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }
}
