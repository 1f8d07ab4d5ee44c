//! Configuration management for releasekit.
//!
//! This crate handles loading and validating `releasekit.toml`, or the legacy
//! `config.json` layout.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, CONFIG_TEMPLATE, LEGACY_CONFIG_FILE_NAME, find_and_load_config,
    find_and_load_config_from, load_config,
};
pub use schema::{AdvanceKind, BuilderConfig, BumpKind, ChangelogConfig, Config, TidyConfig};
