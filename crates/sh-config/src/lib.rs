//! Smart Home Configuration
//!
//! This crate handles loading `configuration.yaml` with support for:
//! - `!include` tags for splitting configuration across files
//! - `!env_var` tags for environment variable substitution
//!
//! The processed YAML is then deserialized into [`HomeConfig`], where every
//! section is optional and falls back to its defaults.

mod error;
mod home_config;
mod loader;

pub use error::{ConfigError, ConfigResult};
pub use home_config::{
    EnergyConfig, HomeConfig, HomeSection, LoggerConfig, StorageConfig, CONFIG_FILE,
};
// Processed YAML handed to `HomeConfig::from_yaml`
pub use serde_yaml::Value;
