//! Typed home configuration
//!
//! Parses `configuration.yaml` into [`HomeConfig`]. Every section and every
//! key is optional.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::read_config;

/// Name of the main configuration file inside the config directory
pub const CONFIG_FILE: &str = "configuration.yaml";

/// The `home:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeSection {
    /// Display name of the home
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for HomeSection {
    fn default() -> Self {
        Self {
            name: default_name(),
        }
    }
}

/// The `storage:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory; relative paths are resolved against the config directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// The `logger:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Default level: trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target level overrides, e.g. `sh_registries: debug`
    #[serde(default)]
    pub logs: BTreeMap<String, String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            logs: BTreeMap::new(),
        }
    }
}

impl LoggerConfig {
    /// Filter directive in `EnvFilter` syntax, e.g. `info,sh_registries=debug`
    pub fn filter_directive(&self) -> String {
        let mut directive = self.default.clone();
        for (target, level) in &self.logs {
            directive.push(',');
            directive.push_str(target);
            directive.push('=');
            directive.push_str(level);
        }
        directive
    }
}

/// The `energy:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Tariff used for cost estimates
    #[serde(default = "default_cost_per_kwh")]
    pub cost_per_kwh: f64,

    /// Length of the period covered by a generated energy report
    #[serde(default = "default_report_period_hours")]
    pub report_period_hours: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            cost_per_kwh: default_cost_per_kwh(),
            report_period_hours: default_report_period_hours(),
        }
    }
}

/// Complete home configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeConfig {
    #[serde(default)]
    pub home: HomeSection,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub energy: EnergyConfig,
}

fn default_name() -> String {
    "Home".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cost_per_kwh() -> f64 {
    0.15
}

fn default_report_period_hours() -> f64 {
    24.0
}

impl HomeConfig {
    /// Load configuration from a config directory
    ///
    /// A missing `configuration.yaml` yields the defaults.
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_dir = config_dir.as_ref();
        let path = config_dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!("No {} in {:?}, using defaults", CONFIG_FILE, config_dir);
            return Ok(Self::default());
        }

        let yaml = read_config(&path)?;
        let config = Self::from_yaml(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a processed YAML value
    pub fn from_yaml(yaml: Value) -> ConfigResult<Self> {
        match yaml {
            // An empty file parses as null
            Value::Null => Ok(Self::default()),
            Value::Mapping(_) => {
                serde_yaml::from_value(yaml).map_err(|e| ConfigError::InvalidValue {
                    key: "root".to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidValue {
                key: "root".to_string(),
                reason: "configuration must be a mapping".to_string(),
            }),
        }
    }

    /// Check value ranges serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.energy.cost_per_kwh.is_finite() || self.energy.cost_per_kwh < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "energy.cost_per_kwh".to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        if !self.energy.report_period_hours.is_finite() || self.energy.report_period_hours <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "energy.report_period_hours".to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Data directory, resolved against the config directory when relative
    pub fn data_path(&self, config_dir: impl AsRef<Path>) -> PathBuf {
        if self.storage.data_dir.is_absolute() {
            self.storage.data_dir.clone()
        } else {
            config_dir.as_ref().join(&self.storage.data_dir)
        }
    }
}
