//! Reading `configuration.yaml`
//!
//! Two tags are expanded while the file is read:
//! - `!include file.yaml` is replaced by the parsed contents of that file,
//!   resolved relative to the file that names it
//! - `!env_var NAME` or `!env_var NAME fallback` is replaced by the value of
//!   the environment variable
//!
//! Other tags pass through so that section parsing reports them.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Read a configuration file and expand its tags
pub(crate) fn read_config(path: &Path) -> ConfigResult<Value> {
    IncludeChain::default().read(path)
}

/// Files currently being read, outermost first
#[derive(Default)]
struct IncludeChain {
    open: Vec<PathBuf>,
}

impl IncludeChain {
    fn read(&mut self, path: &Path) -> ConfigResult<Value> {
        if self.open.iter().any(|open| open == path) {
            return Err(ConfigError::CircularInclude {
                path: path.to_path_buf(),
            });
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::ParseYaml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read config file {:?}", path);

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.open.push(path.to_path_buf());
        let expanded = self.expand(parsed, &base);
        self.open.pop();
        expanded
    }

    fn expand(&mut self, value: Value, base: &Path) -> ConfigResult<Value> {
        match value {
            Value::Mapping(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok::<_, ConfigError>((key, self.expand(value, base)?)))
                .collect::<ConfigResult<Mapping>>()
                .map(Value::Mapping),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.expand(item, base))
                .collect::<ConfigResult<Vec<Value>>>()
                .map(Value::Sequence),
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                if tag == "include" {
                    let file = include_target(value)?;
                    self.read(&base.join(file))
                } else if tag == "env_var" {
                    env_var(value)
                } else {
                    let value = self.expand(value, base)?;
                    Ok(Value::Tagged(Box::new(TaggedValue { tag, value })))
                }
            }
            other => Ok(other),
        }
    }
}

fn include_target(value: Value) -> ConfigResult<String> {
    match value {
        Value::String(file) if !file.trim().is_empty() => Ok(file),
        other => Err(ConfigError::InvalidIncludePath {
            path: format!("{:?}", other),
            reason: "expected a file name".to_string(),
        }),
    }
}

fn env_var(value: Value) -> ConfigResult<Value> {
    let Value::String(arg) = value else {
        return Err(ConfigError::InvalidValue {
            key: "!env_var".to_string(),
            reason: "expected a variable name".to_string(),
        });
    };

    let (name, fallback) = match arg.trim().split_once(char::is_whitespace) {
        Some((name, fallback)) => (name, Some(fallback.trim())),
        None => (arg.trim(), None),
    };

    match (std::env::var(name), fallback) {
        (Ok(set), _) => Ok(Value::String(set)),
        (Err(_), Some(fallback)) => {
            debug!("{} not set, using fallback", name);
            Ok(Value::String(fallback.to_string()))
        }
        (Err(_), None) => Err(ConfigError::EnvVarNotFound {
            var: name.to_string(),
        }),
    }
}
