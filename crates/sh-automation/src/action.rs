//! Scenario actions
//!
//! An action binds one command to one target device by id. The device is
//! looked up at execution time, so an action whose device has been removed
//! stays in its scenario and reports "not found" when run.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sh_core::{DeviceStore, NULL_REF};
use sh_registries::codec::{encode_ref, join_fields, CodecError, CodecResult, FieldReader};
use sh_registries::Record;
use tracing::{debug, warn};

/// Data file for scenario actions
pub const STORAGE_KEY: &str = "actions.dat";

/// Command understood by scenario actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Command {
    TurnOn,
    TurnOff,
    /// Anything else; kept so it round-trips, reported when executed
    Unknown(String),
}

impl Command {
    pub fn parse(value: &str) -> Self {
        match value {
            "turnOn" => Command::TurnOn,
            "turnOff" => Command::TurnOff,
            other => Command::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Command::TurnOn => "turnOn",
            Command::TurnOff => "turnOff",
            Command::Unknown(other) => other,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Command {
    fn from(value: String) -> Self {
        Command::parse(&value)
    }
}

impl From<Command> for String {
    fn from(command: Command) -> Self {
        command.as_str().to_string()
    }
}

/// What happened when one action ran
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied {
        action_id: String,
        device_id: String,
        command: Command,
    },
    DeviceNotFound {
        action_id: String,
        device_id: Option<String>,
    },
    UnknownCommand {
        action_id: String,
        command: String,
    },
}

impl ActionOutcome {
    pub fn action_id(&self) -> &str {
        match self {
            ActionOutcome::Applied { action_id, .. }
            | ActionOutcome::DeviceNotFound { action_id, .. }
            | ActionOutcome::UnknownCommand { action_id, .. } => action_id,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied { .. })
    }
}

/// One command bound to one target device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAction {
    pub id: String,

    /// Target device (lookup only); None when the record names no device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    pub command: Command,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, String>,
}

impl ScenarioAction {
    pub fn new(id: impl Into<String>, device_id: Option<String>, command: Command) -> Self {
        Self {
            id: id.into(),
            device_id,
            command,
            parameters: IndexMap::new(),
        }
    }

    /// Set a parameter; a repeated key keeps its position and takes the new value
    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    /// Short human-readable description
    pub fn description(&self) -> String {
        match &self.device_id {
            Some(device_id) => format!("{} {}", self.command, device_id),
            None => self.command.to_string(),
        }
    }

    /// Run the command against the target device
    ///
    /// Never fails: an unresolvable device or an unknown command is reported
    /// in the outcome and leaves every device untouched.
    pub fn execute<S: DeviceStore + ?Sized>(&self, store: &mut S) -> ActionOutcome {
        let device = match self.device_id.as_deref() {
            Some(device_id) => store.device_mut(device_id),
            None => None,
        };

        let Some(device) = device else {
            warn!(
                "Action {}: device {} not found",
                self.id,
                self.device_id.as_deref().unwrap_or(NULL_REF)
            );
            return ActionOutcome::DeviceNotFound {
                action_id: self.id.clone(),
                device_id: self.device_id.clone(),
            };
        };

        match &self.command {
            Command::TurnOn => device.turn_on(),
            Command::TurnOff => device.turn_off(),
            Command::Unknown(command) => {
                warn!("Action {}: unknown command '{}'", self.id, command);
                return ActionOutcome::UnknownCommand {
                    action_id: self.id.clone(),
                    command: command.clone(),
                };
            }
        }

        debug!("Action {}: {} on {}", self.id, self.command, device.id);
        ActionOutcome::Applied {
            action_id: self.id.clone(),
            device_id: device.id.clone(),
            command: self.command.clone(),
        }
    }
}

/// Encode an action as stored in the actions file
pub fn encode_action(scenario_id: &str, action: &ScenarioAction) -> String {
    let mut fields = vec![
        scenario_id.to_string(),
        action.id.clone(),
        encode_ref(action.device_id.as_deref()).to_string(),
        action.command.to_string(),
    ];
    fields.extend(
        action
            .parameters
            .iter()
            .map(|(key, value)| format!("{}={}", key, value)),
    );
    join_fields(fields)
}

/// A persisted action together with the scenario it belongs to
///
/// Record format: `scenarioId|actionId|deviceIdOrNULL|command[|key=value]*`.
/// Lines of one scenario appear in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub scenario_id: String,
    pub action: ScenarioAction,
}

impl Record for ActionRecord {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        encode_action(&self.scenario_id, &self.action)
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::new(line, 4, None)?;
        let scenario_id = reader.string();
        let action_id = reader.string();
        let device_id = reader.reference();
        let command = Command::parse(&reader.string());

        let mut action = ScenarioAction::new(action_id, device_id, command);
        for parameter in reader.rest() {
            let (key, value) = parameter
                .split_once('=')
                .ok_or_else(|| CodecError::InvalidEntry {
                    field: "parameter",
                    value: parameter.clone(),
                })?;
            action.add_parameter(key, value);
        }

        Ok(Self {
            scenario_id,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_core::{Device, DeviceKind};

    fn devices() -> Vec<Device> {
        vec![
            Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0),
            Device::new("D2", "Fan", "X", DeviceKind::Actuator, 40.0),
        ]
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("turnOn"), Command::TurnOn);
        assert_eq!(Command::parse("turnOff"), Command::TurnOff);
        assert_eq!(Command::parse("dim"), Command::Unknown("dim".to_string()));
        assert_eq!(Command::Unknown("dim".to_string()).to_string(), "dim");
    }

    #[test]
    fn test_execute_turns_device_on() {
        let mut store = devices();
        let action = ScenarioAction::new("ACT1", Some("D1".to_string()), Command::TurnOn);

        let outcome = action.execute(&mut store);
        assert!(outcome.is_applied());
        assert!(store.device("D1").unwrap().is_on());
    }

    #[test]
    fn test_execute_missing_device() {
        let mut store = devices();
        let action = ScenarioAction::new("ACT1", Some("D9".to_string()), Command::TurnOn);
        assert_eq!(
            action.execute(&mut store),
            ActionOutcome::DeviceNotFound {
                action_id: "ACT1".to_string(),
                device_id: Some("D9".to_string()),
            }
        );

        let unbound = ScenarioAction::new("ACT2", None, Command::TurnOn);
        assert!(matches!(
            unbound.execute(&mut store),
            ActionOutcome::DeviceNotFound { device_id: None, .. }
        ));
    }

    #[test]
    fn test_execute_unknown_command_leaves_device() {
        let mut store = devices();
        let action = ScenarioAction::new("ACT1", Some("D1".to_string()), Command::parse("blink"));

        let outcome = action.execute(&mut store);
        assert_eq!(outcome.action_id(), "ACT1");
        assert!(matches!(outcome, ActionOutcome::UnknownCommand { .. }));
        assert!(!store.device("D1").unwrap().is_on());
    }

    #[test]
    fn test_action_record() {
        let mut action = ScenarioAction::new("ACT1", Some("D1".to_string()), Command::TurnOff);
        action.add_parameter("delay", "5");
        let record = ActionRecord {
            scenario_id: "SC1".to_string(),
            action,
        };

        let line = record.encode();
        assert_eq!(line, "SC1|ACT1|D1|turnOff|delay=5");
        assert_eq!(ActionRecord::decode(&line).unwrap(), record);

        let unbound = ActionRecord::decode("SC1|ACT2|NULL|turnOn").unwrap();
        assert_eq!(unbound.action.device_id, None);
    }

    #[test]
    fn test_action_record_errors() {
        assert!(matches!(
            ActionRecord::decode("SC1|ACT1|D1"),
            Err(CodecError::FieldCount { found: 3, .. })
        ));
        assert!(matches!(
            ActionRecord::decode("SC1|ACT1|D1|turnOn|delay"),
            Err(CodecError::InvalidEntry { field: "parameter", .. })
        ));
    }
}
