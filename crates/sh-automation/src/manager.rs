//! Scenario management
//!
//! The ScenarioManager owns every scenario and persists them, together with
//! their actions, to two files. Loading is split so that actions can be
//! checked against the device arena before they are attached.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use sh_core::DeviceStore;
use sh_registries::codec::CodecError;
use sh_registries::{Loaded, RejectedLine, Storage, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::action::{encode_action, ActionRecord, Command, ScenarioAction};
use crate::scenario::{AutomationScenario, ScenarioRun};

/// Automation errors
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Scenario not found: {0}")]
    NotFound(String),

    #[error("Action {action_id} not found in scenario {scenario_id}")]
    ActionNotFound {
        scenario_id: String,
        action_id: String,
    },

    #[error("Scenario with ID {0} already exists")]
    DuplicateId(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Manages all scenarios
pub struct ScenarioManager {
    storage: Arc<Storage>,

    /// All scenarios by ID, in creation order
    scenarios: IndexMap<String, AutomationScenario>,

    /// Ids of removed scenarios; never handed out again
    retired: HashSet<String>,
}

impl ScenarioManager {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            scenarios: IndexMap::new(),
            retired: HashSet::new(),
        }
    }

    /// Load scenarios (without actions) from storage, replacing the current set
    pub fn load(&mut self) -> AutomationResult<Vec<RejectedLine>> {
        let loaded = self.storage.load::<AutomationScenario>()?;
        let mut rejected = loaded.rejected;

        self.scenarios.clear();
        for (line, scenario) in loaded.records {
            if self.scenarios.contains_key(&scenario.id) {
                warn!("Skipping {}:{}: duplicate id '{}'", crate::scenario::STORAGE_KEY, line, scenario.id);
                rejected.push(RejectedLine {
                    file: crate::scenario::STORAGE_KEY,
                    line,
                    error: CodecError::DuplicateId(scenario.id.clone()),
                });
                continue;
            }
            info!("Loaded scenario: {} ({})", scenario.name, scenario.id);
            self.scenarios.insert(scenario.id.clone(), scenario);
        }
        Ok(rejected)
    }

    /// Decode the actions file without attaching anything
    pub fn load_actions(&self) -> AutomationResult<Loaded<ActionRecord>> {
        Ok(self.storage.load::<ActionRecord>()?)
    }

    /// Attach a loaded action to the end of its scenario
    pub fn attach_action(&mut self, record: ActionRecord) -> AutomationResult<()> {
        let scenario = self
            .scenarios
            .get_mut(&record.scenario_id)
            .ok_or_else(|| AutomationError::NotFound(record.scenario_id.clone()))?;
        scenario.push_action(record.action);
        Ok(())
    }

    /// Save scenarios and their actions
    pub fn save(&self) -> AutomationResult<()> {
        self.storage.save(self.scenarios.values())?;
        let actions = self.scenarios.values().flat_map(|scenario| {
            scenario
                .actions()
                .iter()
                .map(|action| encode_action(&scenario.id, action))
        });
        let count = self
            .storage
            .write_lines(crate::action::STORAGE_KEY, actions)?;
        debug!("Saved {} scenarios, {} actions", self.scenarios.len(), count);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&AutomationScenario> {
        self.scenarios.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut AutomationScenario> {
        self.scenarios.get_mut(id)
    }

    fn require_mut(&mut self, id: &str) -> AutomationResult<&mut AutomationScenario> {
        self.scenarios
            .get_mut(id)
            .ok_or_else(|| AutomationError::NotFound(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AutomationScenario> + '_ {
        self.scenarios.values()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenarios.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.iter().filter(|s| s.is_active()).count()
    }

    /// Next free scenario id of the form `SC<n>`, skipping removed ids
    pub fn next_id(&self) -> String {
        let highest = self
            .scenarios
            .keys()
            .chain(&self.retired)
            .filter_map(|id| id.strip_prefix("SC")?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("SC{}", highest + 1)
    }

    /// Add a new scenario
    pub fn add(&mut self, scenario: AutomationScenario) -> AutomationResult<String> {
        let id = scenario.id.clone();
        if self.scenarios.contains_key(&id) {
            return Err(AutomationError::DuplicateId(id));
        }
        info!("Added scenario: {} ({})", scenario.name, id);
        self.scenarios.insert(id.clone(), scenario);
        Ok(id)
    }

    /// Remove a scenario and its actions
    pub fn remove(&mut self, id: &str) -> AutomationResult<AutomationScenario> {
        let scenario = self
            .scenarios
            .shift_remove(id)
            .ok_or_else(|| AutomationError::NotFound(id.to_string()))?;
        self.retired.insert(id.to_string());
        info!("Removed scenario: {} ({})", scenario.name, id);
        Ok(scenario)
    }

    pub fn activate(&mut self, id: &str) -> AutomationResult<()> {
        self.require_mut(id)?.activate();
        Ok(())
    }

    pub fn deactivate(&mut self, id: &str) -> AutomationResult<()> {
        self.require_mut(id)?.deactivate();
        Ok(())
    }

    /// Flip the activation flag; returns the new state
    pub fn toggle(&mut self, id: &str) -> AutomationResult<bool> {
        let scenario = self.require_mut(id)?;
        if scenario.is_active() {
            scenario.deactivate();
        } else {
            scenario.activate();
        }
        Ok(scenario.is_active())
    }

    /// Append an action to a scenario; returns the new action id
    pub fn add_action(
        &mut self,
        scenario_id: &str,
        device_id: Option<String>,
        command: Command,
    ) -> AutomationResult<String> {
        let action_id = self.require_mut(scenario_id)?.add_action(device_id, command);
        debug!("Added action {} to scenario {}", action_id, scenario_id);
        Ok(action_id)
    }

    pub fn remove_action(&mut self, scenario_id: &str, action_id: &str) -> AutomationResult<ScenarioAction> {
        self.require_mut(scenario_id)?
            .remove_action(action_id)
            .ok_or_else(|| AutomationError::ActionNotFound {
                scenario_id: scenario_id.to_string(),
                action_id: action_id.to_string(),
            })
    }

    /// Execute a scenario against the device arena
    pub fn execute<S: DeviceStore + ?Sized>(&mut self, id: &str, store: &mut S) -> AutomationResult<ScenarioRun> {
        Ok(self.require_mut(id)?.execute(store))
    }

    /// Scenarios with at least one action targeting the device
    pub fn referencing_device(&self, device_id: &str) -> Vec<&AutomationScenario> {
        self.iter().filter(|s| s.references_device(device_id)).collect()
    }
}
