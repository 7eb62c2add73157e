//! Automation scenarios
//!
//! A scenario is an ordered list of actions with an activation flag.
//!
//! ```text
//! Inactive --activate()--> Active --deactivate()--> Inactive
//! ```
//!
//! Executing an inactive scenario does nothing and says so. Executing an
//! active one runs every action in list order, continuing past actions whose
//! device cannot be found.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sh_core::{DeviceStore, Entity};
use sh_registries::codec::{encode_flag, join_fields, CodecResult, FieldReader};
use sh_registries::Record;
use tracing::info;

use crate::action::{ActionOutcome, Command, ScenarioAction};

/// Data file for scenarios
pub const STORAGE_KEY: &str = "scenarios.dat";

/// Prefix of generated action ids
pub const ACTION_ID_PREFIX: &str = "ACT";

/// Result of executing a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "actions", rename_all = "snake_case")]
pub enum ScenarioRun {
    /// The scenario was inactive; no action ran
    Skipped,
    /// Every action ran, in order
    Completed(Vec<ActionOutcome>),
}

impl ScenarioRun {
    pub fn outcomes(&self) -> &[ActionOutcome] {
        match self {
            ScenarioRun::Skipped => &[],
            ScenarioRun::Completed(outcomes) => outcomes,
        }
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes().iter().filter(|o| o.is_applied()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes().iter().filter(|o| !o.is_applied()).count()
    }
}

/// An ordered, named list of device actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationScenario {
    pub id: String,

    pub name: String,

    /// Free-text trigger time, e.g. "07:30"
    pub trigger_time: String,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,

    is_active: bool,

    actions: Vec<ScenarioAction>,

    /// Highest action number handed out so far
    #[serde(skip)]
    action_seq: u64,
}

impl AutomationScenario {
    /// Create an inactive scenario with no actions
    pub fn new(id: impl Into<String>, name: impl Into<String>, trigger_time: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            trigger_time: trigger_time.into(),
            created_at: Utc::now(),
            last_run: None,
            is_active: false,
            actions: Vec::new(),
            action_seq: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        info!("Activated scenario: {} ({})", self.name, self.id);
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        info!("Deactivated scenario: {} ({})", self.name, self.id);
    }

    /// Append a new action under the next `ACT<n>` id and return that id
    ///
    /// Ids come from a per-scenario sequence and are never reused, even after
    /// removals.
    pub fn add_action(&mut self, device_id: Option<String>, command: Command) -> String {
        self.action_seq += 1;
        let id = format!("{}{}", ACTION_ID_PREFIX, self.action_seq);
        self.actions.push(ScenarioAction::new(id.clone(), device_id, command));
        id
    }

    /// Append an existing action, keeping its id
    ///
    /// The id sequence is advanced past any `ACT<n>` id seen here.
    pub fn push_action(&mut self, action: ScenarioAction) {
        if let Some(n) = action
            .id
            .strip_prefix(ACTION_ID_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
        {
            self.action_seq = self.action_seq.max(n);
        }
        self.actions.push(action);
    }

    /// Remove the first action with the given id
    pub fn remove_action(&mut self, action_id: &str) -> Option<ScenarioAction> {
        let index = self.actions.iter().position(|a| a.id == action_id)?;
        Some(self.actions.remove(index))
    }

    pub fn action(&self, action_id: &str) -> Option<&ScenarioAction> {
        self.actions.iter().find(|a| a.id == action_id)
    }

    pub fn action_mut(&mut self, action_id: &str) -> Option<&mut ScenarioAction> {
        self.actions.iter_mut().find(|a| a.id == action_id)
    }

    /// Actions in execution order
    pub fn actions(&self) -> &[ScenarioAction] {
        &self.actions
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Whether any action targets the device
    pub fn references_device(&self, device_id: &str) -> bool {
        self.actions
            .iter()
            .any(|a| a.device_id.as_deref() == Some(device_id))
    }

    /// Run every action in order if the scenario is active
    pub fn execute<S: DeviceStore + ?Sized>(&mut self, store: &mut S) -> ScenarioRun {
        if !self.is_active {
            info!("Scenario {} ({}) is not active, skipping", self.name, self.id);
            return ScenarioRun::Skipped;
        }

        info!("Executing scenario: {} ({})", self.name, self.id);
        let outcomes: Vec<ActionOutcome> = self.actions.iter().map(|a| a.execute(store)).collect();
        self.last_run = Some(Utc::now());

        let run = ScenarioRun::Completed(outcomes);
        info!(
            "Scenario {} finished: {} applied, {} failed",
            self.id,
            run.applied_count(),
            run.failed_count()
        );
        run
    }
}

impl Entity for AutomationScenario {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl PartialEq for AutomationScenario {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AutomationScenario {}

/// Record format: `id|name|triggerTime|isActive|createdAtEpoch|actionSeq`.
/// Actions are stored separately. Records without `actionSeq` load with the
/// sequence seeded from their actions alone.
impl Record for AutomationScenario {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        join_fields([
            self.id.clone(),
            self.name.clone(),
            self.trigger_time.clone(),
            encode_flag(self.is_active).to_string(),
            self.created_at.timestamp().to_string(),
            self.action_seq.to_string(),
        ])
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::new(line, 5, Some(6))?;
        let id = reader.string();
        let name = reader.string();
        let trigger_time = reader.string();
        let is_active = reader.flag("is_active")?;
        let created_at = reader.timestamp("created_at")?;
        let action_seq = if reader.remaining() > 0 {
            reader.int("action_seq")?
        } else {
            0
        };

        let mut scenario = AutomationScenario::new(id, name, trigger_time);
        scenario.is_active = is_active;
        scenario.created_at = created_at;
        scenario.action_seq = action_seq;
        Ok(scenario)
    }
}
