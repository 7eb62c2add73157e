//! Automation Engine
//!
//! This crate provides automation scenarios for the smart home.
//! A scenario is a named, ordered list of device actions that can be
//! activated and executed as a unit.
//!
//! # Execution
//!
//! ```text
//! SCENARIO (active) → ACTION 1 → ACTION 2 → ... → ScenarioRun
//! ```
//!
//! Execution is best-effort: an action whose device cannot be resolved is
//! reported and skipped, and the remaining actions still run. Nothing is
//! rolled back.
//!
//! # Key Types
//!
//! - [`ScenarioAction`] - One command bound to one device id
//! - [`AutomationScenario`] - Ordered actions plus activation state
//! - [`ScenarioManager`] - Owns and persists all scenarios

pub mod action;
pub mod manager;
pub mod scenario;

pub use action::{ActionOutcome, ActionRecord, Command, ScenarioAction};
pub use manager::{AutomationError, AutomationResult, ScenarioManager};
pub use scenario::{AutomationScenario, ScenarioRun};
