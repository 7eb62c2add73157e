//! Status summary

use serde::Serialize;

/// Snapshot of the home's state, as printed by the binary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeSummary {
    pub name: String,
    pub rooms: usize,
    pub devices: usize,
    /// Devices switched on
    pub active_devices: usize,
    pub online_devices: usize,
    /// Current draw of devices that are on and online
    pub total_power_watts: f64,
    /// Cost of the current draw over one report period
    pub estimated_period_cost: f64,
    pub users: usize,
    pub scenarios: usize,
    pub active_scenarios: usize,
    pub notifications: usize,
    pub unread_notifications: usize,
    pub reports: usize,
    /// Devices currently held by the registry
    pub live_devices: usize,
    /// Devices registered since start-up, including loaded ones
    pub devices_registered: u64,
}
