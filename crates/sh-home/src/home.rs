//! The home graph
//!
//! [`Home`] owns every registry and the scenario manager, and is the only
//! place where operations spanning several entity types happen: attaching
//! devices to rooms, checking references before they are stored, and
//! raising notifications from device and scenario events.

use std::path::Path;

use chrono::{Duration, Utc};
use sh_automation::{AutomationScenario, Command, ScenarioAction, ScenarioManager, ScenarioRun};
use sh_config::{EnergyConfig, HomeConfig};
use sh_core::{
    device_energy_cost, energy_cost, validate_entity_id, validate_password, Device, DeviceKind,
    NotificationType, PowerUpdate, Room, User, NULL_REF,
};
use sh_registries::{
    DeviceRegistry, NotificationRegistry, Registries, ReportRegistry, RoomRegistry, UserRegistry,
};
use tracing::{debug, info, warn};

use crate::error::{HomeError, HomeResult};
use crate::load::LoadReport;
use crate::summary::HomeSummary;

/// Prefix of generated room ids
pub const ROOM_ID_PREFIX: &str = "ROOM";

/// Prefix of generated user ids
pub const USER_ID_PREFIX: &str = "USR";

/// Prefix of generated device ids for a kind
pub fn device_id_prefix(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::ClimateControl => "CLIM",
        DeviceKind::Security => "SEC",
        _ => "DEV",
    }
}

/// The whole smart home
pub struct Home {
    name: String,
    energy: EnergyConfig,
    pub(crate) registries: Registries,
    pub(crate) scenarios: ScenarioManager,
}

impl Home {
    /// Create an empty home backed by a data directory
    pub fn new(data_dir: impl AsRef<Path>, config: &HomeConfig) -> Self {
        let registries = Registries::new(data_dir);
        let scenarios = ScenarioManager::new(registries.storage.clone());

        Self {
            name: config.home.name.clone(),
            energy: config.energy.clone(),
            registries,
            scenarios,
        }
    }

    /// Load a home from its data directory
    ///
    /// Missing files load as empty collections. Only I/O failures are errors;
    /// everything skipped along the way is listed in the returned report.
    pub fn load(data_dir: impl AsRef<Path>, config: &HomeConfig) -> HomeResult<(Self, LoadReport)> {
        let mut home = Self::new(data_dir, config);
        let report = home.reload()?;
        Ok((home, report))
    }

    /// Replace the in-memory graph with the contents of the data directory
    pub fn reload(&mut self) -> HomeResult<LoadReport> {
        let mut report = LoadReport {
            rejected: self.registries.load_all()?,
            ..Default::default()
        };
        report.rejected.extend(self.scenarios.load()?);
        let actions = self.scenarios.load_actions()?;
        report.rejected.extend(actions.rejected);

        self.resolve_device_rooms(&mut report);
        self.resolve_actions(actions.records, &mut report)?;
        self.resolve_notifications(&mut report);

        info!(
            "Loaded home {}: {} rooms, {} devices, {} scenarios ({} records skipped)",
            self.name,
            self.registries.rooms.len(),
            self.registries.devices.len(),
            self.scenarios.len(),
            report.skipped_count()
        );
        Ok(report)
    }

    /// Write every collection to the data directory
    pub fn save(&self) -> HomeResult<()> {
        self.registries.save_all()?;
        self.scenarios.save()?;
        debug!("Saved home {}", self.name);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn energy_settings(&self) -> &EnergyConfig {
        &self.energy
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.registries.rooms
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.registries.devices
    }

    pub fn users(&self) -> &UserRegistry {
        &self.registries.users
    }

    pub fn notifications(&self) -> &NotificationRegistry {
        &self.registries.notifications
    }

    pub fn reports(&self) -> &ReportRegistry {
        &self.registries.reports
    }

    pub fn scenarios(&self) -> &ScenarioManager {
        &self.scenarios
    }

    // Rooms

    pub fn next_room_id(&self) -> String {
        self.registries.rooms.next_sequential_id(ROOM_ID_PREFIX)
    }

    /// Create an empty room
    pub fn add_room(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        area_sqm: f64,
    ) -> HomeResult<()> {
        let id = id.into();
        validate_entity_id(&id)?;
        if self.registries.rooms.contains(&id) {
            return Err(HomeError::DuplicateId { kind: "Room", id });
        }

        let room = Room::new(id, name, area_sqm);
        info!("Created room: {} ({})", room.name, room.id);
        self.registries.rooms.insert(room);
        Ok(())
    }

    /// Delete a room that holds no devices
    pub fn delete_room(&mut self, room_id: &str) -> HomeResult<Room> {
        let room = self.room(room_id)?;
        if !room.is_empty() {
            return Err(HomeError::RoomNotEmpty {
                room_id: room_id.to_string(),
                device_count: room.device_count(),
            });
        }

        let room = self
            .registries
            .rooms
            .remove(room_id)
            .ok_or_else(|| HomeError::RoomNotFound(room_id.to_string()))?;
        info!("Deleted room: {} ({})", room.name, room.id);
        Ok(room)
    }

    pub fn room(&self, room_id: &str) -> HomeResult<&Room> {
        self.registries
            .rooms
            .get(room_id)
            .ok_or_else(|| HomeError::RoomNotFound(room_id.to_string()))
    }

    /// Member devices of a room, in membership order
    pub fn room_devices(&self, room_id: &str) -> HomeResult<Vec<&Device>> {
        let room = self.room(room_id)?;
        Ok(room.devices(&self.registries.devices).collect())
    }

    /// Current draw of a room's devices that are on and online, in watts
    pub fn room_power(&self, room_id: &str) -> HomeResult<f64> {
        Ok(self
            .room(room_id)?
            .calculate_room_power_consumption(&self.registries.devices))
    }

    // Devices

    pub fn next_device_id(&self, kind: DeviceKind) -> String {
        self.registries
            .devices
            .next_sequential_id(device_id_prefix(kind))
    }

    /// Register a device and attach it to its room, if it names one
    pub fn add_device(&mut self, device: Device) -> HomeResult<()> {
        validate_entity_id(&device.id)?;
        if self.registries.devices.contains(&device.id) {
            return Err(HomeError::DuplicateId {
                kind: "Device",
                id: device.id,
            });
        }

        if let Some(room_id) = device.room_id.as_deref() {
            let room = self
                .registries
                .rooms
                .get_mut(room_id)
                .ok_or_else(|| HomeError::RoomNotFound(room_id.to_string()))?;
            room.add_device(device.id.clone());
        }

        self.registries.devices.register(device);
        Ok(())
    }

    /// Remove a device and detach it from its room
    ///
    /// Scenario actions keep pointing at the removed id and report it as not
    /// found when run. Notifications about the device lose their device link.
    pub fn remove_device(&mut self, device_id: &str) -> HomeResult<Device> {
        let device = self
            .registries
            .devices
            .remove(device_id)
            .ok_or_else(|| HomeError::DeviceNotFound(device_id.to_string()))?;

        if let Some(room) = device
            .room_id
            .as_deref()
            .and_then(|room_id| self.registries.rooms.get_mut(room_id))
        {
            room.remove_device(device_id);
        }

        for notification in self
            .registries
            .notifications
            .iter_mut()
            .filter(|n| n.device_id.as_deref() == Some(device_id))
        {
            notification.device_id = None;
        }

        let referencing = self.scenarios.referencing_device(device_id).len();
        if referencing > 0 {
            warn!(
                "Device {} removed while {} scenario(s) still target it",
                device_id, referencing
            );
        }
        Ok(device)
    }

    /// Move a device to another room, or out of any room with `None`
    pub fn move_device(&mut self, device_id: &str, room_id: Option<&str>) -> HomeResult<()> {
        if let Some(room_id) = room_id {
            if !self.registries.rooms.contains(room_id) {
                return Err(HomeError::RoomNotFound(room_id.to_string()));
            }
        }

        let device = self.device_mut(device_id)?;
        let previous = std::mem::replace(&mut device.room_id, room_id.map(str::to_string));

        if let Some(room) = previous
            .as_deref()
            .and_then(|previous| self.registries.rooms.get_mut(previous))
        {
            room.remove_device(device_id);
        }
        if let Some(room) = room_id.and_then(|room_id| self.registries.rooms.get_mut(room_id)) {
            room.add_device(device_id);
        }

        info!(
            "Moved device {} from {} to {}",
            device_id,
            previous.as_deref().unwrap_or(NULL_REF),
            room_id.unwrap_or(NULL_REF)
        );
        Ok(())
    }

    pub fn device(&self, device_id: &str) -> HomeResult<&Device> {
        self.registries
            .devices
            .get(device_id)
            .ok_or_else(|| HomeError::DeviceNotFound(device_id.to_string()))
    }

    pub fn device_mut(&mut self, device_id: &str) -> HomeResult<&mut Device> {
        self.registries
            .devices
            .get_mut(device_id)
            .ok_or_else(|| HomeError::DeviceNotFound(device_id.to_string()))
    }

    /// Switch a device on or off
    pub fn switch_device(&mut self, device_id: &str, on: bool) -> HomeResult<()> {
        let device = self.device_mut(device_id)?;
        if on {
            device.turn_on();
        } else {
            device.turn_off();
        }
        Ok(())
    }

    /// Set a device's power draw, clamping out-of-range values
    pub fn set_device_power(&mut self, device_id: &str, watts: f64) -> HomeResult<PowerUpdate> {
        Ok(self.device_mut(device_id)?.update_current_value(watts))
    }

    /// Feed a motion reading to a security device
    ///
    /// Motion in an armed zone raises an alert notification, whose id is
    /// returned.
    pub fn report_motion(&mut self, device_id: &str, detected: bool) -> HomeResult<Option<String>> {
        let device = self.device_mut(device_id)?;
        if !device.report_motion(detected) {
            return Ok(None);
        }

        let message = format!("Motion detected by {}", device.name);
        let id = self.registries.notifications.create(
            NotificationType::Alert,
            message,
            Some(device_id.to_string()),
            None,
        );
        Ok(Some(id))
    }

    /// Cost of running a device for a number of hours at the configured tariff
    pub fn device_cost(&self, device_id: &str, hours: f64) -> HomeResult<f64> {
        let device = self.device(device_id)?;
        Ok(device_energy_cost(device, hours, self.energy.cost_per_kwh))
    }

    // Scenarios

    fn require_scenario(&self, scenario_id: &str) -> HomeResult<()> {
        if self.scenarios.contains(scenario_id) {
            Ok(())
        } else {
            Err(HomeError::ScenarioNotFound(scenario_id.to_string()))
        }
    }

    pub fn scenario(&self, scenario_id: &str) -> HomeResult<&AutomationScenario> {
        self.scenarios
            .get(scenario_id)
            .ok_or_else(|| HomeError::ScenarioNotFound(scenario_id.to_string()))
    }

    /// Create an inactive scenario under the next free id
    pub fn add_scenario(
        &mut self,
        name: impl Into<String>,
        trigger_time: impl Into<String>,
    ) -> HomeResult<String> {
        let id = self.scenarios.next_id();
        let scenario = AutomationScenario::new(id, name, trigger_time);
        Ok(self.scenarios.add(scenario)?)
    }

    /// Remove a scenario; notifications about it lose their scenario link
    pub fn remove_scenario(&mut self, scenario_id: &str) -> HomeResult<AutomationScenario> {
        self.require_scenario(scenario_id)?;
        let scenario = self.scenarios.remove(scenario_id)?;

        for notification in self
            .registries
            .notifications
            .iter_mut()
            .filter(|n| n.scenario_id.as_deref() == Some(scenario_id))
        {
            notification.scenario_id = None;
        }
        Ok(scenario)
    }

    /// Append an action to a scenario; the device must exist now
    pub fn add_action(
        &mut self,
        scenario_id: &str,
        device_id: Option<&str>,
        command: Command,
    ) -> HomeResult<String> {
        self.require_scenario(scenario_id)?;
        if let Some(device_id) = device_id {
            if !self.registries.devices.contains(device_id) {
                return Err(HomeError::DeviceNotFound(device_id.to_string()));
            }
        }
        Ok(self
            .scenarios
            .add_action(scenario_id, device_id.map(str::to_string), command)?)
    }

    pub fn remove_action(&mut self, scenario_id: &str, action_id: &str) -> HomeResult<ScenarioAction> {
        self.require_scenario(scenario_id)?;
        Ok(self.scenarios.remove_action(scenario_id, action_id)?)
    }

    pub fn activate_scenario(&mut self, scenario_id: &str) -> HomeResult<()> {
        self.require_scenario(scenario_id)?;
        Ok(self.scenarios.activate(scenario_id)?)
    }

    pub fn deactivate_scenario(&mut self, scenario_id: &str) -> HomeResult<()> {
        self.require_scenario(scenario_id)?;
        Ok(self.scenarios.deactivate(scenario_id)?)
    }

    /// Run a scenario against the device registry
    ///
    /// A run with failed actions leaves a warning notification linked to the
    /// scenario.
    pub fn execute_scenario(&mut self, scenario_id: &str) -> HomeResult<ScenarioRun> {
        self.require_scenario(scenario_id)?;
        let run = self
            .scenarios
            .execute(scenario_id, &mut self.registries.devices)?;

        let failed = run.failed_count();
        if failed > 0 {
            self.registries.notifications.create(
                NotificationType::Warning,
                format!("Scenario {} finished with {} failed action(s)", scenario_id, failed),
                None,
                Some(scenario_id.to_string()),
            );
        }
        Ok(run)
    }

    // Users

    pub fn next_user_id(&self) -> String {
        self.registries.users.next_sequential_id(USER_ID_PREFIX)
    }

    /// Add a user; ids and usernames must both be unused
    pub fn add_user(&mut self, user: User) -> HomeResult<()> {
        validate_entity_id(&user.id)?;
        validate_password(user.password_hash())?;
        if self.registries.users.contains(&user.id) {
            return Err(HomeError::DuplicateId {
                kind: "User",
                id: user.id,
            });
        }
        if self.registries.users.find_by_username(&user.username).is_some() {
            return Err(HomeError::UsernameTaken(user.username));
        }

        info!("Created user: {} ({})", user.username, user.id);
        self.registries.users.insert(user);
        Ok(())
    }

    pub fn remove_user(&mut self, user_id: &str) -> HomeResult<User> {
        let user = self
            .registries
            .users
            .remove(user_id)
            .ok_or_else(|| HomeError::UserNotFound(user_id.to_string()))?;
        info!("Removed user: {} ({})", user.username, user.id);
        Ok(user)
    }

    pub fn user(&self, user_id: &str) -> HomeResult<&User> {
        self.registries
            .users
            .get(user_id)
            .ok_or_else(|| HomeError::UserNotFound(user_id.to_string()))
    }

    fn user_mut(&mut self, user_id: &str) -> HomeResult<&mut User> {
        self.registries
            .users
            .get_mut(user_id)
            .ok_or_else(|| HomeError::UserNotFound(user_id.to_string()))
    }

    /// Check credentials; returns the user's id
    pub fn login(&mut self, username: &str, password: &str) -> HomeResult<String> {
        if self.registries.users.find_by_username(username).is_none() {
            return Err(HomeError::UserNotFound(username.to_string()));
        }
        self.registries
            .users
            .authenticate(username, password)
            .ok_or_else(|| HomeError::AuthenticationFailed(username.to_string()))
    }

    pub fn logout(&mut self, user_id: &str) -> HomeResult<()> {
        self.user_mut(user_id)?.logout();
        Ok(())
    }

    pub fn change_password(&mut self, user_id: &str, new_password: &str) -> HomeResult<()> {
        Ok(self.user_mut(user_id)?.change_password(new_password)?)
    }

    // Notifications

    /// Send a notification; linked device and scenario must exist
    pub fn notify(
        &mut self,
        kind: NotificationType,
        message: impl Into<String>,
        device_id: Option<&str>,
        scenario_id: Option<&str>,
    ) -> HomeResult<String> {
        if let Some(device_id) = device_id {
            self.device(device_id)?;
        }
        if let Some(scenario_id) = scenario_id {
            self.require_scenario(scenario_id)?;
        }
        Ok(self.registries.notifications.create(
            kind,
            message,
            device_id.map(str::to_string),
            scenario_id.map(str::to_string),
        ))
    }

    pub fn mark_notification_read(&mut self, notification_id: &str) -> HomeResult<()> {
        if self.registries.notifications.mark_as_read(notification_id) {
            Ok(())
        } else {
            Err(HomeError::NotificationNotFound(notification_id.to_string()))
        }
    }

    pub fn mark_all_notifications_read(&mut self) -> usize {
        self.registries.notifications.mark_all_read()
    }

    // Energy

    /// Build and store a report for the configured period ending now
    ///
    /// Every device that is currently on contributes its draw over the whole
    /// period. Returns the report id.
    pub fn create_energy_report(&mut self) -> String {
        let hours = self.energy.report_period_hours;
        let period_end = Utc::now();
        let period_start = period_end - Duration::seconds((hours * 3600.0).round() as i64);

        let mut report = self.registries.reports.draft(period_start, period_end);
        for device in self.registries.devices.iter().filter(|d| d.is_on()) {
            report.add_device_consumption(device.id.clone(), device.power_watts() * hours / 1000.0);
        }
        report.generate_report();

        info!(
            "Created energy report {}: {} kWh over {} devices",
            report.id,
            report.total_consumption,
            report.sample_count()
        );
        let id = report.id.clone();
        self.registries.reports.insert(report);
        id
    }

    /// Snapshot of the home's state
    pub fn summary(&self) -> HomeSummary {
        let devices = &self.registries.devices;
        let total_power = devices.total_power();

        HomeSummary {
            name: self.name.clone(),
            rooms: self.registries.rooms.len(),
            devices: devices.len(),
            active_devices: devices.active_count(),
            online_devices: devices.iter().filter(|d| d.is_online).count(),
            total_power_watts: total_power,
            estimated_period_cost: energy_cost(
                total_power,
                self.energy.report_period_hours,
                self.energy.cost_per_kwh,
            ),
            users: self.registries.users.len(),
            scenarios: self.scenarios.len(),
            active_scenarios: self.scenarios.active_count(),
            notifications: self.registries.notifications.len(),
            unread_notifications: self.registries.notifications.unread_count(),
            reports: self.registries.reports.len(),
            live_devices: devices.live_count(),
            devices_registered: devices.total_registered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_core::AccessLevel;
    use tempfile::TempDir;

    fn home(dir: &TempDir) -> Home {
        Home::new(dir.path(), &HomeConfig::default())
    }

    #[test]
    fn test_add_device_requires_existing_room() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);

        let lamp = Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0).with_room("R1");
        assert!(matches!(
            home.add_device(lamp.clone()),
            Err(HomeError::RoomNotFound(_))
        ));
        assert!(home.devices().is_empty());

        home.add_room("R1", "Living Room", 20.0).unwrap();
        home.add_device(lamp.clone()).unwrap();
        assert_eq!(home.room("R1").unwrap().device_ids(), ["D1".to_string()]);
        assert!(matches!(
            home.add_device(lamp),
            Err(HomeError::DuplicateId { kind: "Device", .. })
        ));
    }

    #[test]
    fn test_invalid_ids_are_refused() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        assert!(matches!(
            home.add_room("NULL", "Nowhere", 1.0),
            Err(HomeError::InvalidId(_))
        ));
        assert!(matches!(
            home.add_device(Device::new("", "Lamp", "X", DeviceKind::Actuator, 15.0)),
            Err(HomeError::InvalidId(_))
        ));
    }

    #[test]
    fn test_move_and_remove_device() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        home.add_room("R1", "Kitchen", 12.0).unwrap();
        home.add_room("R2", "Hall", 8.0).unwrap();
        home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0).with_room("R1"))
            .unwrap();

        assert!(matches!(
            home.move_device("D1", Some("R9")),
            Err(HomeError::RoomNotFound(_))
        ));
        home.move_device("D1", Some("R2")).unwrap();
        assert!(home.room("R1").unwrap().is_empty());
        assert!(home.room("R2").unwrap().contains("D1"));
        assert_eq!(home.device("D1").unwrap().room_id.as_deref(), Some("R2"));

        home.remove_device("D1").unwrap();
        assert!(home.room("R2").unwrap().is_empty());
        assert_eq!(home.devices().live_count(), 0);
        assert!(matches!(home.remove_device("D1"), Err(HomeError::DeviceNotFound(_))));
    }

    #[test]
    fn test_scenario_with_removed_device_reports_failure() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0)).unwrap();
        home.add_device(Device::new("D2", "Fan", "X", DeviceKind::Actuator, 40.0)).unwrap();

        let id = home.add_scenario("Evening", "19:00").unwrap();
        home.add_action(&id, Some("D1"), Command::TurnOn).unwrap();
        home.add_action(&id, Some("D2"), Command::TurnOn).unwrap();
        assert!(matches!(
            home.add_action(&id, Some("D9"), Command::TurnOn),
            Err(HomeError::DeviceNotFound(_))
        ));
        home.activate_scenario(&id).unwrap();
        home.remove_device("D1").unwrap();

        let run = home.execute_scenario(&id).unwrap();
        assert_eq!(run.applied_count(), 1);
        assert_eq!(run.failed_count(), 1);
        assert!(home.device("D2").unwrap().is_on());

        let warnings = home.notifications().unread();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].scenario_id.as_deref(), Some(id.as_str()));
        assert_eq!(warnings[0].kind, NotificationType::Warning);
    }

    #[test]
    fn test_unknown_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        assert!(matches!(
            home.execute_scenario("SC1"),
            Err(HomeError::ScenarioNotFound(_))
        ));
        assert!(matches!(
            home.notify(NotificationType::Info, "x", None, Some("SC1")),
            Err(HomeError::ScenarioNotFound(_))
        ));
    }

    #[test]
    fn test_motion_alarm_raises_alert() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        home.add_device(Device::security("S1", "Hall sensor", "Acme", 5.0)).unwrap();

        assert_eq!(home.report_motion("S1", true).unwrap(), None);

        home.switch_device("S1", true).unwrap();
        assert!(home.device_mut("S1").unwrap().arm());
        let alert = home.report_motion("S1", true).unwrap().unwrap();

        let notification = home.notifications().get(&alert).unwrap();
        assert_eq!(notification.kind, NotificationType::Alert);
        assert_eq!(notification.device_id.as_deref(), Some("S1"));

        // Removing the device keeps the notification but drops the link
        home.remove_device("S1").unwrap();
        assert_eq!(home.notifications().get(&alert).unwrap().device_id, None);
    }

    #[test]
    fn test_users() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        let id = home.next_user_id();
        assert_eq!(id, "USR1");

        home.add_user(User::new(id.clone(), "alice", "secret", AccessLevel::Admin, "", ""))
            .unwrap();
        assert!(matches!(
            home.add_user(User::new("USR2", "alice", "other", AccessLevel::User, "", "")),
            Err(HomeError::UsernameTaken(_))
        ));
        assert!(matches!(
            home.add_user(User::new("USR2", "bob", "a b", AccessLevel::User, "", "")),
            Err(HomeError::InvalidPassword(_))
        ));

        assert_eq!(home.login("alice", "secret").unwrap(), id);
        assert!(matches!(
            home.login("alice", "wrong"),
            Err(HomeError::AuthenticationFailed(_))
        ));
        assert!(matches!(home.login("carol", "x"), Err(HomeError::UserNotFound(_))));

        home.change_password(&id, "better").unwrap();
        assert_eq!(home.login("alice", "better").unwrap(), id);
        assert!(home.user(&id).unwrap().activity_history().len() >= 3);
    }

    #[test]
    fn test_energy_report_and_cost() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        home.add_device(Device::new("D1", "Heater", "X", DeviceKind::Actuator, 1000.0)).unwrap();
        home.add_device(Device::new("D2", "Lamp", "X", DeviceKind::Actuator, 500.0)).unwrap();
        home.add_device(Device::new("D3", "Fan", "X", DeviceKind::Actuator, 50.0)).unwrap();
        home.switch_device("D1", true).unwrap();
        home.switch_device("D2", true).unwrap();

        let id = home.create_energy_report();
        let report = home.reports().get(&id).unwrap();
        assert_eq!(report.sample("D1"), Some(24.0));
        assert_eq!(report.sample("D2"), Some(12.0));
        assert_eq!(report.sample("D3"), None);
        assert_eq!(report.total_consumption, 36.0);
        assert_eq!(report.peak_load, 24.0);
        assert_eq!((report.period_end - report.period_start).num_hours(), 24);

        // 1 kW for 10 h at 0.15 per kWh
        assert_eq!(home.device_cost("D1", 10.0).unwrap(), 1.5);
        assert_eq!(home.device_cost("D3", 10.0).unwrap(), 0.0);
    }

    #[test]
    fn test_summary() {
        let temp_dir = TempDir::new().unwrap();
        let mut home = home(&temp_dir);
        home.add_room("R1", "Office", 10.0).unwrap();
        home.add_device(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 100.0).with_room("R1"))
            .unwrap();
        home.add_device(Device::new("D2", "Fan", "X", DeviceKind::Actuator, 50.0).with_room("R1"))
            .unwrap();
        home.switch_device("D1", true).unwrap();
        home.notify(NotificationType::Info, "Hello", Some("D1"), None).unwrap();

        let summary = home.summary();
        assert_eq!(summary.name, "Home");
        assert_eq!(summary.rooms, 1);
        assert_eq!(summary.devices, 2);
        assert_eq!(summary.active_devices, 1);
        assert_eq!(summary.total_power_watts, 100.0);
        assert_eq!(summary.unread_notifications, 1);
        assert_eq!(summary.live_devices, 2);
        assert_eq!(home.room_power("R1").unwrap(), 100.0);
    }
}
