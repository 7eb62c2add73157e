//! Device model
//!
//! A [`Device`] carries the status and telemetry fields every device shares
//! plus a kind-specific [`DeviceVariant`] payload. Behaviour that differs per
//! kind (on/off side effects, efficiency, diagnostics) dispatches on the
//! variant, so the shared field set stays in one place.

mod climate;
mod security;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use climate::ClimateState;
pub use security::SecurityState;

use crate::entity::Entity;
use crate::{HIGH_CONSUMPTION_WATTS, MAX_POWER_WATTS};

/// Device kind discriminator
///
/// The numeric codes are part of the record format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Sensor = 0,
    Actuator = 1,
    ClimateControl = 2,
    Security = 3,
    Multimedia = 4,
}

impl DeviceKind {
    /// All kinds in code order
    pub const ALL: [DeviceKind; 5] = [
        DeviceKind::Sensor,
        DeviceKind::Actuator,
        DeviceKind::ClimateControl,
        DeviceKind::Security,
        DeviceKind::Multimedia,
    ];

    /// Numeric code used in record files
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a kind by its numeric code
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            DeviceKind::Sensor => "Sensor",
            DeviceKind::Actuator => "Actuator",
            DeviceKind::ClimateControl => "Climate control",
            DeviceKind::Security => "Security",
            DeviceKind::Multimedia => "Multimedia",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind-specific device payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum DeviceVariant {
    /// No extra behaviour beyond the shared contract
    Standard,
    /// Thermostat-style device
    Climate(ClimateState),
    /// Alarm/access-control device
    Security(SecurityState),
}

impl DeviceVariant {
    /// Default payload for a device kind
    pub fn for_kind(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::ClimateControl => DeviceVariant::Climate(ClimateState::default()),
            DeviceKind::Security => DeviceVariant::Security(SecurityState::default()),
            _ => DeviceVariant::Standard,
        }
    }
}

/// Outcome of a power-draw update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpdate {
    /// Value was within range and stored as given
    Accepted,
    /// Value was negative (or not a number) and 0 was stored instead
    ClampedToZero,
    /// Value exceeded the maximum and the maximum was stored instead
    ClampedToMax,
}

impl PowerUpdate {
    pub fn was_clamped(self) -> bool {
        self != PowerUpdate::Accepted
    }
}

/// Result of a device self-check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub device_id: String,
    /// False when the device is offline
    pub passed: bool,
    pub findings: Vec<String>,
}

/// Clamp a power value into `[0, MAX_POWER_WATTS]`
fn clamp_power(watts: f64) -> (f64, PowerUpdate) {
    if watts.is_nan() || watts < 0.0 {
        (0.0, PowerUpdate::ClampedToZero)
    } else if watts > MAX_POWER_WATTS {
        (MAX_POWER_WATTS, PowerUpdate::ClampedToMax)
    } else {
        (watts, PowerUpdate::Accepted)
    }
}

/// An addressable controllable unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,

    pub name: String,

    pub manufacturer: String,

    pub kind: DeviceKind,

    /// Room this device is located in (lookup only, not owned)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub is_online: bool,

    is_on: bool,

    power_watts: f64,

    variant: DeviceVariant,
}

impl Device {
    /// Create a device, switched off and online, with the default payload for its kind
    ///
    /// Out-of-range power values are clamped.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        kind: DeviceKind,
        power_watts: f64,
    ) -> Self {
        let mut device = Self {
            id: id.into(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            kind,
            room_id: None,
            created_at: Utc::now(),
            is_online: true,
            is_on: false,
            power_watts: 0.0,
            variant: DeviceVariant::for_kind(kind),
        };
        device.update_current_value(power_watts);
        device
    }

    /// Create a climate-control device with the given target temperature
    pub fn climate(
        id: impl Into<String>,
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        power_watts: f64,
        target_temperature: f64,
    ) -> Self {
        let mut device = Self::new(id, name, manufacturer, DeviceKind::ClimateControl, power_watts);
        device.variant = DeviceVariant::Climate(ClimateState::with_target(target_temperature));
        device
    }

    /// Create a security device with default sensitivity and access code
    pub fn security(
        id: impl Into<String>,
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        power_watts: f64,
    ) -> Self {
        Self::new(id, name, manufacturer, DeviceKind::Security, power_watts)
    }

    /// Place the device in a room
    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = Some(room_id.into());
        self
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn power_watts(&self) -> f64 {
        self.power_watts
    }

    pub fn variant(&self) -> &DeviceVariant {
        &self.variant
    }

    pub fn climate_state(&self) -> Option<&ClimateState> {
        match &self.variant {
            DeviceVariant::Climate(state) => Some(state),
            _ => None,
        }
    }

    pub fn climate_state_mut(&mut self) -> Option<&mut ClimateState> {
        match &mut self.variant {
            DeviceVariant::Climate(state) => Some(state),
            _ => None,
        }
    }

    pub fn security_state(&self) -> Option<&SecurityState> {
        match &self.variant {
            DeviceVariant::Security(state) => Some(state),
            _ => None,
        }
    }

    pub fn security_state_mut(&mut self) -> Option<&mut SecurityState> {
        match &mut self.variant {
            DeviceVariant::Security(state) => Some(state),
            _ => None,
        }
    }

    /// Set the on/off flag without running any variant side effects
    ///
    /// Used when restoring persisted state, where the stored variant fields
    /// already reflect the effects of the original transition.
    pub fn restore_power_state(&mut self, is_on: bool) {
        self.is_on = is_on;
    }

    /// Switch the device on
    ///
    /// Climate devices in auto mode immediately run one adjustment step.
    pub fn turn_on(&mut self) {
        self.is_on = true;
        if let DeviceVariant::Climate(state) = &mut self.variant {
            if state.auto_mode {
                state.adjust();
            }
        }
        debug!("Device {} ({}) turned on", self.name, self.id);
    }

    /// Switch the device off
    ///
    /// Security devices are disarmed and their motion flag is cleared.
    pub fn turn_off(&mut self) {
        self.is_on = false;
        if let DeviceVariant::Security(state) = &mut self.variant {
            state.disarm();
        }
        debug!("Device {} ({}) turned off", self.name, self.id);
    }

    pub fn set_online(&mut self, online: bool) {
        self.is_online = online;
    }

    /// Short on/off status
    pub fn status(&self) -> &'static str {
        if self.is_on {
            "ON"
        } else {
            "OFF"
        }
    }

    /// Update the power draw, clamping into `[0, MAX_POWER_WATTS]`
    ///
    /// Out-of-range input is never an error: the clamped value is stored and
    /// a warning is emitted.
    pub fn update_current_value(&mut self, watts: f64) -> PowerUpdate {
        let (value, outcome) = clamp_power(watts);
        match outcome {
            PowerUpdate::Accepted => {}
            PowerUpdate::ClampedToZero => warn!(
                "Device {}: power {} W is negative, storing 0 W",
                self.id, watts
            ),
            PowerUpdate::ClampedToMax => warn!(
                "Device {}: power {} W exceeds {} W, storing maximum",
                self.id, watts, MAX_POWER_WATTS
            ),
        }
        self.power_watts = value;
        outcome
    }

    /// Effective consumption weighted by the variant's efficiency factor
    ///
    /// Zero whenever the device is off.
    pub fn calculate_efficiency(&self) -> f64 {
        if !self.is_on {
            return 0.0;
        }
        let factor = match &self.variant {
            DeviceVariant::Standard => 1.0,
            DeviceVariant::Climate(state) => state.efficiency_factor(),
            DeviceVariant::Security(state) => state.efficiency_factor(),
        };
        self.power_watts * factor
    }

    /// Change the climate target; re-adjusts when on and in auto mode
    ///
    /// Returns false for non-climate devices.
    pub fn set_target_temperature(&mut self, target: f64) -> bool {
        let is_on = self.is_on;
        match self.climate_state_mut() {
            Some(state) => {
                state.target_temperature = target;
                if is_on && state.auto_mode {
                    state.adjust();
                }
                true
            }
            None => false,
        }
    }

    /// Toggle climate auto mode; enabling it while on runs an adjustment step
    pub fn set_auto_mode(&mut self, auto_mode: bool) -> bool {
        let is_on = self.is_on;
        match self.climate_state_mut() {
            Some(state) => {
                state.auto_mode = auto_mode;
                if is_on && auto_mode {
                    state.adjust();
                }
                true
            }
            None => false,
        }
    }

    /// Run one climate adjustment step
    ///
    /// Returns false when the device is off or not a climate device.
    pub fn adjust_temperature(&mut self) -> bool {
        if !self.is_on {
            return false;
        }
        match self.climate_state_mut() {
            Some(state) => {
                state.adjust();
                true
            }
            None => false,
        }
    }

    /// Arm a security device; only possible while it is on
    pub fn arm(&mut self) -> bool {
        let is_on = self.is_on;
        let id = self.id.clone();
        match self.security_state_mut() {
            Some(state) if is_on => {
                state.is_armed = true;
                debug!("Security device {} armed", id);
                true
            }
            Some(_) => {
                warn!("Cannot arm security device {}: device is off", id);
                false
            }
            None => false,
        }
    }

    /// Record a motion reading; returns true when it should raise an alarm
    pub fn report_motion(&mut self, detected: bool) -> bool {
        let id = self.id.clone();
        match self.security_state_mut() {
            Some(state) => {
                state.motion_detected = detected;
                let alarm = detected && state.is_armed;
                if alarm {
                    warn!("Motion detected in armed zone by {}", id);
                }
                alarm
            }
            None => false,
        }
    }

    /// One-line label: name, manufacturer and power draw
    pub fn display_label(&self) -> String {
        format!("{} [{}] - {}W", self.name, self.manufacturer, self.power_watts)
    }

    /// Multi-line description including variant fields
    pub fn details(&self) -> String {
        let mut out = format!(
            "ID: {}\nName: {}\nKind: {}\nManufacturer: {}\nStatus: {}\nOnline: {}\nPower: {} W\n",
            self.id,
            self.name,
            self.kind,
            self.manufacturer,
            self.status(),
            if self.is_online { "yes" } else { "no" },
            self.power_watts,
        );
        match &self.variant {
            DeviceVariant::Standard => {}
            DeviceVariant::Climate(state) => {
                out.push_str(&format!(
                    "Target temperature: {}°C\nCurrent temperature: {}°C\nHumidity: {}%\nAuto mode: {}\n",
                    state.target_temperature,
                    state.current_temperature,
                    state.humidity,
                    if state.auto_mode { "on" } else { "off" },
                ));
            }
            DeviceVariant::Security(state) => {
                out.push_str(&format!(
                    "Armed: {}\nSensitivity: {}\nMotion detected: {}\nAccess codes: {}\n",
                    if state.is_armed { "yes" } else { "no" },
                    state.sensitivity_level(),
                    if state.motion_detected { "yes" } else { "no" },
                    state.access_code_count(),
                ));
            }
        }
        out
    }

    /// Run the device's self-check
    pub fn self_check(&self) -> DiagnosticReport {
        let mut findings = vec![
            format!("connectivity: {}", if self.is_online { "online" } else { "offline" }),
            format!("power: {}", self.status()),
        ];

        if self.power_watts > HIGH_CONSUMPTION_WATTS {
            findings.push(format!("high consumption: {} W", self.power_watts));
        }

        match &self.variant {
            DeviceVariant::Standard => {}
            DeviceVariant::Climate(state) => {
                findings.push(format!(
                    "temperature: {}/{}°C",
                    state.current_temperature, state.target_temperature
                ));
                findings.push(format!("humidity: {}%", state.humidity));
            }
            DeviceVariant::Security(state) => {
                findings.push(format!(
                    "alarm: {}",
                    if state.is_armed { "armed" } else { "disarmed" }
                ));
                findings.push(format!("sensitivity: {}/10", state.sensitivity_level()));
                if state.motion_detected {
                    findings.push("motion detected".to_string());
                }
            }
        }

        DiagnosticReport {
            device_id: self.id.clone(),
            passed: self.is_online,
            findings,
        }
    }
}

impl Entity for Device {
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

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> Device {
        Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0)
    }

    #[test]
    fn test_kind_codes() {
        for kind in DeviceKind::ALL {
            assert_eq!(DeviceKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(DeviceKind::Security.code(), 3);
        assert_eq!(DeviceKind::from_code(5), None);
    }

    #[test]
    fn test_new_device_defaults() {
        let device = lamp();
        assert!(!device.is_on());
        assert!(device.is_online);
        assert_eq!(device.power_watts(), 15.0);
        assert_eq!(device.variant(), &DeviceVariant::Standard);
        assert_eq!(device.status(), "OFF");
    }

    #[test]
    fn test_variant_follows_kind() {
        let thermostat = Device::new("C1", "Thermostat", "Y", DeviceKind::ClimateControl, 100.0);
        assert!(thermostat.climate_state().is_some());

        let alarm = Device::new("S1", "Alarm", "Z", DeviceKind::Security, 10.0);
        assert!(alarm.security_state().is_some());
    }

    #[test]
    fn test_update_current_value_clamps() {
        let mut device = lamp();

        assert_eq!(device.update_current_value(-5.0), PowerUpdate::ClampedToZero);
        assert_eq!(device.power_watts(), 0.0);

        assert_eq!(device.update_current_value(20_000.0), PowerUpdate::ClampedToMax);
        assert_eq!(device.power_watts(), 10_000.0);

        assert_eq!(device.update_current_value(1234.5), PowerUpdate::Accepted);
        assert_eq!(device.power_watts(), 1234.5);

        assert_eq!(device.update_current_value(0.0), PowerUpdate::Accepted);
        assert_eq!(device.update_current_value(10_000.0), PowerUpdate::Accepted);
        assert_eq!(device.power_watts(), 10_000.0);

        assert_eq!(device.update_current_value(f64::NAN), PowerUpdate::ClampedToZero);
        assert_eq!(device.power_watts(), 0.0);
    }

    #[test]
    fn test_constructor_clamps_power() {
        let device = Device::new("D2", "Heater", "X", DeviceKind::Actuator, 50_000.0);
        assert_eq!(device.power_watts(), MAX_POWER_WATTS);
    }

    #[test]
    fn test_base_efficiency() {
        let mut device = lamp();
        assert_eq!(device.calculate_efficiency(), 0.0);
        device.turn_on();
        assert_eq!(device.calculate_efficiency(), 15.0);
    }

    #[test]
    fn test_climate_turn_on_adjusts_in_auto_mode() {
        let mut device = Device::climate("C1", "AC", "Y", 1000.0, 24.0);
        device.turn_on();
        let state = device.climate_state().unwrap();
        assert_eq!(state.current_temperature, 20.5);
        assert_eq!(state.humidity, 50.0);

        let mut manual = Device::climate("C2", "AC", "Y", 1000.0, 24.0);
        manual.climate_state_mut().unwrap().auto_mode = false;
        manual.turn_on();
        assert_eq!(manual.climate_state().unwrap().current_temperature, 20.0);
    }

    #[test]
    fn test_climate_efficiency_bands() {
        let mut device = Device::climate("C1", "AC", "Y", 1000.0, 22.0);
        device.climate_state_mut().unwrap().auto_mode = false;
        device.turn_on();

        device.climate_state_mut().unwrap().current_temperature = 21.0;
        assert!((device.calculate_efficiency() - 900.0).abs() < 1e-9);

        device.climate_state_mut().unwrap().current_temperature = 18.0;
        assert!((device.calculate_efficiency() - 700.0).abs() < 1e-9);

        device.climate_state_mut().unwrap().current_temperature = 10.0;
        assert!((device.calculate_efficiency() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_target_temperature() {
        let mut device = Device::climate("C1", "AC", "Y", 500.0, 22.0);
        assert!(device.set_target_temperature(18.0));
        // Off: no adjustment
        assert_eq!(device.climate_state().unwrap().current_temperature, 20.0);

        device.turn_on();
        assert_eq!(device.climate_state().unwrap().current_temperature, 19.5);
        assert!(device.set_target_temperature(16.0));
        assert_eq!(device.climate_state().unwrap().current_temperature, 19.0);

        assert!(!lamp().set_target_temperature(20.0));
    }

    #[test]
    fn test_security_turn_off_clears_alarm_state() {
        let mut device = Device::security("S1", "Alarm", "Z", 10.0);
        assert!(!device.arm());

        device.turn_on();
        assert!(device.arm());
        assert!(device.report_motion(true));

        device.turn_off();
        let state = device.security_state().unwrap();
        assert!(!state.is_armed);
        assert!(!state.motion_detected);
    }

    #[test]
    fn test_security_efficiency() {
        let mut device = Device::security("S1", "Alarm", "Z", 100.0);
        device.turn_on();
        // Disarmed, sensitivity 5
        assert!((device.calculate_efficiency() - 50.0).abs() < 1e-9);

        device.arm();
        device.security_state_mut().unwrap().set_sensitivity(10);
        assert!((device.calculate_efficiency() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_check_flags_offline_and_high_consumption() {
        let mut device = Device::new("D3", "Oven", "X", DeviceKind::Actuator, 2500.0);
        device.set_online(false);

        let report = device.self_check();
        assert!(!report.passed);
        assert!(report.findings.iter().any(|f| f.starts_with("high consumption")));
    }

    #[test]
    fn test_equality_by_id() {
        let a = lamp();
        let mut b = Device::new("D1", "Other", "Q", DeviceKind::Sensor, 1.0);
        b.turn_on();
        assert_eq!(a, b);
        assert_ne!(a, Device::new("D2", "Lamp", "X", DeviceKind::Actuator, 15.0));
    }

    #[test]
    fn test_details_mentions_variant_fields() {
        let device = Device::security("S1", "Alarm", "Z", 10.0);
        let details = device.details();
        assert!(details.contains("Sensitivity: 5"));
        assert!(details.contains("Access codes: 1"));
        assert_eq!(lamp().display_label(), "Lamp [X] - 15W");
    }

    #[test]
    fn test_serde_tags_variant() {
        let device = Device::climate("C1", "Thermostat", "Nest", 800.0, 23.0).with_room("R1");
        let json = serde_json::to_value(&device).unwrap();

        assert_eq!(json["kind"], "climate_control");
        assert_eq!(json["room_id"], "R1");
        assert_eq!(json["variant"]["variant"], "climate");
        assert_eq!(json["variant"]["target_temperature"], 23.0);

        let back: Device = serde_json::from_value(json).unwrap();
        assert_eq!(back.climate_state(), device.climate_state());
        assert_eq!(back.power_watts(), 800.0);
    }
}
