//! Device Registry
//!
//! Owns every device (the arena that rooms and scenario actions point into by
//! id) and the live-instance counters.
//!
//! Record format: `id|name|manufacturer|kind|roomIdOrNULL|isOn|isOnline|powerWatts`,
//! followed for climate devices by `|target|current|humidity|autoMode` and for
//! security devices by `|isArmed|sensitivity|motionDetected[|code]*`.

use std::cmp::Ordering;
use std::sync::Arc;

use sh_core::{Device, DeviceKind, DeviceStore, DeviceVariant};
use tracing::info;

use crate::codec::{
    encode_f64, encode_flag, encode_ref, join_fields, CodecError, CodecResult, FieldReader,
};
use crate::registry::Registry;
use crate::storage::{Record, RejectedLine, Storage, StorageResult};

/// Data file for devices
pub const STORAGE_KEY: &str = "devices.dat";

const BASE_FIELDS: usize = 8;
const CLIMATE_FIELDS: usize = 4;
const SECURITY_FIELDS: usize = 3;

impl Record for Device {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        let mut fields = vec![
            self.id.clone(),
            self.name.clone(),
            self.manufacturer.clone(),
            self.kind.code().to_string(),
            encode_ref(self.room_id.as_deref()).to_string(),
            encode_flag(self.is_on()).to_string(),
            encode_flag(self.is_online).to_string(),
            encode_f64(self.power_watts()),
        ];

        match self.variant() {
            DeviceVariant::Standard => {}
            DeviceVariant::Climate(state) => {
                fields.push(encode_f64(state.target_temperature));
                fields.push(encode_f64(state.current_temperature));
                fields.push(encode_f64(state.humidity));
                fields.push(encode_flag(state.auto_mode).to_string());
            }
            DeviceVariant::Security(state) => {
                fields.push(encode_flag(state.is_armed).to_string());
                fields.push(state.sensitivity_level().to_string());
                fields.push(encode_flag(state.motion_detected).to_string());
                fields.extend(state.access_codes().map(str::to_string));
            }
        }

        join_fields(fields)
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::new(line, BASE_FIELDS, None)?;

        let id = reader.string();
        let name = reader.string();
        let manufacturer = reader.string();
        let kind = reader.code("kind", DeviceKind::from_code)?;
        let room_id = reader.reference();
        let is_on = reader.flag("is_on")?;
        let is_online = reader.flag("is_online")?;
        let power_watts = reader.f64("power_watts")?;

        // Clamps out-of-range power with a warning
        let mut device = Device::new(id, name, manufacturer, kind, power_watts);
        device.room_id = room_id;
        device.restore_power_state(is_on);
        device.set_online(is_online);

        let extra = reader.remaining();
        match kind {
            _ if extra == 0 => {}
            DeviceKind::ClimateControl if extra == CLIMATE_FIELDS => {
                let target_temperature = reader.f64("target_temperature")?;
                let current_temperature = reader.f64("current_temperature")?;
                let humidity = reader.f64("humidity")?;
                let auto_mode = reader.flag("auto_mode")?;
                if let Some(state) = device.climate_state_mut() {
                    state.target_temperature = target_temperature;
                    state.current_temperature = current_temperature;
                    state.humidity = humidity;
                    state.auto_mode = auto_mode;
                }
            }
            DeviceKind::Security if extra >= SECURITY_FIELDS => {
                let is_armed = reader.flag("is_armed")?;
                let sensitivity: i64 = reader.int("sensitivity")?;
                let motion_detected = reader.flag("motion_detected")?;
                let codes = reader.rest();
                if let Some(state) = device.security_state_mut() {
                    state.is_armed = is_armed;
                    state.motion_detected = motion_detected;
                    // Out-of-range levels keep the default
                    state.set_sensitivity(sensitivity);
                    state.clear_access_codes();
                    for code in codes {
                        state.add_access_code(code);
                    }
                }
            }
            _ => {
                let expected = match kind {
                    DeviceKind::ClimateControl => format!("{} or {}", BASE_FIELDS, BASE_FIELDS + CLIMATE_FIELDS),
                    DeviceKind::Security => {
                        format!("{} or at least {}", BASE_FIELDS, BASE_FIELDS + SECURITY_FIELDS)
                    }
                    _ => BASE_FIELDS.to_string(),
                };
                return Err(CodecError::FieldCount {
                    expected,
                    found: BASE_FIELDS + extra,
                });
            }
        }

        Ok(device)
    }
}

/// Device Registry
pub struct DeviceRegistry {
    devices: Registry<Device>,

    /// Devices currently held
    live_count: usize,

    /// Devices ever registered since start-up, including loaded ones
    total_registered: u64,
}

impl DeviceRegistry {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            devices: Registry::new(storage),
            live_count: 0,
            total_registered: 0,
        }
    }

    /// Load from storage, replacing the current contents
    pub fn load(&mut self) -> StorageResult<Vec<RejectedLine>> {
        let rejected = self.devices.load()?;
        self.live_count = self.devices.len();
        self.total_registered += self.devices.len() as u64;
        info!("Loaded {} devices from storage", self.devices.len());
        Ok(rejected)
    }

    pub fn save(&self) -> StorageResult<()> {
        self.devices.save()
    }

    /// Register a device
    ///
    /// A device with an existing id replaces the old one in place and the
    /// replaced device is returned.
    pub fn register(&mut self, device: Device) -> Option<Device> {
        info!("Registered device: {} ({})", device.name, device.id);
        let replaced = self.devices.insert(device);
        if replaced.is_none() {
            self.live_count += 1;
        }
        self.total_registered += 1;
        replaced
    }

    /// Remove a device
    pub fn remove(&mut self, device_id: &str) -> Option<Device> {
        let removed = self.devices.remove(device_id)?;
        self.live_count -= 1;
        info!("Removed device: {} ({})", removed.name, device_id);
        Some(removed)
    }

    pub fn get(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn get_mut(&mut self, device_id: &str) -> Option<&mut Device> {
        self.devices.get_mut(device_id)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.devices.contains(device_id)
    }

    pub fn update<F>(&mut self, device_id: &str, f: F) -> Option<&Device>
    where
        F: FnOnce(&mut Device),
    {
        self.devices.update(device_id, f)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> + '_ {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> + '_ {
        self.devices.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.devices.ids()
    }

    pub fn next_sequential_id(&self, prefix: &str) -> String {
        self.devices.next_sequential_id(prefix)
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    pub fn total_registered(&self) -> u64 {
        self.total_registered
    }

    /// Devices that are switched on
    pub fn active_count(&self) -> usize {
        self.iter().filter(|d| d.is_on()).count()
    }

    /// Current draw of all devices that are on and online, in watts
    pub fn total_power(&self) -> f64 {
        self.iter()
            .filter(|d| d.is_on() && d.is_online)
            .map(Device::power_watts)
            .sum()
    }

    /// All devices ordered by power draw; equal draws keep registration order
    pub fn sorted_by_power(&self, ascending: bool) -> Vec<&Device> {
        let mut devices: Vec<&Device> = self.iter().collect();
        devices.sort_by(|a, b| {
            let ord = a.power_watts().total_cmp(&b.power_watts());
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        devices
    }

    /// All devices ordered by name, case-insensitive
    pub fn sorted_by_name(&self) -> Vec<&Device> {
        let mut devices: Vec<&Device> = self.iter().collect();
        devices.sort_by(|a, b| match a.name.to_lowercase().cmp(&b.name.to_lowercase()) {
            Ordering::Equal => a.name.cmp(&b.name),
            ord => ord,
        });
        devices
    }

    pub fn in_room(&self, room_id: &str) -> Vec<&Device> {
        self.iter()
            .filter(|d| d.room_id.as_deref() == Some(room_id))
            .collect()
    }

    /// Devices by manufacturer, case-insensitive
    pub fn by_manufacturer(&self, manufacturer: &str) -> Vec<&Device> {
        let wanted = manufacturer.to_lowercase();
        self.iter()
            .filter(|d| d.manufacturer.to_lowercase() == wanted)
            .collect()
    }

    pub fn by_kind(&self, kind: DeviceKind) -> Vec<&Device> {
        self.iter().filter(|d| d.kind == kind).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Device> {
        self.iter().find(|d| d.name == name)
    }

    /// Devices drawing strictly more than `watts`
    pub fn above_power(&self, watts: f64) -> Vec<&Device> {
        self.iter().filter(|d| d.power_watts() > watts).collect()
    }
}

impl DeviceStore for DeviceRegistry {
    fn device(&self, id: &str) -> Option<&Device> {
        self.get(id)
    }

    fn device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.get_mut(id)
    }
}
