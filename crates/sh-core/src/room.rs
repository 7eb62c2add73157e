//! Rooms and their device membership

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::{Device, DeviceKind};
use crate::entity::Entity;
use crate::store::DeviceStore;

/// A physical space holding devices by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,

    pub name: String,

    /// Floor area in square metres
    pub area_sqm: f64,

    pub created_at: DateTime<Utc>,

    /// Member device ids in insertion order
    #[serde(default)]
    device_ids: Vec<String>,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>, area_sqm: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            area_sqm,
            created_at: Utc::now(),
            device_ids: Vec::new(),
        }
    }

    /// Append a device; returns false if it is already a member
    pub fn add_device(&mut self, device_id: impl Into<String>) -> bool {
        let device_id = device_id.into();
        if self.contains(&device_id) {
            return false;
        }
        debug!("Room {}: added device {}", self.id, device_id);
        self.device_ids.push(device_id);
        true
    }

    /// Remove the first membership entry for a device
    ///
    /// The device itself is untouched.
    pub fn remove_device(&mut self, device_id: &str) -> bool {
        match self.device_ids.iter().position(|id| id == device_id) {
            Some(index) => {
                self.device_ids.remove(index);
                debug!("Room {}: removed device {}", self.id, device_id);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.device_ids.iter().any(|id| id == device_id)
    }

    pub fn device_ids(&self) -> &[String] {
        &self.device_ids
    }

    pub fn device_count(&self) -> usize {
        self.device_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.device_ids.is_empty()
    }

    /// Member devices that resolve in the store, in membership order
    pub fn devices<'a, S: DeviceStore>(&'a self, store: &'a S) -> impl Iterator<Item = &'a Device> {
        self.device_ids.iter().filter_map(|id| store.device(id))
    }

    /// First member whose name matches exactly
    pub fn find_device_by_name<'a, S: DeviceStore>(
        &'a self,
        store: &'a S,
        name: &str,
    ) -> Option<&'a Device> {
        self.devices(store).find(|d| d.name == name)
    }

    pub fn devices_by_kind<'a, S: DeviceStore>(
        &'a self,
        store: &'a S,
        kind: DeviceKind,
    ) -> Vec<&'a Device> {
        self.devices(store).filter(|d| d.kind == kind).collect()
    }

    /// Total power draw of member devices that are on and online, in watts
    pub fn calculate_room_power_consumption<S: DeviceStore>(&self, store: &S) -> f64 {
        self.devices(store)
            .filter(|d| d.is_on() && d.is_online)
            .map(Device::power_watts)
            .sum()
    }
}

impl Entity for Room {
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

impl PartialEq for Room {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Room {}
