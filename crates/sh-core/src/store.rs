//! Device lookup seam
//!
//! Rooms and scenarios hold device ids, not devices. Anything that resolves
//! those ids goes through [`DeviceStore`], so the domain types stay
//! independent of where devices actually live.

use crate::device::Device;

/// Resolve device ids to devices
pub trait DeviceStore {
    fn device(&self, id: &str) -> Option<&Device>;

    fn device_mut(&mut self, id: &str) -> Option<&mut Device>;
}

impl DeviceStore for Vec<Device> {
    fn device(&self, id: &str) -> Option<&Device> {
        self.iter().find(|d| d.id == id)
    }

    fn device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.iter_mut().find(|d| d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceKind;

    #[test]
    fn test_vec_store_lookup() {
        let mut devices = vec![
            Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 10.0),
            Device::new("D2", "Fan", "X", DeviceKind::Actuator, 40.0),
        ];
        assert_eq!(devices.device("D2").map(|d| d.name.as_str()), Some("Fan"));
        assert!(devices.device("D3").is_none());

        devices.device_mut("D1").unwrap().turn_on();
        assert!(devices.device("D1").unwrap().is_on());
    }
}
