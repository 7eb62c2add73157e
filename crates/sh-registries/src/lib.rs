//! Smart Home Registries
//!
//! This crate provides persistent registries for tracking:
//! - Rooms (RoomRegistry)
//! - Devices (DeviceRegistry)
//! - Users (UserRegistry)
//! - Notifications (NotificationRegistry)
//! - Energy reports (ReportRegistry)
//!
//! Every registry persists to one pipe-delimited file in the data directory.
//! Loading only decodes records; cross-references between them are resolved
//! by the caller once everything is in memory.

pub mod codec;
pub mod storage;

mod registry;

pub mod device_registry;
pub mod notification_registry;
pub mod report_registry;
pub mod room_registry;
pub mod user_registry;

// Re-export main types
pub use codec::{CodecError, CodecResult};
pub use storage::{Loaded, Record, RejectedLine, Storage, StorageError, StorageResult};

pub use registry::Registry;

pub use device_registry::DeviceRegistry;
pub use notification_registry::NotificationRegistry;
pub use report_registry::ReportRegistry;
pub use room_registry::RoomRegistry;
pub use user_registry::UserRegistry;

use std::path::Path;
use std::sync::Arc;

/// All registries bundled together
pub struct Registries {
    pub storage: Arc<Storage>,
    pub rooms: RoomRegistry,
    pub devices: DeviceRegistry,
    pub users: UserRegistry,
    pub notifications: NotificationRegistry,
    pub reports: ReportRegistry,
}

impl Registries {
    /// Create empty registries backed by the given data directory
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let storage = Arc::new(Storage::new(data_dir));

        Self {
            rooms: RoomRegistry::new(storage.clone()),
            devices: DeviceRegistry::new(storage.clone()),
            users: UserRegistry::new(storage.clone()),
            notifications: NotificationRegistry::new(storage.clone()),
            reports: ReportRegistry::new(storage.clone()),
            storage,
        }
    }

    /// Load all registries from storage
    ///
    /// Returns every line that could not be decoded, in load order.
    pub fn load_all(&mut self) -> StorageResult<Vec<RejectedLine>> {
        let mut rejected = self.rooms.load()?;
        rejected.extend(self.devices.load()?);
        rejected.extend(self.users.load()?);
        rejected.extend(self.notifications.load()?);
        rejected.extend(self.reports.load()?);
        Ok(rejected)
    }

    /// Save all registries to storage
    pub fn save_all(&self) -> StorageResult<()> {
        self.rooms.save()?;
        self.devices.save()?;
        self.users.save()?;
        self.notifications.save()?;
        self.reports.save()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_core::{AccessLevel, Device, DeviceKind, NotificationType, Room, User};
    use tempfile::TempDir;

    #[test]
    fn test_registries_bundle() {
        let temp_dir = TempDir::new().unwrap();
        let mut registries = Registries::new(temp_dir.path());

        registries.rooms.insert(Room::new("R1", "Living Room", 20.0));
        registries
            .devices
            .register(Device::new("D1", "Lamp", "X", DeviceKind::Actuator, 15.0).with_room("R1"));
        registries
            .users
            .insert(User::new("U1", "admin", "admin", AccessLevel::Admin, "", ""));
        registries
            .notifications
            .create(NotificationType::Info, "Welcome", None, None);
        let report = registries.reports.draft(chrono::Utc::now(), chrono::Utc::now());
        registries.reports.insert(report);

        registries.save_all().unwrap();

        let mut registries2 = Registries::new(temp_dir.path());
        let rejected = registries2.load_all().unwrap();

        assert!(rejected.is_empty());
        assert_eq!(registries2.rooms.len(), 1);
        assert_eq!(registries2.devices.len(), 1);
        assert_eq!(registries2.users.len(), 1);
        assert_eq!(registries2.notifications.len(), 1);
        assert_eq!(registries2.reports.len(), 1);
    }

    #[test]
    fn test_load_all_collects_rejections() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());
        storage.write_lines("rooms.dat", ["R1|Kitchen|x"]).unwrap();
        storage.write_lines("users.dat", ["U1|bob"]).unwrap();

        let mut registries = Registries::new(temp_dir.path());
        let rejected = registries.load_all().unwrap();

        let files: Vec<&str> = rejected.iter().map(|r| r.file).collect();
        assert_eq!(files, vec!["rooms.dat", "users.dat"]);
        assert!(registries.rooms.is_empty());
    }
}
