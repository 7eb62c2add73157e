//! Room Registry
//!
//! Record format: `id|name|areaSqm`. Membership is not stored here; it is
//! rebuilt from the devices' room references after loading.

use sh_core::Room;

use crate::codec::{encode_f64, join_fields, CodecResult, FieldReader};
use crate::registry::Registry;
use crate::storage::Record;

/// Data file for rooms
pub const STORAGE_KEY: &str = "rooms.dat";

pub type RoomRegistry = Registry<Room>;

impl Record for Room {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        join_fields([self.id.clone(), self.name.clone(), encode_f64(self.area_sqm)])
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::exact(line, 3)?;
        let id = reader.string();
        let name = reader.string();
        let area_sqm = reader.f64("area_sqm")?;
        Ok(Room::new(id, name, area_sqm))
    }
}

impl Registry<Room> {
    /// First room with the given name
    pub fn find_by_name(&self, name: &str) -> Option<&Room> {
        self.iter().find(|room| room.name == name)
    }

    /// Rooms with no member devices
    pub fn empty_rooms(&self) -> Vec<&Room> {
        self.iter().filter(|room| room.is_empty()).collect()
    }
}
