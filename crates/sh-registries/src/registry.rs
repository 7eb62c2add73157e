//! Id-indexed registry shared by every record type
//!
//! Entries are kept in insertion order, which is also the order they are
//! written back to disk.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use sh_core::Entity;
use tracing::{debug, warn};

use crate::codec::CodecError;
use crate::storage::{Record, RejectedLine, Storage, StorageResult};

/// Registry of entities of one type, backed by one record file
#[derive(Debug)]
pub struct Registry<T> {
    storage: Arc<Storage>,

    /// Primary index: id -> entry
    by_id: IndexMap<String, T>,

    /// Ids removed since creation; never handed out again
    retired: HashSet<String>,
}

impl<T: Record + Entity> Registry<T> {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            storage,
            by_id: IndexMap::new(),
            retired: HashSet::new(),
        }
    }

    /// Replace the contents with the records on disk
    ///
    /// Undecodable lines and repeated ids are returned as rejected; the first
    /// occurrence of an id wins.
    pub fn load(&mut self) -> StorageResult<Vec<RejectedLine>> {
        let loaded = self.storage.load::<T>()?;
        let mut rejected = loaded.rejected;

        self.by_id.clear();
        for (line, entry) in loaded.records {
            if self.by_id.contains_key(entry.id()) {
                warn!("Skipping {}:{}: duplicate id '{}'", T::KEY, line, entry.id());
                rejected.push(RejectedLine {
                    file: T::KEY,
                    line,
                    error: CodecError::DuplicateId(entry.id().to_string()),
                });
                continue;
            }
            self.by_id.insert(entry.id().to_string(), entry);
        }

        debug!("Loaded {} entries from {}", self.by_id.len(), T::KEY);
        Ok(rejected)
    }

    /// Write every entry to disk
    pub fn save(&self) -> StorageResult<()> {
        self.storage.save(self.by_id.values())?;
        Ok(())
    }

    /// Insert an entry, replacing (in place) any entry with the same id
    pub fn insert(&mut self, entry: T) -> Option<T> {
        self.by_id.insert(entry.id().to_string(), entry)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.by_id.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Apply a change to an entry
    ///
    /// Returns the updated entry, or None if the id is unknown.
    pub fn update<F>(&mut self, id: &str, f: F) -> Option<&T>
    where
        F: FnOnce(&mut T),
    {
        let entry = self.by_id.get_mut(id)?;
        f(entry);
        Some(entry)
    }

    /// Remove an entry, keeping the order of the rest
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.by_id.shift_remove(id)?;
        self.retired.insert(id.to_string());
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.by_id.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.by_id.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_id.keys().map(String::as_str)
    }

    /// Next free id of the form `<prefix><n>`
    ///
    /// `n` is one past the highest number in use or removed with that
    /// prefix, so an id that still dangles somewhere is never handed out to
    /// a new entry.
    pub fn next_sequential_id(&self, prefix: &str) -> String {
        let highest = self
            .by_id
            .keys()
            .chain(&self.retired)
            .filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{}", prefix, highest + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sh_core::Room;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> Registry<Room> {
        Registry::new(Arc::new(Storage::new(dir.path())))
    }

    #[test]
    fn test_insert_update_remove() {
        let temp_dir = TempDir::new().unwrap();
        let mut rooms = registry(&temp_dir);

        assert!(rooms.insert(Room::new("R1", "Kitchen", 10.0)).is_none());
        rooms.insert(Room::new("R2", "Hall", 5.0));
        rooms.insert(Room::new("R3", "Bath", 4.0));

        let updated = rooms.update("R2", |r| r.name = "Hallway".to_string());
        assert_eq!(updated.map(|r| r.name.as_str()), Some("Hallway"));
        assert!(rooms.update("R9", |_| {}).is_none());

        assert!(rooms.remove("R2").is_some());
        assert_eq!(rooms.ids().collect::<Vec<_>>(), vec!["R1", "R3"]);

        // Replacement keeps position
        rooms.insert(Room::new("R1", "Kitchen", 11.0));
        assert_eq!(rooms.ids().next(), Some("R1"));
        assert_eq!(rooms.len(), 2);
    }

    #[test]
    fn test_next_sequential_id_never_reuses_numbers() {
        let temp_dir = TempDir::new().unwrap();
        let mut rooms = registry(&temp_dir);
        assert_eq!(rooms.next_sequential_id("R"), "R1");

        rooms.insert(Room::new("R1", "A", 1.0));
        rooms.insert(Room::new("R7", "B", 1.0));
        rooms.insert(Room::new("Rx", "C", 1.0));
        assert_eq!(rooms.next_sequential_id("R"), "R8");

        rooms.remove("R7");
        assert_eq!(rooms.next_sequential_id("R"), "R8");
        assert!(rooms.remove("R7").is_none());

        rooms.insert(Room::new("R8", "D", 1.0));
        rooms.remove("R8");
        rooms.remove("R1");
        assert_eq!(rooms.next_sequential_id("R"), "R9");
    }

    #[test]
    fn test_duplicate_ids_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path());
        storage
            .write_lines("rooms.dat", ["R1|Kitchen|10", "R1|Copy|12", "R2|Hall|5"])
            .unwrap();

        let mut rooms = registry(&temp_dir);
        let rejected = rooms.load().unwrap();

        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms.get("R1").unwrap().name, "Kitchen");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].line, 2);
        assert_eq!(rejected[0].error, CodecError::DuplicateId("R1".to_string()));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut rooms = registry(&temp_dir);
        rooms.insert(Room::new("R1", "Living | dining", 30.5));
        rooms.save().unwrap();

        let mut reloaded = registry(&temp_dir);
        assert!(reloaded.load().unwrap().is_empty());
        let room = reloaded.get("R1").unwrap();
        assert_eq!(room.name, "Living | dining");
        assert_eq!(room.area_sqm, 30.5);
    }
}
