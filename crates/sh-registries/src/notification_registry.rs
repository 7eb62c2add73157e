//! Notification Registry
//!
//! Record format: `id|type|message|deviceIdOrNULL|scenarioIdOrNULL|timestamp|isRead`.

use sh_core::{Notification, NotificationType};
use tracing::info;

use crate::codec::{encode_flag, encode_ref, join_fields, CodecResult, FieldReader};
use crate::registry::Registry;
use crate::storage::Record;

/// Data file for notifications
pub const STORAGE_KEY: &str = "notifications.dat";

pub type NotificationRegistry = Registry<Notification>;

impl Record for Notification {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        let kind = self.kind.code().to_string();
        let timestamp = self.timestamp.timestamp().to_string();
        join_fields([
            self.id.as_str(),
            kind.as_str(),
            self.message.as_str(),
            encode_ref(self.device_id.as_deref()),
            encode_ref(self.scenario_id.as_deref()),
            timestamp.as_str(),
            encode_flag(self.is_read),
        ])
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::exact(line, 7)?;
        let id = reader.string();
        let kind = reader.code("type", NotificationType::from_code)?;
        let message = reader.string();
        let device_id = reader.reference();
        let scenario_id = reader.reference();
        let timestamp = reader.timestamp("timestamp")?;
        let is_read = reader.flag("is_read")?;

        let mut notification = Notification::new(id, kind, message);
        notification.device_id = device_id;
        notification.scenario_id = scenario_id;
        notification.timestamp = timestamp;
        notification.is_read = is_read;
        Ok(notification)
    }
}

impl Registry<Notification> {
    /// Create, send and store a notification under the next free id
    ///
    /// Returns the new notification's id.
    pub fn create(
        &mut self,
        kind: NotificationType,
        message: impl Into<String>,
        device_id: Option<String>,
        scenario_id: Option<String>,
    ) -> String {
        let id = self.next_sequential_id("N");
        let mut notification = Notification::new(id.clone(), kind, message);
        notification.device_id = device_id;
        notification.scenario_id = scenario_id;
        notification.send();
        info!("Created notification: {}", id);
        self.insert(notification);
        id
    }

    /// Unread notifications in insertion order
    pub fn unread(&self) -> Vec<&Notification> {
        self.iter().filter(|n| !n.is_read).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.iter().filter(|n| !n.is_read).count()
    }

    /// All notifications, highest priority first; equal priorities keep insertion order
    pub fn by_priority(&self) -> Vec<&Notification> {
        let mut all: Vec<&Notification> = self.iter().collect();
        all.sort_by(|a, b| b.priority().cmp(&a.priority()));
        all
    }

    pub fn for_device(&self, device_id: &str) -> Vec<&Notification> {
        self.iter()
            .filter(|n| n.device_id.as_deref() == Some(device_id))
            .collect()
    }

    pub fn mark_as_read(&mut self, id: &str) -> bool {
        self.update(id, Notification::mark_as_read).is_some()
    }

    /// Mark everything read; returns how many changed
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.iter_mut().filter(|n| !n.is_read) {
            notification.mark_as_read();
            changed += 1;
        }
        changed
    }
}
