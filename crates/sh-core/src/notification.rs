//! Typed, priority-ranked notifications

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::Entity;

/// Notification severity
///
/// The numeric codes are part of the record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Info = 0,
    Warning = 1,
    Alert = 2,
}

impl NotificationType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(NotificationType::Info),
            1 => Some(NotificationType::Warning),
            2 => Some(NotificationType::Alert),
            _ => None,
        }
    }

    /// Ranking used for ordering, Alert highest
    pub fn priority(self) -> u8 {
        match self {
            NotificationType::Info => 1,
            NotificationType::Warning => 2,
            NotificationType::Alert => 3,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::Info => f.write_str("INFO"),
            NotificationType::Warning => f.write_str("WARNING"),
            NotificationType::Alert => f.write_str("ALERT"),
        }
    }
}

/// A message optionally linked to a device and/or scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NotificationType,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,

    pub timestamp: DateTime<Utc>,

    pub is_read: bool,
}

impl Notification {
    /// Create an unread notification stamped with the current time
    pub fn new(id: impl Into<String>, kind: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            message: message.into(),
            device_id: None,
            scenario_id: None,
            timestamp: Utc::now(),
            is_read: false,
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_scenario(mut self, scenario_id: impl Into<String>) -> Self {
        self.scenario_id = Some(scenario_id.into());
        self
    }

    pub fn priority(&self) -> u8 {
        self.kind.priority()
    }

    /// Deliver the notification, resetting it to unread
    pub fn send(&mut self) {
        self.is_read = false;
        info!("[{}] {}: {}", self.id, self.kind, self.message);
    }

    pub fn mark_as_read(&mut self) {
        self.is_read = true;
    }
}

impl Entity for Notification {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.message
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl PartialEq for Notification {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Notification {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ranking() {
        assert_eq!(NotificationType::Alert.priority(), 3);
        assert_eq!(NotificationType::Warning.priority(), 2);
        assert_eq!(NotificationType::Info.priority(), 1);
        assert_eq!(NotificationType::from_code(2), Some(NotificationType::Alert));
        assert_eq!(NotificationType::from_code(3), None);
    }

    #[test]
    fn test_read_state() {
        let mut n = Notification::new("N1", NotificationType::Warning, "Door open").with_device("D1");
        assert!(!n.is_read);
        assert_eq!(n.device_id.as_deref(), Some("D1"));

        n.mark_as_read();
        assert!(n.is_read);

        n.send();
        assert!(!n.is_read);
    }
}
