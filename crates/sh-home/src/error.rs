//! Error types for home operations

use sh_automation::AutomationError;
use sh_core::{EntityIdError, PasswordError};
use sh_registries::StorageError;
use thiserror::Error;

/// Home errors
///
/// Every variant except `Storage` is returned before anything is changed.
#[derive(Debug, Error)]
pub enum HomeError {
    #[error("Room {room_id} still holds {device_count} device(s)")]
    RoomNotEmpty { room_id: String, device_count: usize },

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Notification not found: {0}")]
    NotificationNotFound(String),

    #[error("{kind} with ID {id} already exists")]
    DuplicateId { kind: &'static str, id: String },

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("Invalid credentials for {0}")]
    AuthenticationFailed(String),

    #[error("Invalid ID: {0}")]
    InvalidId(#[from] EntityIdError),

    #[error("Invalid password: {0}")]
    InvalidPassword(#[from] PasswordError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Automation error: {0}")]
    Automation(#[from] AutomationError),
}

/// Result type for home operations
pub type HomeResult<T> = Result<T, HomeError>;
