//! Core types for the smart home
//!
//! This crate provides the domain model shared by every other crate:
//! entities with identity and creation time, the polymorphic device model
//! (standard, climate and security variants), rooms, users with their
//! activity history, notifications and energy reports.
//!
//! Nothing here performs I/O. Cross-entity relationships are expressed as
//! id handles and resolved through a [`DeviceStore`].

mod device;
mod energy;
mod entity;
mod notification;
mod room;
mod store;
mod user;

pub use device::{
    ClimateState, DiagnosticReport, Device, DeviceKind, DeviceVariant, PowerUpdate,
    SecurityState,
};
pub use energy::{device_energy_cost, energy_cost, EnergyReport};
pub use entity::{timestamp_from_epoch, validate_entity_id, Entity, EntityIdError};
pub use notification::{Notification, NotificationType};
pub use room::Room;
pub use store::DeviceStore;
pub use user::{validate_password, AccessLevel, Activity, PasswordError, User};

/// Upper bound for a device's power draw, in watts
pub const MAX_POWER_WATTS: f64 = 10_000.0;

/// Sentinel written in place of an absent cross-entity reference
pub const NULL_REF: &str = "NULL";

/// Power draw above which a device self-check flags high consumption, in watts
pub const HIGH_CONSUMPTION_WATTS: f64 = 1_000.0;
