//! Smart Home
//!
//! This crate ties the registries and the scenario manager together into a
//! single [`Home`] graph.
//!
//! # Loading
//!
//! ```text
//! data dir ──> decode every file ──> resolve ids ──> Home + LoadReport
//! ```
//!
//! Decoding failures and dangling references never abort a load; they are
//! collected in a [`LoadReport`]. Only I/O errors fail.
//!
//! # Key Types
//!
//! - [`Home`] - Owns every collection and performs cross-entity operations
//! - [`LoadReport`] - What a load skipped, and why
//! - [`HomeSummary`] - Serialisable status snapshot

mod error;
mod home;
mod load;
mod summary;

pub use error::{HomeError, HomeResult};
pub use home::{device_id_prefix, Home, ROOM_ID_PREFIX, USER_ID_PREFIX};
pub use load::{LoadReport, UnresolvedReference};
pub use summary::HomeSummary;
