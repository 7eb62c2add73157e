//! Two-phase loading
//!
//! Phase one decodes every record file on its own. Phase two runs once all
//! collections are in memory and resolves the ids records hold for each
//! other:
//!
//! ```text
//! rooms ─┐
//!        ├─> devices.room_id ──> room membership
//! devices┤
//!        ├─> actions.device_id
//!        └─> notifications.device_id
//! scenarios ─> actions.scenario_id, notifications.scenario_id
//! ```
//!
//! A record whose reference cannot be resolved is dropped and reported; the
//! load carries on. Energy report samples are historical and keep the ids of
//! devices that may since have been removed, so they are not resolved.

use std::fmt;

use serde::Serialize;
use sh_automation::ActionRecord;
use sh_registries::{device_registry, notification_registry, RejectedLine};
use tracing::warn;

use crate::error::HomeResult;
use crate::home::Home;

/// A reference to a record that does not exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    /// File holding the dropped record
    pub file: &'static str,
    pub record_id: String,
    /// Field holding the reference
    pub field: &'static str,
    /// The id that could not be found
    pub target_id: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} dropped, {} '{}' not found",
            self.file, self.record_id, self.field, self.target_id
        )
    }
}

/// Everything a load skipped
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Lines that could not be decoded
    pub rejected: Vec<RejectedLine>,
    /// Records dropped during reference resolution
    pub unresolved: Vec<UnresolvedReference>,
}

impl LoadReport {
    /// True if nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.unresolved.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.rejected.len() + self.unresolved.len()
    }

    fn unresolved(&mut self, reference: UnresolvedReference) {
        warn!("{}", reference);
        self.unresolved.push(reference);
    }
}

impl Home {
    /// Attach each device to its room, dropping devices whose room is gone
    ///
    /// Room membership is not stored; it is rebuilt here in device file order.
    pub(crate) fn resolve_device_rooms(&mut self, report: &mut LoadReport) {
        let registries = &mut self.registries;
        let mut dangling = Vec::new();

        for device in registries.devices.iter() {
            let Some(room_id) = device.room_id.as_deref() else {
                continue;
            };
            match registries.rooms.get_mut(room_id) {
                Some(room) => {
                    room.add_device(device.id.clone());
                }
                None => dangling.push((device.id.clone(), room_id.to_string())),
            }
        }

        for (device_id, room_id) in dangling {
            registries.devices.remove(&device_id);
            report.unresolved(UnresolvedReference {
                file: device_registry::STORAGE_KEY,
                record_id: device_id,
                field: "room_id",
                target_id: room_id,
            });
        }
    }

    /// Attach loaded actions to their scenarios in file order
    pub(crate) fn resolve_actions(
        &mut self,
        records: Vec<(usize, ActionRecord)>,
        report: &mut LoadReport,
    ) -> HomeResult<()> {
        for (_, record) in records {
            let record_id = format!("{}/{}", record.scenario_id, record.action.id);

            if !self.scenarios.contains(&record.scenario_id) {
                report.unresolved(UnresolvedReference {
                    file: sh_automation::action::STORAGE_KEY,
                    record_id,
                    field: "scenario_id",
                    target_id: record.scenario_id,
                });
                continue;
            }

            if let Some(device_id) = record.action.device_id.as_deref() {
                if !self.registries.devices.contains(device_id) {
                    let target_id = device_id.to_string();
                    report.unresolved(UnresolvedReference {
                        file: sh_automation::action::STORAGE_KEY,
                        record_id,
                        field: "device_id",
                        target_id,
                    });
                    continue;
                }
            }

            self.scenarios.attach_action(record)?;
        }
        Ok(())
    }

    /// Drop notifications naming a missing device or scenario
    pub(crate) fn resolve_notifications(&mut self, report: &mut LoadReport) {
        let mut dangling = Vec::new();

        for notification in self.registries.notifications.iter() {
            if let Some(device_id) = notification.device_id.as_deref() {
                if !self.registries.devices.contains(device_id) {
                    dangling.push((notification.id.clone(), "device_id", device_id.to_string()));
                    continue;
                }
            }
            if let Some(scenario_id) = notification.scenario_id.as_deref() {
                if !self.scenarios.contains(scenario_id) {
                    dangling.push((notification.id.clone(), "scenario_id", scenario_id.to_string()));
                }
            }
        }

        for (record_id, field, target_id) in dangling {
            self.registries.notifications.remove(&record_id);
            report.unresolved(UnresolvedReference {
                file: notification_registry::STORAGE_KEY,
                record_id,
                field,
                target_id,
            });
        }
    }
}
