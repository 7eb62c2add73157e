//! Energy reports and cost helpers

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::device::Device;
use crate::entity::Entity;

/// Cost of running a load for a number of hours, rounded to cents
pub fn energy_cost(watts: f64, hours: f64, cost_per_kwh: f64) -> f64 {
    let kwh = watts * hours / 1000.0;
    (kwh * cost_per_kwh * 100.0).round() / 100.0
}

/// Cost of running a device at its current draw; zero when it is off
pub fn device_energy_cost(device: &Device, hours: f64, cost_per_kwh: f64) -> f64 {
    if device.is_on() {
        energy_cost(device.power_watts(), hours, cost_per_kwh)
    } else {
        0.0
    }
}

/// Per-device consumption samples over a period
///
/// `total_consumption` and `peak_load` are only refreshed by
/// [`EnergyReport::generate_report`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyReport {
    pub id: String,

    pub period_start: DateTime<Utc>,

    pub period_end: DateTime<Utc>,

    pub total_consumption: f64,

    pub peak_load: f64,

    /// Device id -> kWh, in first-insertion order
    samples: IndexMap<String, f64>,
}

impl EnergyReport {
    pub fn new(id: impl Into<String>, period_start: DateTime<Utc>, period_end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            period_start,
            period_end,
            total_consumption: 0.0,
            peak_load: 0.0,
            samples: IndexMap::new(),
        }
    }

    /// Set the sample for a device; an existing sample keeps its position
    ///
    /// Negative or non-finite readings are stored as 0 kWh with a warning.
    /// Returns false when the reading was replaced.
    pub fn add_device_consumption(&mut self, device_id: impl Into<String>, kwh: f64) -> bool {
        let device_id = device_id.into();
        let accepted = kwh.is_finite() && kwh >= 0.0;
        if !accepted {
            warn!(
                "Report {}: sample {} kWh for {} is invalid, storing 0 kWh",
                self.id, kwh, device_id
            );
        }
        self.samples
            .insert(device_id, if accepted { kwh } else { 0.0 });
        accepted
    }

    pub fn samples(&self) -> impl Iterator<Item = (&str, f64)> {
        self.samples.iter().map(|(id, kwh)| (id.as_str(), *kwh))
    }

    pub fn sample(&self, device_id: &str) -> Option<f64> {
        self.samples.get(device_id).copied()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Recompute total and peak from the current samples
    pub fn generate_report(&mut self) {
        self.total_consumption = self.samples.values().sum();
        self.peak_load = self
            .samples
            .values()
            .copied()
            .reduce(f64::max)
            .unwrap_or(0.0);
    }

    /// Ids of the `n` largest samples, ties kept in insertion order
    pub fn top_consuming_devices(&self, n: usize) -> Vec<&str> {
        let mut ranked: Vec<(&str, f64)> = self.samples().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.into_iter().take(n).map(|(id, _)| id).collect()
    }

    /// Mean sample value from the last generated total; zero without samples
    pub fn average_consumption(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.total_consumption / self.samples.len() as f64
        }
    }
}

impl Entity for EnergyReport {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.period_end
    }
}

impl PartialEq for EnergyReport {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EnergyReport {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceKind;

    fn report() -> EnergyReport {
        let now = Utc::now();
        EnergyReport::new("RPT1", now - chrono::Duration::hours(24), now)
    }

    #[test]
    fn test_generate_report_totals() {
        let mut report = report();
        report.add_device_consumption("D1", 10.0);
        report.add_device_consumption("D2", 30.0);
        report.add_device_consumption("D3", 20.0);

        assert_eq!(report.total_consumption, 0.0);
        report.generate_report();

        assert_eq!(report.total_consumption, 60.0);
        assert_eq!(report.peak_load, 30.0);
        assert_eq!(report.top_consuming_devices(2), vec!["D2", "D3"]);
        assert_eq!(report.average_consumption(), 20.0);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut report = report();
        report.add_device_consumption("D1", 5.0);
        report.add_device_consumption("D2", 5.0);
        report.add_device_consumption("D1", 7.0);

        assert_eq!(report.sample_count(), 2);
        assert_eq!(report.sample("D1"), Some(7.0));
        assert_eq!(report.samples().next(), Some(("D1", 7.0)));
    }

    #[test]
    fn test_top_devices_ties_keep_insertion_order() {
        let mut report = report();
        report.add_device_consumption("A", 1.0);
        report.add_device_consumption("B", 4.0);
        report.add_device_consumption("C", 4.0);
        report.add_device_consumption("D", 4.0);

        assert_eq!(report.top_consuming_devices(3), vec!["B", "C", "D"]);
        assert_eq!(report.top_consuming_devices(10).len(), 4);
        assert!(report.top_consuming_devices(0).is_empty());
    }

    #[test]
    fn test_invalid_samples_are_zeroed() {
        let mut report = report();
        assert!(report.add_device_consumption("D1", 4.0));
        assert!(!report.add_device_consumption("D2", -3.0));
        assert!(!report.add_device_consumption("D3", f64::NAN));
        assert!(!report.add_device_consumption("D4", f64::INFINITY));

        assert_eq!(report.sample("D2"), Some(0.0));
        assert_eq!(report.sample("D3"), Some(0.0));
        report.generate_report();
        assert_eq!(report.total_consumption, 4.0);
        assert_eq!(report.peak_load, 4.0);
    }

    #[test]
    fn test_peak_of_zero_samples() {
        let mut report = report();
        report.add_device_consumption("D1", 0.0);
        report.add_device_consumption("D2", -1.0);
        report.generate_report();
        assert_eq!(report.peak_load, 0.0);
        assert_eq!(report.top_consuming_devices(1), vec!["D1"]);
    }

    #[test]
    fn test_empty_report() {
        let mut report = report();
        report.generate_report();
        assert_eq!(report.total_consumption, 0.0);
        assert_eq!(report.peak_load, 0.0);
        assert_eq!(report.average_consumption(), 0.0);
    }

    #[test]
    fn test_energy_cost() {
        assert_eq!(energy_cost(1000.0, 2.0, 0.15), 0.3);
        assert_eq!(energy_cost(100.0, 10.0, 0.2), 0.2);

        let mut heater = Device::new("D1", "Heater", "X", DeviceKind::Actuator, 2000.0);
        assert_eq!(device_energy_cost(&heater, 1.0, 0.2), 0.0);
        heater.turn_on();
        assert_eq!(device_energy_cost(&heater, 1.0, 0.2), 0.4);
    }
}
