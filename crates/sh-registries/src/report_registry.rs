//! Energy Report Registry
//!
//! Record format: `id|periodStart|periodEnd|total|peak|sampleCount[|deviceId:kWh]*`.
//! Stored totals are restored as written, not recomputed.

use chrono::{DateTime, Utc};
use sh_core::EnergyReport;
use tracing::debug;

use crate::codec::{encode_f64, join_fields, parse_f64, CodecError, CodecResult, FieldReader};
use crate::registry::Registry;
use crate::storage::Record;

/// Data file for energy reports
pub const STORAGE_KEY: &str = "reports.dat";

/// Prefix of generated report ids
pub const REPORT_ID_PREFIX: &str = "RPT";

const HEADER_FIELDS: usize = 6;

pub type ReportRegistry = Registry<EnergyReport>;

impl Record for EnergyReport {
    const KEY: &'static str = STORAGE_KEY;

    fn encode(&self) -> String {
        let mut fields = vec![
            self.id.clone(),
            self.period_start.timestamp().to_string(),
            self.period_end.timestamp().to_string(),
            encode_f64(self.total_consumption),
            encode_f64(self.peak_load),
            self.sample_count().to_string(),
        ];
        fields.extend(
            self.samples()
                .map(|(device_id, kwh)| format!("{}:{}", device_id, encode_f64(kwh))),
        );
        join_fields(fields)
    }

    fn decode(line: &str) -> CodecResult<Self> {
        let mut reader = FieldReader::new(line, HEADER_FIELDS, None)?;
        let id = reader.string();
        let period_start = reader.timestamp("period_start")?;
        let period_end = reader.timestamp("period_end")?;
        let total_consumption = reader.f64("total")?;
        let peak_load = reader.f64("peak")?;
        let sample_count: usize = reader.int("sample_count")?;

        let samples = reader.rest();
        if samples.len() != sample_count {
            return Err(CodecError::FieldCount {
                expected: sample_count.saturating_add(HEADER_FIELDS).to_string(),
                found: HEADER_FIELDS + samples.len(),
            });
        }

        let mut report = EnergyReport::new(id, period_start, period_end);
        for sample in samples {
            let (device_id, kwh) = sample.rsplit_once(':').ok_or_else(|| CodecError::InvalidEntry {
                field: "sample",
                value: sample.clone(),
            })?;
            let kwh = parse_f64("sample", kwh)?;
            if kwh < 0.0 {
                return Err(CodecError::InvalidNumber {
                    field: "sample",
                    value: sample.clone(),
                });
            }
            report.add_device_consumption(device_id, kwh);
        }
        report.total_consumption = total_consumption;
        report.peak_load = peak_load;
        Ok(report)
    }
}

impl Registry<EnergyReport> {
    /// Start a report for the period under the next free `RPT<n>` id
    ///
    /// The report is not stored; add samples, then [`Registry::insert`] it.
    pub fn draft(&self, period_start: DateTime<Utc>, period_end: DateTime<Utc>) -> EnergyReport {
        let id = self.next_sequential_id(REPORT_ID_PREFIX);
        debug!("Drafting energy report: {}", id);
        EnergyReport::new(id, period_start, period_end)
    }

    /// Most recent report by period end
    pub fn latest(&self) -> Option<&EnergyReport> {
        self.iter().max_by_key(|report| report.period_end)
    }

    /// Reports that list a sample for the device
    pub fn for_device(&self, device_id: &str) -> Vec<&EnergyReport> {
        self.iter()
            .filter(|report| report.sample(device_id).is_some())
            .collect()
    }
}
