use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::anomaly::{write_lines, LogPaths};
use crate::constants::{COL_COUNTRY, COL_LOCATION};
use crate::error::{EtlError, Result};
use crate::reference::ReferenceData;

/// Values in a published operations file that the reference sets do not know.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub records: usize,
    pub unknown_countries: Vec<String>,
    pub unknown_locations: Vec<String>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.unknown_countries.is_empty() && self.unknown_locations.is_empty()
    }

    /// Write the non-empty unknown lists next to the pipeline's anomaly logs.
    pub fn write(&self, paths: &LogPaths) -> Result<()> {
        if !self.unknown_countries.is_empty() {
            write_lines(&paths.unknown_countries, &self.unknown_countries)?;
        }
        if !self.unknown_locations.is_empty() {
            write_lines(&paths.unknown_locations, &self.unknown_locations)?;
        }
        Ok(())
    }
}

/// Re-check an `operations_data.json` array against the reference sets.
pub fn audit_file(path: &Path, references: &ReferenceData) -> Result<AuditReport> {
    let content = fs::read_to_string(path)?;
    let records: Vec<Map<String, Value>> = serde_json::from_str(&content).map_err(|e| {
        EtlError::Validation(format!(
            "{} is not an array of records: {}",
            path.display(),
            e
        ))
    })?;
    Ok(audit_records(&records, references))
}

pub fn audit_records(records: &[Map<String, Value>], references: &ReferenceData) -> AuditReport {
    info!("🔍 Auditing {} records...", records.len());

    let unknown = |column: &str, known: &BTreeSet<String>| -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.get(column).and_then(Value::as_str))
            .map(str::trim)
            .filter(|v| !v.is_empty() && !known.contains(*v))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let report = AuditReport {
        records: records.len(),
        unknown_countries: unknown(COL_COUNTRY, &references.countries),
        unknown_locations: unknown(COL_LOCATION, &references.cities),
    };

    if report.unknown_countries.is_empty() {
        info!("✅ All countries matched the reference list");
    } else {
        warn!(
            "🟠 {} countries not in the reference list",
            report.unknown_countries.len()
        );
    }
    if report.unknown_locations.is_empty() {
        info!("✅ All locations matched known cities");
    } else {
        warn!(
            "🟡 {} location values not found in city list",
            report.unknown_locations.len()
        );
    }

    report
}
