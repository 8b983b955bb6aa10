use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::constants::{
    FUZZY_COUNTRIES_LOG, FUZZY_LOCATIONS_LOG, UNKNOWN_COUNTRIES_LOG, UNKNOWN_LOCATIONS_LOG,
};
use crate::error::{EtlError, Result};
use crate::normalize::FieldKind;

/// A normalization outcome that needs a human to look at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    Fuzzy {
        kind: FieldKind,
        raw: String,
        canonical: String,
    },
    Unknown {
        kind: FieldKind,
        raw: String,
    },
}

/// Per-run accumulator for fuzzy and unknown country/location values.
#[derive(Debug, Clone, Default)]
pub struct AnomalyCollector {
    fuzzy_countries: Vec<(String, String)>,
    unknown_countries: Vec<String>,
    fuzzy_locations: Vec<(String, String)>,
    unknown_locations: Vec<String>,
}

/// Destinations for the four anomaly logs.
#[derive(Debug, Clone)]
pub struct LogPaths {
    pub fuzzy_countries: PathBuf,
    pub unknown_countries: PathBuf,
    pub fuzzy_locations: PathBuf,
    pub unknown_locations: PathBuf,
}

impl LogPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            fuzzy_countries: dir.join(FUZZY_COUNTRIES_LOG),
            unknown_countries: dir.join(UNKNOWN_COUNTRIES_LOG),
            fuzzy_locations: dir.join(FUZZY_LOCATIONS_LOG),
            unknown_locations: dir.join(UNKNOWN_LOCATIONS_LOG),
        }
    }
}

impl AnomalyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, anomaly: Anomaly) {
        let (kind, category) = match &anomaly {
            Anomaly::Fuzzy { kind, .. } => (*kind, "fuzzy"),
            Anomaly::Unknown { kind, .. } => (*kind, "unknown"),
        };
        metrics::counter!(
            "kiosk_etl_anomalies_total",
            "kind" => kind.as_str(),
            "category" => category
        )
        .increment(1);

        match anomaly {
            Anomaly::Fuzzy {
                kind: FieldKind::Location,
                raw,
                canonical,
            } => self.fuzzy_locations.push((raw, canonical)),
            Anomaly::Fuzzy { raw, canonical, .. } => self.fuzzy_countries.push((raw, canonical)),
            Anomaly::Unknown {
                kind: FieldKind::Location,
                raw,
            } => self.unknown_locations.push(raw),
            Anomaly::Unknown { raw, .. } => self.unknown_countries.push(raw),
        }
    }

    /// Fuzzy matches for `kind`, in the order they were recorded.
    pub fn fuzzy(&self, kind: FieldKind) -> &[(String, String)] {
        match kind {
            FieldKind::Location => &self.fuzzy_locations,
            _ => &self.fuzzy_countries,
        }
    }

    /// Unknown values for `kind`, in the order they were recorded.
    pub fn unknown(&self, kind: FieldKind) -> &[String] {
        match kind {
            FieldKind::Location => &self.unknown_locations,
            _ => &self.unknown_countries,
        }
    }

    pub fn fuzzy_count(&self) -> usize {
        self.fuzzy_countries.len() + self.fuzzy_locations.len()
    }

    pub fn unknown_count(&self) -> usize {
        unique_sorted(&self.unknown_countries).len() + unique_sorted(&self.unknown_locations).len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuzzy_count() == 0
            && self.unknown_countries.is_empty()
            && self.unknown_locations.is_empty()
    }

    /// Flush every non-empty log. A failed artifact does not stop the others;
    /// failures are logged and returned.
    pub fn write_logs(&self, paths: &LogPaths) -> Vec<EtlError> {
        let artifacts = [
            (&paths.fuzzy_countries, fuzzy_lines(&self.fuzzy_countries), "fuzzy country matches"),
            (&paths.unknown_countries, unique_sorted(&self.unknown_countries), "unknown countries"),
            (&paths.fuzzy_locations, fuzzy_lines(&self.fuzzy_locations), "fuzzy location matches"),
            (&paths.unknown_locations, unique_sorted(&self.unknown_locations), "unknown locations"),
        ];

        let mut failures = Vec::new();
        for (path, lines, label) in artifacts {
            if lines.is_empty() {
                continue;
            }
            match write_lines(path, &lines) {
                Ok(()) if label.starts_with("unknown") => {
                    warn!("⚠️ Found {} {} → {}", lines.len(), label, path.display())
                }
                Ok(()) => info!("📝 Wrote {} {} → {}", lines.len(), label, path.display()),
                Err(e) => {
                    error!("❌ Failed to write {}: {}", label, e);
                    failures.push(e);
                }
            }
        }
        failures
    }
}

fn fuzzy_lines(entries: &[(String, String)]) -> Vec<String> {
    entries
        .iter()
        .map(|(raw, canonical)| format!("{raw} -> {canonical}"))
        .collect()
}

/// Sorted, de-duplicated copy of `values`.
pub fn unique_sorted(values: &[String]) -> Vec<String> {
    values
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write newline-separated lines, creating the parent directory if needed.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::output_write(path, e))?;
    }
    fs::write(path, lines.join("\n")).map_err(|e| EtlError::output_write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn unknown(kind: FieldKind, raw: &str) -> Anomaly {
        Anomaly::Unknown {
            kind,
            raw: raw.to_string(),
        }
    }

    fn fuzzy(kind: FieldKind, raw: &str, canonical: &str) -> Anomaly {
        Anomaly::Fuzzy {
            kind,
            raw: raw.to_string(),
            canonical: canonical.to_string(),
        }
    }

    #[test]
    fn test_writes_arrow_lines_and_sorted_unknowns() {
        let dir = tempdir().unwrap();
        let paths = LogPaths::in_dir(dir.path());

        let mut anomalies = AnomalyCollector::new();
        anomalies.record(fuzzy(FieldKind::Country, "Norwey", "Norway"));
        anomalies.record(fuzzy(FieldKind::Country, "Brazill", "Brazil"));
        anomalies.record(unknown(FieldKind::Country, "Narnia"));
        anomalies.record(unknown(FieldKind::Country, "Atlantis"));
        anomalies.record(unknown(FieldKind::Country, "Narnia"));

        let failures = anomalies.write_logs(&paths);
        assert!(failures.is_empty());

        let fuzzy_log = fs::read_to_string(&paths.fuzzy_countries).unwrap();
        assert_eq!(fuzzy_log, "Norwey -> Norway\nBrazill -> Brazil");

        let unknown_log = fs::read_to_string(&paths.unknown_countries).unwrap();
        assert_eq!(unknown_log, "Atlantis\nNarnia");

        assert_eq!(anomalies.unknown_count(), 2);
    }

    #[test]
    fn test_empty_categories_create_no_files() {
        let dir = tempdir().unwrap();
        let paths = LogPaths::in_dir(dir.path());

        let mut anomalies = AnomalyCollector::new();
        anomalies.record(unknown(FieldKind::Location, "Gotham"));
        anomalies.write_logs(&paths);

        assert!(paths.unknown_locations.exists());
        assert!(!paths.fuzzy_locations.exists());
        assert!(!paths.fuzzy_countries.exists());
        assert!(!paths.unknown_countries.exists());
    }

    #[test]
    fn test_unwritable_destination_is_reported() {
        let dir = tempdir().unwrap();
        // a regular file where a directory is expected
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let paths = LogPaths::in_dir(&blocker.join("nested"));

        let mut anomalies = AnomalyCollector::new();
        anomalies.record(unknown(FieldKind::Country, "Narnia"));
        anomalies.record(unknown(FieldKind::Location, "Gotham"));

        let failures = anomalies.write_logs(&paths);
        assert_eq!(failures.len(), 2);
        assert!(failures
            .iter()
            .all(|e| matches!(e, EtlError::OutputWrite { .. })));
    }
}
