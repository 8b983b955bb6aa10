use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::anomaly::AnomalyCollector;
use crate::config::ValidationConfig;
use crate::constants::{COL_COUNTRY, COL_SUCCESSFUL, COL_SYSTEM, COL_YEAR};
use crate::error::{EtlError, Result};
use crate::types::{CleanRecord, FieldValue};

/// Quality gate run before the primary output is written.
///
/// Empty output and missing required columns are fatal. Years outside the
/// configured window are only reported.
pub fn validate_records(records: &[CleanRecord], config: &ValidationConfig) -> Result<()> {
    let Some(first) = records.first() else {
        return Err(EtlError::Validation("processed data is empty".to_string()));
    };

    let present: BTreeSet<&str> = first.columns().collect();
    let missing: Vec<&str> = config
        .required_columns
        .iter()
        .map(String::as_str)
        .filter(|c| !present.contains(c))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::Validation(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let out_of_range = records
        .iter()
        .filter_map(|r| r.get(COL_YEAR).and_then(FieldValue::as_int))
        .filter(|year| *year < config.min_year || *year > config.max_year)
        .count();
    if out_of_range > 0 {
        warn!(
            "⚠️ Found {} records with years outside {}-{}",
            out_of_range, config.min_year, config.max_year
        );
    }

    info!("✅ Data validation passed: {} records", records.len());
    Ok(())
}

/// Processing metrics for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub total_records: usize,
    pub countries: usize,
    pub systems: usize,
    pub success_rate: f64,
    pub min_year: Option<i64>,
    pub max_year: Option<i64>,
    pub fuzzy_matches: usize,
    pub unknown_values: usize,
}

impl RunSummary {
    pub fn from_records(records: &[CleanRecord], anomalies: &AnomalyCollector) -> Self {
        let distinct = |column: &str| {
            records
                .iter()
                .filter_map(|r| r.get(column).and_then(FieldValue::as_text))
                .collect::<BTreeSet<_>>()
                .len()
        };

        let successes: Vec<i64> = records
            .iter()
            .filter_map(|r| r.get(COL_SUCCESSFUL).and_then(FieldValue::as_int))
            .collect();
        let success_rate = if successes.is_empty() {
            0.0
        } else {
            successes.iter().sum::<i64>() as f64 / successes.len() as f64
        };

        let years = || {
            records
                .iter()
                .filter_map(|r| r.get(COL_YEAR).and_then(FieldValue::as_int))
                .filter(|year| *year != 0)
        };

        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            total_records: records.len(),
            countries: distinct(COL_COUNTRY),
            systems: distinct(COL_SYSTEM),
            success_rate,
            min_year: years().min(),
            max_year: years().max(),
            fuzzy_matches: anomalies.fuzzy_count(),
            unknown_values: anomalies.unknown_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(country: &str, system: &str, year: FieldValue, successful: i64) -> CleanRecord {
        CleanRecord::new(vec![
            ("Country".to_string(), FieldValue::text(country)),
            ("System".to_string(), FieldValue::text(system)),
            ("Year".to_string(), year),
            ("Successful".to_string(), FieldValue::Int(successful)),
        ])
    }

    #[test]
    fn test_empty_records_fail_validation() {
        let err = validate_records(&[], &ValidationConfig::default()).unwrap_err();
        assert!(matches!(err, EtlError::Validation(_)));
    }

    #[test]
    fn test_missing_required_column_fails_validation() {
        let records = vec![CleanRecord::new(vec![(
            "Country".to_string(),
            FieldValue::text("Oman"),
        )])];
        let err = validate_records(&records, &ValidationConfig::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("System"));
        assert!(message.contains("Year"));
        assert!(message.contains("Successful"));
    }

    #[test]
    fn test_out_of_range_years_only_warn() {
        let records = vec![
            record("Oman", "Thor", FieldValue::Int(1975), 1),
            record("Oman", "Thor", FieldValue::Int(2021), 1),
        ];
        assert!(validate_records(&records, &ValidationConfig::default()).is_ok());
    }

    #[test]
    fn test_summary_metrics() {
        let records = vec![
            record("Oman", "Thor", FieldValue::Int(2019), 1),
            record("Norway", "Thor", FieldValue::Int(2023), 0),
            record("Oman", "PathFinder", FieldValue::Int(0), 1),
            record("Oman", "PathFinder", FieldValue::text("FY21"), 0),
        ];

        let summary = RunSummary::from_records(&records, &AnomalyCollector::new());
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.countries, 2);
        assert_eq!(summary.systems, 2);
        assert!((summary.success_rate - 0.5).abs() < 1e-9);
        assert_eq!(summary.min_year, Some(2019));
        assert_eq!(summary.max_year, Some(2023));
        assert_eq!(summary.fuzzy_matches, 0);
    }
}
