//! Per-field normalization of operations sheet values.
//!
//! Country and location values go through an override table, then
//! reference-set membership, then a fuzzy match, and finally fall back to
//! the raw value. The fuzzy and fallback outcomes are recorded as anomalies.
//! Region, system and success values are table lookups only.

pub mod matching;
pub mod month;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use crate::anomaly::{Anomaly, AnomalyCollector};
use crate::config::{MatchingConfig, NormalizationTables};
use crate::constants::{
    COL_COUNTRY, COL_LOCATION, COL_MONTH, COL_REGION, COL_SUCCESSFUL, COL_SYSTEM, COL_YEAR,
};
use crate::reference::ReferenceData;
use crate::types::{FieldValue, SENTINEL};

pub use matching::{best_match, similarity, Match};
pub use month::{normalize_month, normalize_year};

/// Columns that have a registered normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    Month,
    Year,
    Region,
    Country,
    Location,
    Successful,
    System,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Month,
        FieldKind::Year,
        FieldKind::Region,
        FieldKind::Country,
        FieldKind::Location,
        FieldKind::Successful,
        FieldKind::System,
    ];

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.column() == column)
    }

    /// Sheet header this kind is registered under.
    pub fn column(&self) -> &'static str {
        match self {
            FieldKind::Month => COL_MONTH,
            FieldKind::Year => COL_YEAR,
            FieldKind::Region => COL_REGION,
            FieldKind::Country => COL_COUNTRY,
            FieldKind::Location => COL_LOCATION,
            FieldKind::Successful => COL_SUCCESSFUL,
            FieldKind::System => COL_SYSTEM,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Month => "month",
            FieldKind::Year => "year",
            FieldKind::Region => "region",
            FieldKind::Country => "country",
            FieldKind::Location => "location",
            FieldKind::Successful => "successful",
            FieldKind::System => "system",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field normalizer for a single run.
///
/// Country and location results are memoized by `(kind, trimmed value)`, so
/// a repeated raw value is resolved, and reported as an anomaly, only once.
pub struct FieldNormalizer<'a> {
    tables: &'a NormalizationTables,
    references: &'a ReferenceData,
    matching: MatchingConfig,
    cache: HashMap<(FieldKind, String), String>,
}

impl<'a> FieldNormalizer<'a> {
    pub fn new(
        tables: &'a NormalizationTables,
        references: &'a ReferenceData,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            tables,
            references,
            matching,
            cache: HashMap::new(),
        }
    }

    /// Forget memoized results.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn normalize_country(&mut self, raw: &str, anomalies: &mut AnomalyCollector) -> String {
        self.normalize_matched(FieldKind::Country, raw, anomalies)
    }

    pub fn normalize_location(&mut self, raw: &str, anomalies: &mut AnomalyCollector) -> String {
        self.normalize_matched(FieldKind::Location, raw, anomalies)
    }

    pub fn normalize_region(&self, raw: &str) -> String {
        lookup_or_raw(&self.tables.region, raw)
    }

    /// Collapse system variants into their product family.
    pub fn normalize_system(&self, raw: &str) -> String {
        lookup_or_raw(&self.tables.system, raw)
    }

    /// 1 for a recognized success synonym, 0 for everything else.
    pub fn normalize_success(&self, raw: &str) -> i64 {
        self.tables
            .success
            .get(&raw.trim().to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Normalize one cell of a registered column.
    ///
    /// Missing cells become `null` for `Month`, `0` for `Successful` and the
    /// zero sentinel elsewhere. The sentinel never reaches a text normalizer.
    pub fn normalize_cell(
        &mut self,
        kind: FieldKind,
        raw: Option<&str>,
        anomalies: &mut AnomalyCollector,
    ) -> FieldValue {
        let Some(raw) = raw else {
            return match kind {
                FieldKind::Month => FieldValue::Absent,
                FieldKind::Successful => FieldValue::Int(0),
                _ => SENTINEL,
            };
        };

        match kind {
            FieldKind::Month => normalize_month(raw).into(),
            FieldKind::Year => normalize_year(raw),
            FieldKind::Region => FieldValue::Text(self.normalize_region(raw)),
            FieldKind::System => FieldValue::Text(self.normalize_system(raw)),
            FieldKind::Successful => FieldValue::Int(self.normalize_success(raw)),
            FieldKind::Country => FieldValue::Text(self.normalize_country(raw, anomalies)),
            FieldKind::Location => FieldValue::Text(self.normalize_location(raw, anomalies)),
        }
    }

    fn normalize_matched(
        &mut self,
        kind: FieldKind,
        raw: &str,
        anomalies: &mut AnomalyCollector,
    ) -> String {
        let value = raw.trim();
        if value.is_empty() {
            return String::new();
        }

        let key = (kind, value.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let (overrides, reference) = match kind {
            FieldKind::Location => (&self.tables.location, &self.references.cities),
            _ => (&self.tables.country, &self.references.countries),
        };
        let resolved = resolve(
            kind,
            value,
            overrides,
            reference,
            self.matching.threshold(kind),
            anomalies,
        );

        self.cache.insert(key, resolved.clone());
        resolved
    }
}

fn lookup_or_raw(table: &BTreeMap<String, String>, raw: &str) -> String {
    let value = raw.trim();
    table
        .get(value)
        .cloned()
        .unwrap_or_else(|| value.to_string())
}

fn resolve(
    kind: FieldKind,
    value: &str,
    overrides: &BTreeMap<String, String>,
    reference: &BTreeSet<String>,
    threshold: f64,
    anomalies: &mut AnomalyCollector,
) -> String {
    if let Some(canonical) = overrides.get(value) {
        return canonical.clone();
    }

    if reference.contains(value) {
        return value.to_string();
    }

    if let Some(found) = best_match(value, reference.iter().map(String::as_str), threshold) {
        debug!(
            "🔁 Fuzzy matched {}: '{}' → '{}' ({:.3})",
            kind, value, found.candidate, found.score
        );
        anomalies.record(Anomaly::Fuzzy {
            kind,
            raw: value.to_string(),
            canonical: found.candidate.to_string(),
        });
        return found.candidate.to_string();
    }

    debug!("Unknown {}: '{}'", kind, value);
    anomalies.record(Anomaly::Unknown {
        kind,
        raw: value.to_string(),
    });
    value.to_string()
}
