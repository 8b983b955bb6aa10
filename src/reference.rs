use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{EtlError, Result};

/// Canonical country and city names the normalizer matches against.
///
/// Sets are ordered so fuzzy candidate iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub countries: BTreeSet<String>,
    pub cities: BTreeSet<String>,
}

impl ReferenceData {
    pub fn new(countries: BTreeSet<String>, cities: BTreeSet<String>) -> Self {
        Self { countries, cities }
    }

    /// Load both reference files once for the run.
    pub fn load(countries_path: &Path, cities_path: &Path) -> Result<Self> {
        let countries = load(countries_path)?;
        info!("✅ Loaded {} known countries", countries.len());

        let cities = load(cities_path)?;
        info!("✅ Loaded {} known cities", cities.len());

        Ok(Self { countries, cities })
    }
}

/// Read a set of canonical names from a JSON array of strings, or from the
/// keys of a JSON object.
pub fn load(path: &Path) -> Result<BTreeSet<String>> {
    let reference_error = |reason: String| EtlError::ReferenceData {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path).map_err(|e| reference_error(e.to_string()))?;
    let value: Value =
        serde_json::from_str(&content).map_err(|e| reference_error(format!("invalid JSON: {e}")))?;

    parse_names(value).map_err(reference_error)
}

fn parse_names(value: Value) -> std::result::Result<BTreeSet<String>, String> {
    let names: Vec<String> = match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s),
                other => Err(format!("entry {i} is not a string: {other}")),
            })
            .collect::<std::result::Result<_, _>>()?,
        Value::Object(map) => map.into_iter().map(|(key, _)| key).collect(),
        other => {
            return Err(format!(
                "expected an array or object of strings, found {}",
                json_kind(&other)
            ))
        }
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
