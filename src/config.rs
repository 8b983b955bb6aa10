use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::{
    default_required_columns, DEFAULT_ANCHOR_COLUMN, DEFAULT_MATCH_THRESHOLD, DEFAULT_SHEET_NAME,
    DEFAULT_TRAILER_MARKER, ENV_EXCEL_PATH, ENV_OUTPUT_PATH,
};
use crate::error::{EtlError, Result};
use crate::normalize::FieldKind;

/// Top level configuration, normally read from `config.toml`.
///
/// Every section is optional; anything left out falls back to the built-in
/// defaults, which mirror the production normalization tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub pipeline: PipelineOptions,
    pub matching: MatchingConfig,
    pub normalization: NormalizationTables,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub input: PathBuf,
    pub sheet_name: String,
    pub output_json: PathBuf,
    pub output_csv: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    pub countries_json: PathBuf,
    pub cities_json: PathBuf,
    pub anomaly_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/private/raw/jobhistory.xlsx"),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_json: PathBuf::from("public/data/operations_data.json"),
            output_csv: None,
            summary_json: None,
            countries_json: PathBuf::from("reference/master_country_list.json"),
            cities_json: PathBuf::from("reference/known_cities.json"),
            anomaly_dir: PathBuf::from("anomalies"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// How the trailing non-data row(s) of the sheet are recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrailerPolicy {
    /// Drop the final row regardless of its content.
    DropLast,
    /// Truncate at the first row containing `text` (case-insensitive).
    Marker {
        #[serde(default = "default_marker_text")]
        text: String,
    },
    /// Keep every row.
    Keep,
}

fn default_marker_text() -> String {
    DEFAULT_TRAILER_MARKER.to_string()
}

impl Default for TrailerPolicy {
    fn default() -> Self {
        TrailerPolicy::DropLast
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Last column trusted as part of the schema; later columns are dropped.
    pub anchor_column: String,
    /// Legacy sheets carry bookkeeping columns at the front.
    pub drop_leading_columns: usize,
    pub trailer: TrailerPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            anchor_column: DEFAULT_ANCHOR_COLUMN.to_string(),
            drop_leading_columns: 0,
            trailer: TrailerPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub country_threshold: f64,
    pub location_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            country_threshold: DEFAULT_MATCH_THRESHOLD,
            location_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl MatchingConfig {
    /// Similarity cutoff for a fuzzy-matched field.
    pub fn threshold(&self, kind: FieldKind) -> f64 {
        match kind {
            FieldKind::Location => self.location_threshold,
            _ => self.country_threshold,
        }
    }
}

/// Exact-match override tables, keyed by the trimmed raw value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationTables {
    pub country: BTreeMap<String, String>,
    pub region: BTreeMap<String, String>,
    pub location: BTreeMap<String, String>,
    pub system: BTreeMap<String, String>,
    /// Keys are lowercase.
    pub success: BTreeMap<String, i64>,
}

fn string_table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
        .collect()
}

impl Default for NormalizationTables {
    fn default() -> Self {
        Self {
            country: string_table(&[
                ("UAE", "United Arab Emirates"),
                ("USA", "United States of America"),
                ("Equatorial Guinea", "Eq. Guinea"),
                ("Ivory Coast", "Côte d'Ivoire"),
            ]),
            region: string_table(&[("MEA", "MENA")]),
            location: string_table(&[("Yangoon", "Yangon")]),
            system: string_table(&[
                ("Wireline Express", "Wireline Express"),
                ("Wireline Express (In-Line)", "Wireline Express"),
                ("PathFinder", "PathFinder"),
                ("PathFinder - HT", "PathFinder"),
                ("Helix", "Focus - CH"),
                ("Rocker", "Focus - CH"),
                ("CA7", "Focus - CH"),
                ("CP8", "Focus - OH"),
                ("CP12", "Focus - OH"),
                ("Thor", "Thor"),
                ("RO17", "Other"),
            ]),
            success: [
                ("1", 1),
                ("yes", 1),
                ("true", 1),
                ("successful", 1),
                ("0", 0),
                ("no", 0),
                ("false", 0),
                ("unsuccessful", 0),
            ]
            .iter()
            .map(|(raw, flag)| (raw.to_string(), *flag))
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub required_columns: Vec<String>,
    pub min_year: i64,
    pub max_year: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_columns: default_required_columns(),
            min_year: 1990,
            max_year: 2030,
        }
    }
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&content)?;
        debug!("Parsed configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// The file to read: `path` when given, else `config.toml` in the
    /// working directory if it exists. `None` means built-in defaults.
    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(p) => Some(p.to_path_buf()),
            None => {
                let fallback = Path::new("config.toml");
                fallback.exists().then(|| fallback.to_path_buf())
            }
        }
    }

    /// Load `path` when given; otherwise use `config.toml` if present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(path) {
            Some(p) => Self::load(&p),
            None => {
                debug!("No config.toml found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Log where the active configuration came from. Call once logging is up.
    pub fn log_source(source: Option<&Path>) {
        match source {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => info!("No config.toml found, using built-in defaults"),
        }
    }

    /// Apply `EXCEL_PATH` / `KIOSK_ETL_OUTPUT` overrides from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(input) = std::env::var(ENV_EXCEL_PATH) {
            if !input.trim().is_empty() {
                debug!("{} overrides input path", ENV_EXCEL_PATH);
                self.paths.input = PathBuf::from(input);
            }
        }
        if let Ok(output) = std::env::var(ENV_OUTPUT_PATH) {
            if !output.trim().is_empty() {
                debug!("{} overrides output path", ENV_OUTPUT_PATH);
                self.paths.output_json = PathBuf::from(output);
            }
        }
    }

    fn check(&self) -> Result<()> {
        for (name, value) in [
            ("matching.country_threshold", self.matching.country_threshold),
            ("matching.location_threshold", self.matching.location_threshold),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(EtlError::Config(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.pipeline.anchor_column.trim().is_empty() {
            return Err(EtlError::Config(
                "pipeline.anchor_column must not be empty".to_string(),
            ));
        }
        if let TrailerPolicy::Marker { text } = &self.pipeline.trailer {
            if text.trim().is_empty() {
                return Err(EtlError::Config(
                    "pipeline.trailer.text must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
