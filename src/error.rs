use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Schema error: required column '{column}' not found")]
    Schema { column: String },

    #[error("Reference data error for '{}': {reason}", path.display())]
    ReferenceData { path: PathBuf, reason: String },

    #[error("Failed to write '{}': {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sheet error: {0}")]
    Sheet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EtlError {
    pub fn output_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
