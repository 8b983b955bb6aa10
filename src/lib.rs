pub mod anomaly;
pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reference;
pub mod sheet;
pub mod tasks;
pub mod template;
pub mod types;
pub mod validate;

pub use anomaly::{Anomaly, AnomalyCollector, LogPaths};
pub use config::{Config, PipelineOptions, TrailerPolicy};
pub use error::{EtlError, Result};
pub use normalize::{FieldKind, FieldNormalizer};
pub use pipeline::{Pipeline, PipelineOutput};
pub use reference::ReferenceData;
pub use types::{CleanRecord, FieldValue, RawSheet};
