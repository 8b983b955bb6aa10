use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::anomaly::LogPaths;
use crate::audit::{audit_file, AuditReport};
use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::output;
use crate::pipeline::Pipeline;
use crate::reference::ReferenceData;
use crate::sheet::load_sheet;
use crate::template::location_template;
use crate::validate::{validate_records, RunSummary};

/// Outcome of a `generate` run.
///
/// The primary JSON is always written when this is returned; secondary
/// artifacts that failed to write are listed in `failed_artifacts`.
#[derive(Debug)]
pub struct GenerateResult {
    pub summary: RunSummary,
    pub output_file: PathBuf,
    pub failed_artifacts: Vec<EtlError>,
}

/// Spreadsheet → normalized JSON, plus optional CSV, summary and anomaly logs.
///
/// Reference data, sheet, schema and validation errors abort before the
/// primary output is written.
pub fn generate(config: &Config) -> Result<GenerateResult> {
    let started = Instant::now();
    info!("🚀 Starting data processing...");

    let references = ReferenceData::load(&config.paths.countries_json, &config.paths.cities_json)?;
    let sheet = load_sheet(&config.paths.input, &config.paths.sheet_name)?;

    let mut pipeline = Pipeline::new(
        &config.pipeline,
        &config.normalization,
        &references,
        config.matching,
    );
    let result = pipeline.run(sheet)?;

    validate_records(&result.records, &config.validation)?;

    let summary = RunSummary::from_records(&result.records, &result.anomalies);
    info!(
        run_id = %summary.run_id,
        records = summary.total_records,
        countries = summary.countries,
        systems = summary.systems,
        success_rate = summary.success_rate,
        "📊 Processing metrics"
    );

    output::write_json(&result.records, &config.paths.output_json)?;

    let mut failed_artifacts = Vec::new();
    if let Some(csv_path) = &config.paths.output_csv {
        if let Err(e) = output::write_csv(&result.records, csv_path) {
            error!("❌ Failed to write CSV export: {}", e);
            failed_artifacts.push(e);
        }
    }

    failed_artifacts.extend(
        result
            .anomalies
            .write_logs(&LogPaths::in_dir(&config.paths.anomaly_dir)),
    );

    if let Some(summary_path) = &config.paths.summary_json {
        if let Err(e) = output::write_summary(&summary, summary_path) {
            error!("❌ Failed to write run summary: {}", e);
            failed_artifacts.push(e);
        }
    }

    info!(
        "🎉 Processing completed in {:.2}s",
        started.elapsed().as_secs_f64()
    );

    Ok(GenerateResult {
        summary,
        output_file: config.paths.output_json.clone(),
        failed_artifacts,
    })
}

/// Parameters for re-checking a published operations file.
#[derive(Debug, Clone)]
pub struct AuditParams {
    pub data: PathBuf,
    /// Write unknown lists into the anomaly directory.
    pub write_logs: bool,
}

pub fn audit(config: &Config, params: &AuditParams) -> Result<AuditReport> {
    let references = ReferenceData::load(&config.paths.countries_json, &config.paths.cities_json)?;
    let report = audit_file(&params.data, &references)?;
    if params.write_logs && !report.is_clean() {
        report.write(&LogPaths::in_dir(&config.paths.anomaly_dir))?;
        info!("📝 Wrote unknown lists to {}", config.paths.anomaly_dir.display());
    }
    Ok(report)
}

/// Parameters for building a location normalization template.
#[derive(Debug, Clone)]
pub struct TemplateParams {
    pub column: String,
    pub output: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct TemplateResult {
    pub entries: usize,
    pub output_file: PathBuf,
}

pub fn template(config: &Config, params: &TemplateParams) -> Result<TemplateResult> {
    let sheet = load_sheet(&config.paths.input, &config.paths.sheet_name)?;
    let template = location_template(&sheet, &params.column)?;
    if template.is_empty() {
        warn!("⚠️ Column '{}' has no values", params.column);
    }
    output::write_pretty(&template, &params.output)?;
    info!(
        "✅ Wrote template with {} entries to {}",
        template.len(),
        params.output.display()
    );
    Ok(TemplateResult {
        entries: template.len(),
        output_file: params.output.clone(),
    })
}
