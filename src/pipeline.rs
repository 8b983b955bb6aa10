use metrics::counter;
use tracing::{debug, info, instrument, warn};

use crate::anomaly::AnomalyCollector;
use crate::config::{MatchingConfig, NormalizationTables, PipelineOptions, TrailerPolicy};
use crate::error::{EtlError, Result};
use crate::normalize::{FieldKind, FieldNormalizer};
use crate::reference::ReferenceData;
use crate::types::{rename_duplicate_headers, CleanRecord, FieldValue, RawSheet, SENTINEL};

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<CleanRecord>,
    pub anomalies: AnomalyCollector,
    /// Columns kept after anchor truncation and leading-column removal.
    pub columns: Vec<String>,
    pub dropped_rows: usize,
}

/// Turns a raw operations sheet into clean records.
pub struct Pipeline<'a> {
    options: &'a PipelineOptions,
    normalizer: FieldNormalizer<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        options: &'a PipelineOptions,
        tables: &'a NormalizationTables,
        references: &'a ReferenceData,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            options,
            normalizer: FieldNormalizer::new(tables, references, matching),
        }
    }

    /// Run every cleaning step over `sheet`.
    ///
    /// Fails only when the anchor column is missing; every surviving row
    /// produces a record. Memoized lookups and anomalies start fresh on each call.
    #[instrument(skip_all, fields(rows = sheet.rows.len(), columns = sheet.headers.len()))]
    pub fn run(&mut self, mut sheet: RawSheet) -> Result<PipelineOutput> {
        self.normalizer.reset();
        let mut anomalies = AnomalyCollector::new();

        // Step 1: header hygiene
        sheet.square_rows();
        trim_headers(&mut sheet);
        rename_duplicate_headers(&mut sheet.headers);

        // Step 2: cut trailing metadata columns
        info!("🧹 Trimming to '{}' column...", self.options.anchor_column);
        truncate_to_anchor(&mut sheet, &self.options.anchor_column)?;

        // Step 3: trailer row(s)
        let dropped_rows = drop_trailer(&mut sheet, &self.options.trailer);

        // Step 4: legacy bookkeeping columns
        if self.options.drop_leading_columns > 0 {
            info!(
                "🔻 Dropping first {} columns...",
                self.options.drop_leading_columns
            );
            drop_leading_columns(&mut sheet, self.options.drop_leading_columns);
        }

        // Steps 5-6: sentinels and per-column normalization
        let kinds: Vec<Option<FieldKind>> = sheet
            .headers
            .iter()
            .map(|h| FieldKind::from_column(h))
            .collect();

        let mut values: Vec<Vec<FieldValue>> = sheet
            .rows
            .iter()
            .map(|_| Vec::with_capacity(sheet.headers.len()))
            .collect();

        for (col, kind) in kinds.iter().enumerate() {
            if let Some(kind) = kind {
                info!("Normalizing '{}' column...", kind.column());
            }
            for (row, cells) in sheet.rows.iter().enumerate() {
                let raw = cells[col].as_deref();
                let value = match kind {
                    Some(kind) => self.normalizer.normalize_cell(*kind, raw, &mut anomalies),
                    None => raw.map(FieldValue::text).unwrap_or(SENTINEL),
                };
                values[row].push(value);
            }
        }

        // Step 7: emit in source order
        let records: Vec<CleanRecord> = values
            .into_iter()
            .map(|row| CleanRecord::new(sheet.headers.iter().cloned().zip(row).collect()))
            .collect();

        counter!("kiosk_etl_records_total").increment(records.len() as u64);
        info!(
            "🎉 Data processing completed: {} records ({} fuzzy matches, {} unknown values)",
            records.len(),
            anomalies.fuzzy_count(),
            anomalies.unknown_count()
        );

        Ok(PipelineOutput {
            records,
            anomalies,
            columns: sheet.headers,
            dropped_rows,
        })
    }
}

fn trim_headers(sheet: &mut RawSheet) {
    for header in sheet.headers.iter_mut() {
        let trimmed = header.trim();
        if trimmed.len() != header.len() {
            *header = trimmed.to_string();
        }
    }
}

/// Keep columns up to and including `anchor`.
fn truncate_to_anchor(sheet: &mut RawSheet, anchor: &str) -> Result<()> {
    let index = sheet
        .column_index(anchor)
        .ok_or_else(|| EtlError::Schema {
            column: anchor.to_string(),
        })?;

    let width = index + 1;
    if width < sheet.headers.len() {
        debug!(
            "Discarding columns after '{}': {:?}",
            anchor,
            &sheet.headers[width..]
        );
    }
    sheet.headers.truncate(width);
    for row in sheet.rows.iter_mut() {
        row.truncate(width);
    }
    Ok(())
}

/// Remove trailer rows; returns how many rows were dropped.
fn drop_trailer(sheet: &mut RawSheet, policy: &TrailerPolicy) -> usize {
    let before = sheet.rows.len();
    match policy {
        TrailerPolicy::DropLast => {
            info!("✂️ Dropping final row (assumed marker)...");
            sheet.rows.pop();
        }
        TrailerPolicy::Marker { text } => {
            info!("🔍 Searching for '{}' marker...", text);
            let needle = text.to_lowercase();
            let cutoff = sheet.rows.iter().position(|row| {
                row.iter()
                    .flatten()
                    .any(|cell| cell.to_lowercase().contains(&needle))
            });
            match cutoff {
                Some(index) => {
                    sheet.rows.truncate(index);
                    info!("✂️ Truncated at row {} (marker found)", index);
                }
                None => warn!("⚠️ Marker '{}' not found, using full data", text),
            }
        }
        TrailerPolicy::Keep => {}
    }
    before - sheet.rows.len()
}

/// Drop `count` leading columns, never removing the anchor (last) column.
fn drop_leading_columns(sheet: &mut RawSheet, count: usize) {
    let max = sheet.headers.len().saturating_sub(1);
    let count = if count > max {
        warn!(
            "⚠️ Asked to drop {} leading columns but only {} precede the anchor",
            count, max
        );
        max
    } else {
        count
    };

    sheet.headers.drain(..count);
    for row in sheet.rows.iter_mut() {
        row.drain(..count);
    }
}
