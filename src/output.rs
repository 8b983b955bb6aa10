use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{EtlError, Result};
use crate::types::CleanRecord;
use crate::validate::RunSummary;

/// Write records as a pretty-printed JSON array.
pub fn write_json(records: &[CleanRecord], path: &Path) -> Result<()> {
    write_pretty(records, path)?;
    info!("✅ Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write records as CSV, using the first record's columns as the header row.
pub fn write_csv(records: &[CleanRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let write_error = |e: csv::Error| EtlError::output_write(path, e.into());
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;

    if let Some(first) = records.first() {
        writer.write_record(first.columns()).map_err(write_error)?;
    }
    for record in records {
        writer
            .write_record(record.values().map(|v| v.to_cell_string()))
            .map_err(write_error)?;
    }
    writer
        .flush()
        .map_err(|e| EtlError::output_write(path, e))?;

    info!("✅ Wrote cleaned CSV to {}", path.display());
    Ok(())
}

pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    write_pretty(summary, path)?;
    info!("📝 Wrote run summary to {}", path.display());
    Ok(())
}

/// Serialize any value as pretty JSON to `path`.
pub fn write_pretty<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).map_err(|e| EtlError::output_write(path, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| EtlError::output_write(path, e))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldValue;
    use tempfile::tempdir;

    fn sample() -> Vec<CleanRecord> {
        vec![
            CleanRecord::new(vec![
                ("Country".to_string(), FieldValue::text("Oman")),
                ("Successful".to_string(), FieldValue::Int(1)),
                ("Month".to_string(), FieldValue::Int(3)),
            ]),
            CleanRecord::new(vec![
                ("Country".to_string(), FieldValue::text("Norway, South")),
                ("Successful".to_string(), FieldValue::Int(0)),
                ("Month".to_string(), FieldValue::Absent),
            ]),
        ]
    }

    #[test]
    fn test_json_output_is_array_of_ordered_objects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("public/data/operations_data.json");
        write_json(&sample(), &path).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["Country"], "Oman");
        assert_eq!(parsed[0]["Successful"], 1);
        assert!(parsed[1]["Month"].is_null());
    }

    #[test]
    fn test_unwritable_csv_destination_is_output_write_error() {
        let dir = tempdir().unwrap();
        // the destination is an existing directory
        let err = write_csv(&sample(), dir.path()).unwrap_err();
        assert!(matches!(err, EtlError::OutputWrite { .. }));
    }

    #[test]
    fn test_csv_output_quotes_and_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("runs-summary.csv");
        write_csv(&sample(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Country,Successful,Month\nOman,1,3\n\"Norway, South\",0,\n"
        );
    }
}
