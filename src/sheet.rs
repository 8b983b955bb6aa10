use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::types::{non_empty, rename_duplicate_headers, RawSheet};

/// Read the raw sheet from a workbook (`sheet_name` tab) or a CSV file.
///
/// The first row is the header row. Cells are kept as untyped text; empty
/// cells become `None`.
pub fn load_sheet(path: &Path, sheet_name: &str) -> Result<RawSheet> {
    if !path.exists() {
        return Err(EtlError::Sheet(format!(
            "input file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    info!("📥 Reading {}...", path.display());
    let sheet = match extension.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet_name)?,
        other => {
            return Err(EtlError::Sheet(format!(
                "unsupported input format '{}' for {}",
                other,
                path.display()
            )))
        }
    };
    info!(
        "📊 Loaded {} rows x {} columns",
        sheet.rows.len(),
        sheet.headers.len()
    );
    Ok(sheet)
}

fn load_workbook(path: &Path, sheet_name: &str) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| EtlError::Sheet(format!("failed to open {}: {}", path.display(), e)))?;

    let range = match workbook.worksheet_range(sheet_name) {
        Ok(range) => range,
        Err(e) => {
            return Err(EtlError::Sheet(format!(
                "failed to read sheet '{}' (available: {}): {}",
                sheet_name,
                workbook.sheet_names().join(", "),
                e
            )))
        }
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_names(header_row.iter().map(cell_text)),
        None => return Err(EtlError::Sheet(format!("sheet '{sheet_name}' is empty"))),
    };
    let rows = rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawSheet::new(headers, rows))
}

fn load_csv(path: &Path) -> Result<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = header_names(reader.headers()?.iter().map(non_empty));
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(non_empty).collect());
    }
    debug!("Parsed {} CSV records", rows.len());

    Ok(RawSheet::new(headers, rows))
}

/// Blank header cells get positional names and repeats get `.1`, `.2`
/// suffixes, the way spreadsheet tools label them.
fn header_names(cells: impl Iterator<Item = Option<String>>) -> Vec<String> {
    let mut headers: Vec<String> = cells
        .enumerate()
        .map(|(index, cell)| cell.unwrap_or_else(|| format!("Unnamed: {index}")))
        .collect();
    rename_duplicate_headers(&mut headers);
    headers
}

/// Text of a workbook cell. Whole floats drop their `.0`; date cells render
/// as `YYYY-MM-DD HH:MM:SS`.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            (*f as i64).to_string()
        }
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(datetime) => datetime.format(DATETIME_FORMAT).to_string(),
            None => dt.to_string(),
        },
        other => other.to_string(),
    };
    non_empty(&text)
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cell_text_conversions() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String(String::new())), None);
        assert_eq!(cell_text(&Data::Float(2021.0)), Some("2021".to_string()));
        assert_eq!(cell_text(&Data::Float(0.5)), Some("0.5".to_string()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".to_string()));
        assert_eq!(
            cell_text(&Data::String("Oman".to_string())),
            Some("Oman".to_string())
        );
    }

    #[test]
    fn test_date_cells_render_as_timestamps() {
        let date = Data::DateTime(ExcelDateTime::new(44927.0, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_text(&date), Some("2023-01-01 00:00:00".to_string()));

        let noon = Data::DateTime(ExcelDateTime::new(44927.5, ExcelDateTimeType::DateTime, false));
        assert_eq!(cell_text(&noon), Some("2023-01-01 12:00:00".to_string()));

        let iso = Data::DateTimeIso("2023-07-16T08:30:00".to_string());
        assert_eq!(cell_text(&iso), Some("2023-07-16T08:30:00".to_string()));
        assert_eq!(cell_text(&Data::DurationIso("PT2H".to_string())), Some("PT2H".to_string()));
    }

    #[test]
    fn test_repeated_csv_headers_are_renamed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ops.csv");
        fs::write(&path, "Country,Country,Remarks\nUAE,Oman,x\n").unwrap();

        let sheet = load_sheet(&path, "ignored").unwrap();
        assert_eq!(sheet.headers, vec!["Country", "Country.1", "Remarks"]);
    }

    #[test]
    fn test_loads_csv_with_blank_cells_and_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ops.csv");
        fs::write(&path, "Country,,Remarks\nOman,x,\nNorway\n").unwrap();

        let sheet = load_sheet(&path, "ignored").unwrap();
        assert_eq!(sheet.headers, vec!["Country", "Unnamed: 1", "Remarks"]);
        assert_eq!(
            sheet.rows,
            vec![
                vec![Some("Oman".to_string()), Some("x".to_string()), None],
                vec![Some("Norway".to_string()), None, None],
            ]
        );
    }

    #[test]
    fn test_missing_and_unsupported_inputs() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.xlsx");
        assert!(matches!(
            load_sheet(&missing, "Sheet1"),
            Err(EtlError::Sheet(_))
        ));

        let text = dir.path().join("ops.txt");
        fs::write(&text, "a").unwrap();
        assert!(matches!(load_sheet(&text, "Sheet1"), Err(EtlError::Sheet(_))));
    }
}
