use std::collections::BTreeMap;
use tracing::info;

use crate::error::{EtlError, Result};
use crate::types::RawSheet;

/// Map every distinct trimmed value of `column` to itself, sorted.
///
/// The result seeds a hand-edited location table or a `known_cities.json`.
pub fn location_template(sheet: &RawSheet, column: &str) -> Result<BTreeMap<String, String>> {
    let index = sheet
        .headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| EtlError::Schema {
            column: column.to_string(),
        })?;

    let template: BTreeMap<String, String> = sheet
        .rows
        .iter()
        .filter_map(|row| row.get(index).and_then(Option::as_deref))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| (v.to_string(), v.to_string()))
        .collect();

    info!(
        "✍ Built normalization template with {} entries",
        template.len()
    );
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_maps_distinct_values_to_themselves() {
        let sheet = RawSheet::from_strings(
            [" Location ", "Remarks"],
            vec![
                vec!["Muscat ", ""],
                vec!["Aberdeen", ""],
                vec!["Muscat", ""],
                vec!["", ""],
            ],
        );

        let template = location_template(&sheet, "Location").unwrap();
        assert_eq!(
            template.into_iter().collect::<Vec<_>>(),
            vec![
                ("Aberdeen".to_string(), "Aberdeen".to_string()),
                ("Muscat".to_string(), "Muscat".to_string()),
            ]
        );
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let sheet = RawSheet {
            headers: vec!["Country".to_string(), "Location".to_string()],
            rows: vec![vec![Some("Oman".to_string())], vec![], vec![None, Some("Muscat".to_string())]],
        };

        let template = location_template(&sheet, "Location").unwrap();
        assert_eq!(template.len(), 1);
        assert_eq!(template.get("Muscat").map(String::as_str), Some("Muscat"));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let sheet = RawSheet::from_strings(["Country"], vec![vec!["Oman"]]);
        assert!(matches!(
            location_template(&sheet, "Location"),
            Err(EtlError::Schema { .. })
        ));
    }
}
