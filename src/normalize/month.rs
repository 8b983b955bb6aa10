use crate::types::FieldValue;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number 1–12 from a numeric string or a month name.
///
/// Names match on their first three letters, case-insensitively, so
/// `"Sept"`, `"sep"` and `"September 2021"` all give 9. Shorter words such as
/// `"ma"` are ambiguous and give `None`.
pub fn normalize_month(raw: &str) -> Option<u32> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }

    if let Some(number) = parse_whole_number(&value) {
        return u32::try_from(number).ok().filter(|n| (1..=12).contains(n));
    }

    let prefix: String = value.chars().take(3).collect();
    if prefix.chars().count() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&prefix))
        .map(|index| index as u32 + 1)
}

/// Integer year when the cell holds a whole number, else the trimmed text.
pub fn normalize_year(raw: &str) -> FieldValue {
    let value = raw.trim();
    match parse_whole_number(value) {
        Some(year) => FieldValue::Int(year),
        None => FieldValue::text(value),
    }
}

/// Spreadsheet exports write integers as `"2021"` or `"2021.0"`.
fn parse_whole_number(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float.abs() < 1e15 {
        Some(float as i64)
    } else {
        None
    }
}
