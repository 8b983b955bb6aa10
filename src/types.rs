use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};

/// One untyped sheet as read from the source: a header row plus data rows.
///
/// `None` cells were absent or empty in the source. Every row has exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawSheet {
    /// Build a sheet, padding short rows and cutting long rows to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let mut sheet = Self { headers, rows };
        sheet.square_rows();
        sheet
    }

    /// Pad or cut every row to the header width.
    ///
    /// The fields are public, so code that takes a sheet from outside calls
    /// this before indexing cells by column.
    pub fn square_rows(&mut self) {
        let width = self.headers.len();
        for row in self.rows.iter_mut() {
            row.resize(width, None);
        }
    }

    /// Convenience constructor from string cells; empty strings become `None`.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| non_empty(cell.as_ref())).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// `Some(text)` unless the cell is empty.
pub fn non_empty(cell: &str) -> Option<String> {
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Rename repeated headers to `<name>.1`, `<name>.2`, ... in order of appearance.
///
/// The first occurrence keeps its name. A generated name never collides with
/// a header seen earlier in the row.
pub fn rename_duplicate_headers(headers: &mut [String]) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    for header in headers.iter_mut() {
        if seen.insert(header.clone()) {
            continue;
        }
        let counter = counters.entry(header.clone()).or_insert(0);
        let renamed = loop {
            *counter += 1;
            let candidate = format!("{header}.{counter}");
            if !seen.contains(&candidate) {
                break candidate;
            }
        };
        seen.insert(renamed.clone());
        *header = renamed;
    }
}

/// A typed cell in a clean record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Absent,
}

/// Stand-in for missing cells in pass-through columns.
pub const SENTINEL: FieldValue = FieldValue::Int(0);

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Rendering used for CSV export.
    pub fn to_cell_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Int(n) => n.to_string(),
            FieldValue::Absent => String::new(),
        }
    }
}

impl From<Option<u32>> for FieldValue {
    fn from(value: Option<u32>) -> Self {
        match value {
            Some(n) => FieldValue::Int(i64::from(n)),
            None => FieldValue::Absent,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Int(n) => serializer.serialize_i64(*n),
            FieldValue::Absent => serializer.serialize_none(),
        }
    }
}

/// A normalized row, keeping the source column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanRecord {
    fields: Vec<(String, FieldValue)>,
}

impl CleanRecord {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for CleanRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
