/// Column and artifact name constants shared by the pipeline, the writers and the CLI.

// Recognized column headers in the operations sheet
pub const COL_MONTH: &str = "Month";
pub const COL_YEAR: &str = "Year";
pub const COL_REGION: &str = "Region";
pub const COL_COUNTRY: &str = "Country";
pub const COL_LOCATION: &str = "Location";
pub const COL_SUCCESSFUL: &str = "Successful";
pub const COL_SYSTEM: &str = "System";
pub const COL_REMARKS: &str = "Remarks";

// Defaults for the source workbook
pub const DEFAULT_SHEET_NAME: &str = "MasterData_Operations";
pub const DEFAULT_ANCHOR_COLUMN: &str = COL_REMARKS;
pub const DEFAULT_TRAILER_MARKER: &str = "add row above";

// Default fuzzy match cutoff for country and location names
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

// Anomaly log file names, written inside the configured log directory
pub const FUZZY_COUNTRIES_LOG: &str = "fuzzy_matched_countries.txt";
pub const UNKNOWN_COUNTRIES_LOG: &str = "unknown_countries.txt";
pub const FUZZY_LOCATIONS_LOG: &str = "fuzzy_matched_locations.txt";
pub const UNKNOWN_LOCATIONS_LOG: &str = "unknown_locations.txt";

// Environment overrides
pub const ENV_EXCEL_PATH: &str = "EXCEL_PATH";
pub const ENV_OUTPUT_PATH: &str = "KIOSK_ETL_OUTPUT";
pub const ENV_CONFIG_PATH: &str = "KIOSK_ETL_CONFIG";

/// Columns that must be present in the emitted records for the front end charts.
pub fn default_required_columns() -> Vec<String> {
    [COL_COUNTRY, COL_SYSTEM, COL_YEAR, COL_SUCCESSFUL]
        .iter()
        .map(|c| c.to_string())
        .collect()
}
