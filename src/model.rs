/// Core data types for the occurrence enrichment pipeline.
///
/// This module defines the shared domain model imported by all other modules:
/// raw input rows, validated points, marine readings and the enriched output
/// rows, plus the per-row outcome types. It contains no I/O.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const COL_LONGITUDE: &str = "decimalLongitude";
pub const COL_LATITUDE: &str = "decimalLatitude";
pub const COL_YEAR: &str = "year";
pub const COL_MONTH: &str = "month";
pub const COL_DAY: &str = "day";

/// Variable name for sea water potential temperature, in degrees Celsius.
pub const VAR_TEMPERATURE: &str = "thetao";

/// Variable name for sea water salinity, in PSU.
pub const VAR_SALINITY: &str = "so";

/// Output header, in the order columns are written.
pub const OUTPUT_COLUMNS: [&str; 7] = [
    COL_LONGITUDE,
    COL_LATITUDE,
    COL_YEAR,
    COL_MONTH,
    COL_DAY,
    VAR_TEMPERATURE,
    VAR_SALINITY,
];

/// Depth in meters used when none is requested (the shallowest level of the
/// global physics products).
pub const DEFAULT_DEPTH_M: f64 = 0.494;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One raw row of the occurrence table.
///
/// Only the columns the pipeline needs are kept; any other column in the
/// input is ignored by the deserializer. Cells stay as strings here so that
/// conversion failures can be reported per row instead of failing the read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputRecord {
    #[serde(rename = "decimalLongitude", default)]
    pub longitude: Option<String>,
    #[serde(rename = "decimalLatitude", default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
}

/// A row that passed validation: numeric coordinates and a real calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub date: NaiveDate,
    pub requested_depth: f64,
}

/// Temperature and salinity at the resolved depth. `None` means the
/// provider had no value for that variable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarineReading {
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
}

impl MarineReading {
    pub fn missing() -> Self {
        Self::default()
    }
}

/// One enriched row, written to the output table.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub thetao: Option<f64>,
    pub so: Option<f64>,
}

impl OutputRecord {
    pub fn new(point: &ValidatedPoint, reading: MarineReading) -> Self {
        use chrono::Datelike;
        Self {
            longitude: point.longitude,
            latitude: point.latitude,
            year: point.date.year(),
            month: point.date.month(),
            day: point.date.day(),
            thetao: reading.temperature,
            so: reading.salinity,
        }
    }
}

// ---------------------------------------------------------------------------
// Row outcomes
// ---------------------------------------------------------------------------

/// Why a row produced no output.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A required column was absent or blank.
    MissingField(&'static str),
    /// A column could not be converted to a number.
    InvalidNumber { field: &'static str, value: String },
    /// Year/month/day do not form a calendar date.
    InvalidDate { year: i64, month: i64, day: i64 },
    /// The marine data service failed while answering for this row.
    ProviderUnavailable(String),
}

impl SkipReason {
    /// Short stable label, used for the per-reason tally.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::MissingField(_) => "missing field",
            SkipReason::InvalidNumber { .. } => "invalid number",
            SkipReason::InvalidDate { .. } => "invalid date",
            SkipReason::ProviderUnavailable(_) => "provider unavailable",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing required field '{}'", field),
            SkipReason::InvalidNumber { field, value } => {
                write!(f, "could not convert {} '{}' to a number", field, value)
            }
            SkipReason::InvalidDate { year, month, day } => {
                write!(f, "invalid date {:04}-{:02}-{:02}", year, month, day)
            }
            SkipReason::ProviderUnavailable(msg) => write!(f, "marine data unavailable: {}", msg),
        }
    }
}

/// Result of processing one input row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Processed(OutputRecord),
    Skipped(SkipReason),
}
