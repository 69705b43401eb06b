//! Per-row processing and the single-pass run.
//!
//! Each row ends up as a `RowOutcome`; the run keeps processed rows in input
//! order and tallies skips by reason. Nothing a single row does can stop the
//! run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::datasets::units_for;
use crate::fetch::{fetch_marine_data, FetchSettings};
use crate::ingest::MarineDataProvider;
use crate::input::{read_input_csv, InputError};
use crate::logging::{self, Component};
use crate::model::{
    InputRecord, OutputRecord, RowOutcome, SkipReason, VAR_SALINITY, VAR_TEMPERATURE,
};
use crate::output::{format_float, write_results, OutputError};
use crate::validate::validate_record;

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub requested_depth: f64,
    pub missing_value: String,
    pub fetch: FetchSettings,
}

/// Tally of a run's row outcomes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total_rows: usize,
    pub processed: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

impl RunSummary {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    fn record(&mut self, outcome: &RowOutcome) {
        self.total_rows += 1;
        match outcome {
            RowOutcome::Processed(_) => self.processed += 1,
            RowOutcome::Skipped(reason) => *self.skipped.entry(reason.kind()).or_insert(0) += 1,
        }
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunStatus {
    /// The input could not be read or had no rows.
    NoInput(Option<InputError>),
    /// Rows were read but none made it through.
    NoValidData,
    /// The enriched table was written.
    Written { path: PathBuf, rows: usize },
    /// Rows were enriched but the table could not be written.
    WriteFailed(OutputError),
}

#[derive(Debug)]
pub struct RunReport {
    pub status: RunStatus,
    pub summary: RunSummary,
}

fn row_label(row_number: usize) -> String {
    format!("row {}", row_number)
}

/// Validate, fetch and shape a single row.
///
/// `row_number` is 1-based, counting data rows only.
pub fn process_row<P: MarineDataProvider + ?Sized>(
    provider: &P,
    record: &InputRecord,
    row_number: usize,
    requested_depth: f64,
    settings: &FetchSettings,
) -> RowOutcome {
    let label = row_label(row_number);

    let point = match validate_record(record, requested_depth) {
        Ok(point) => point,
        Err(reason) => {
            logging::warn(Component::Input, Some(&label), &format!("Skipping row: {}", reason));
            return RowOutcome::Skipped(reason);
        }
    };

    let reading = match fetch_marine_data(provider, &point, settings) {
        Ok(reading) => reading,
        Err(err) => {
            let context = format!(
                "{} {},{}",
                label,
                format_float(point.longitude),
                format_float(point.latitude)
            );
            logging::log_provider_failure(&context, "Marine data query", &err);
            return RowOutcome::Skipped(SkipReason::ProviderUnavailable(err.to_string()));
        }
    };

    let record = OutputRecord::new(&point, reading);
    logging::info(
        Component::Marine,
        None,
        &format!(
            "✅ Processed: {},{} - {} - θ: {}{}, S: {} {}",
            format_float(record.longitude),
            format_float(record.latitude),
            point.date,
            fmt_reading(record.thetao),
            units_for(VAR_TEMPERATURE),
            fmt_reading(record.so),
            units_for(VAR_SALINITY)
        ),
    );
    RowOutcome::Processed(record)
}

fn fmt_reading(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "nan".to_string())
}

/// Run every record through `process_row`, keeping processed rows in order.
pub fn enrich_records<P: MarineDataProvider + ?Sized>(
    provider: &P,
    records: &[InputRecord],
    requested_depth: f64,
    settings: &FetchSettings,
) -> (Vec<OutputRecord>, RunSummary) {
    let mut results = Vec::new();
    let mut summary = RunSummary::default();

    for (idx, record) in records.iter().enumerate() {
        let outcome = process_row(provider, record, idx + 1, requested_depth, settings);
        summary.record(&outcome);
        if let RowOutcome::Processed(rec) = outcome {
            results.push(rec);
        }
    }

    (results, summary)
}

/// Read, enrich and write. Never fails; the outcome is in the report.
pub fn run<P: MarineDataProvider + ?Sized>(provider: &P, options: &RunOptions) -> RunReport {
    let records = match read_input_csv(&options.input_path) {
        Ok(records) => records,
        Err(err) => {
            logging::error(Component::Input, None, &format!("Error reading CSV: {}", err));
            return RunReport {
                status: RunStatus::NoInput(Some(err)),
                summary: RunSummary::default(),
            };
        }
    };

    if records.is_empty() {
        return RunReport {
            status: RunStatus::NoInput(None),
            summary: RunSummary::default(),
        };
    }

    logging::info(
        Component::Input,
        None,
        &format!("Read {} rows from {}", records.len(), options.input_path.display()),
    );

    let (results, summary) =
        enrich_records(provider, &records, options.requested_depth, &options.fetch);
    logging::log_run_summary(summary.total_rows, summary.processed, summary.skipped_total());

    if results.is_empty() {
        return RunReport {
            status: RunStatus::NoValidData,
            summary,
        };
    }

    let status = match write_results(&options.output_path, &results, &options.missing_value) {
        Ok(()) => RunStatus::Written {
            path: absolute(&options.output_path),
            rows: results.len(),
        },
        Err(err) => {
            logging::error(Component::Output, None, &format!("Error saving CSV: {}", err));
            RunStatus::WriteFailed(err)
        }
    };

    RunReport { status, summary }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ProviderError, Subset, SubsetRequest};

    struct Fixed;

    impl MarineDataProvider for Fixed {
        fn open_subset(&self, request: &SubsetRequest) -> Result<Subset, ProviderError> {
            let value = if request.variable == "thetao" { 18.3 } else { 36.1 };
            Ok(Subset { depths: vec![5.0], values: Some(vec![Some(value)]) })
        }
    }

    struct Down;

    impl MarineDataProvider for Down {
        fn open_subset(&self, _: &SubsetRequest) -> Result<Subset, ProviderError> {
            Err(ProviderError::Transport("connection refused".to_string()))
        }
    }

    fn row(lon: &str, day: Option<&str>) -> InputRecord {
        InputRecord {
            longitude: Some(lon.to_string()),
            latitude: Some("20.0".to_string()),
            year: Some("2024".to_string()),
            month: Some("1".to_string()),
            day: day.map(String::from),
        }
    }

    #[test]
    fn test_process_row_success() {
        let outcome = process_row(&Fixed, &row("10.0", Some("15")), 1, 5.0, &FetchSettings::default());
        match outcome {
            RowOutcome::Processed(rec) => {
                assert_eq!(rec.thetao, Some(18.3));
                assert_eq!(rec.so, Some(36.1));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_provider_failure_skips_row() {
        let outcome = process_row(&Down, &row("10.0", Some("15")), 1, 5.0, &FetchSettings::default());
        assert!(matches!(
            outcome,
            RowOutcome::Skipped(SkipReason::ProviderUnavailable(_))
        ));
    }

    #[test]
    fn test_enrich_keeps_order_and_tallies() {
        let records = vec![
            row("1.0", Some("1")),
            row("oops", Some("2")),
            row("3.0", None),
            row("4.0", Some("4")),
        ];
        let (results, summary) = enrich_records(&Fixed, &records, 0.494, &FetchSettings::default());

        let lons: Vec<f64> = results.iter().map(|r| r.longitude).collect();
        assert_eq!(lons, vec![1.0, 4.0]);
        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.skipped.get("invalid number"), Some(&1));
        assert_eq!(summary.skipped.get("missing field"), Some(&1));
        assert_eq!(summary.skipped_total(), 2);
    }
}
