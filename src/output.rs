//! Enriched table writer.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::model::{OutputRecord, OUTPUT_COLUMNS};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("File I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),
}

/// Format a float in shortest round-trip form, keeping a `.0` on integral
/// values so coordinates read back as floats (`10.0`, not `10`).
pub fn format_float(value: f64) -> String {
    let text = value.to_string();
    if !value.is_finite() || text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{}.0", text)
    }
}

fn format_reading(value: Option<f64>, missing_value: &str) -> String {
    match value {
        Some(v) if v.is_finite() => format_float(v),
        _ => missing_value.to_string(),
    }
}

/// Write the header and one row per record to `writer`.
pub fn write_records<W: Write>(
    writer: W,
    records: &[OutputRecord],
    missing_value: &str,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(OUTPUT_COLUMNS)?;

    for rec in records {
        wtr.write_record([
            format_float(rec.longitude),
            format_float(rec.latitude),
            rec.year.to_string(),
            rec.month.to_string(),
            rec.day.to_string(),
            format_reading(rec.thetao, missing_value),
            format_reading(rec.so, missing_value),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the enriched table to `path`, creating the parent directory if
/// needed and replacing any existing file.
pub fn write_results(
    path: &Path,
    records: &[OutputRecord],
    missing_value: &str,
) -> Result<(), OutputError> {
    let io_err = |source: std::io::Error| OutputError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file = File::create(path).map_err(io_err)?;
    write_records(file, records, missing_value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(thetao: Option<f64>, so: Option<f64>) -> OutputRecord {
        OutputRecord {
            longitude: 10.0,
            latitude: 20.0,
            year: 2024,
            month: 1,
            day: 15,
            thetao,
            so,
        }
    }

    fn render(records: &[OutputRecord], missing: &str) -> String {
        let mut buf = Vec::new();
        write_records(&mut buf, records, missing).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(10.0), "10.0");
        assert_eq!(format_float(-38.5), "-38.5");
        assert_eq!(format_float(18.3), "18.3");
        assert_eq!(format_float(0.494), "0.494");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn test_header_and_row() {
        let out = render(&[rec(Some(18.3), Some(36.1))], "nan");
        assert_eq!(
            out,
            "decimalLongitude,decimalLatitude,year,month,day,thetao,so\n\
             10.0,20.0,2024,1,15,18.3,36.1\n"
        );
    }

    #[test]
    fn test_missing_readings_use_token() {
        let out = render(&[rec(None, Some(35.0))], "nan");
        assert!(out.ends_with("10.0,20.0,2024,1,15,nan,35.0\n"));

        let out = render(&[rec(Some(f64::NAN), None)], "");
        assert!(out.ends_with("10.0,20.0,2024,1,15,,\n"));
    }

    #[test]
    fn test_empty_list_writes_header_only() {
        assert_eq!(render(&[], "nan"), "decimalLongitude,decimalLatitude,year,month,day,thetao,so\n");
    }

    #[test]
    fn test_creates_parent_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        write_results(&path, &[rec(Some(1.0), Some(2.0)), rec(None, None)], "nan").unwrap();
        write_results(&path, &[rec(Some(18.3), Some(36.1))], "nan").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("18.3,36.1"));
    }
}
