//! Occurrence table reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::model::InputRecord;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Could not open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

/// Read every row of the occurrence table at `path`, in file order.
pub fn read_input_csv(path: &Path) -> Result<Vec<InputRecord>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_records(file)
}

/// Read rows from any reader. A header row is required; short rows are
/// accepted and their missing cells read as absent.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<InputRecord>, InputError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.deserialize::<InputRecord>() {
        records.push(result?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_column_order_and_extra_columns() {
        let data = "\
gbifID,day,month,year,decimalLatitude,decimalLongitude,species
1,15,1,2024,20.0,10.0,Chelonia mydas
";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].longitude.as_deref(), Some("10.0"));
        assert_eq!(rows[0].latitude.as_deref(), Some("20.0"));
        assert_eq!(rows[0].day.as_deref(), Some("15"));
    }

    #[test]
    fn missing_columns_read_as_absent() {
        let data = "decimalLongitude,decimalLatitude,year,month\n10.0,20.0,2024,1\n";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows[0].day, None);
    }

    #[test]
    fn short_rows_are_tolerated() {
        let data = "decimalLongitude,decimalLatitude,year,month,day\n10.0,20.0,2024\n";
        let rows = read_records(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year.as_deref(), Some("2024"));
        assert_eq!(rows[0].month, None);
    }

    #[test]
    fn header_only_is_empty() {
        let data = "decimalLongitude,decimalLatitude,year,month,day\n";
        assert!(read_records(data.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let err = read_input_csv(Path::new("/nonexistent/occurrences.csv")).unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }
}
