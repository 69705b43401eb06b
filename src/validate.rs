//! Row validation: raw strings in, a typed point or a skip reason out.
//!
//! Date parts are read the lenient way occurrence exports need: `"2024.0"`
//! is year 2024, and fractional parts are truncated toward zero.

use chrono::NaiveDate;

use crate::model::{
    InputRecord, SkipReason, ValidatedPoint, COL_DAY, COL_LATITUDE, COL_LONGITUDE, COL_MONTH,
    COL_YEAR,
};

/// Largest magnitude accepted for a date part before it is treated as noise.
const MAX_DATE_PART: f64 = 1.0e9;

/// Validate one input row against the requested depth.
pub fn validate_record(
    record: &InputRecord,
    requested_depth: f64,
) -> Result<ValidatedPoint, SkipReason> {
    // The date parts gate the row before any conversion happens
    let year_raw = required_present(&record.year, COL_YEAR)?;
    let month_raw = required_present(&record.month, COL_MONTH)?;
    let day_raw = required_present(&record.day, COL_DAY)?;

    let longitude = parse_float(record.longitude.as_deref(), COL_LONGITUDE)?;
    let latitude = parse_float(record.latitude.as_deref(), COL_LATITUDE)?;
    let year = parse_date_part(year_raw, COL_YEAR)?;
    let month = parse_date_part(month_raw, COL_MONTH)?;
    let day = parse_date_part(day_raw, COL_DAY)?;

    let date = calendar_date(year, month, day).ok_or(SkipReason::InvalidDate { year, month, day })?;

    Ok(ValidatedPoint {
        longitude,
        latitude,
        date,
        requested_depth,
    })
}

fn required_present<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, SkipReason> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SkipReason::MissingField(field)),
    }
}

fn parse_float(value: Option<&str>, field: &'static str) -> Result<f64, SkipReason> {
    let raw = value.ok_or(SkipReason::MissingField(field))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SkipReason::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

fn parse_date_part(raw: &str, field: &'static str) -> Result<i64, SkipReason> {
    let value = parse_float(Some(raw), field)?;
    if value.abs() >= MAX_DATE_PART {
        return Err(SkipReason::InvalidNumber {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value.trunc() as i64)
}

fn calendar_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok()?;
    let day = u32::try_from(day).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lon: &str, lat: &str, year: &str, month: &str, day: &str) -> InputRecord {
        let cell = |s: &str| Some(s.to_string());
        InputRecord {
            longitude: cell(lon),
            latitude: cell(lat),
            year: cell(year),
            month: cell(month),
            day: cell(day),
        }
    }

    #[test]
    fn valid_row() {
        let point = validate_record(&record("10.0", "20.0", "2024", "1", "15"), 5.0).unwrap();
        assert_eq!(point.longitude, 10.0);
        assert_eq!(point.latitude, 20.0);
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(point.requested_depth, 5.0);
    }

    #[test]
    fn float_date_parts_truncate() {
        let point = validate_record(&record("-38.5", "-12.9", "2019.0", "7.0", "3.9"), 0.494).unwrap();
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2019, 7, 3).unwrap());
    }

    #[test]
    fn whitespace_is_tolerated() {
        let point = validate_record(&record(" 10.5 ", "20", " 2024", "1 ", "15"), 0.494).unwrap();
        assert_eq!(point.longitude, 10.5);
    }

    #[test]
    fn missing_day_is_skipped() {
        let mut rec = record("10.0", "20.0", "2024", "1", "15");
        rec.day = None;
        assert_eq!(validate_record(&rec, 0.494), Err(SkipReason::MissingField(COL_DAY)));
    }

    #[test]
    fn blank_month_is_skipped() {
        let rec = record("10.0", "20.0", "2024", "  ", "15");
        assert_eq!(validate_record(&rec, 0.494), Err(SkipReason::MissingField(COL_MONTH)));
    }

    #[test]
    fn date_presence_checked_before_coordinates() {
        let rec = record("abc", "20.0", "2024", "1", "");
        assert_eq!(validate_record(&rec, 0.494), Err(SkipReason::MissingField(COL_DAY)));
    }

    #[test]
    fn non_numeric_longitude() {
        let rec = record("ten", "20.0", "2024", "1", "15");
        assert_eq!(
            validate_record(&rec, 0.494),
            Err(SkipReason::InvalidNumber { field: COL_LONGITUDE, value: "ten".to_string() })
        );
    }

    #[test]
    fn absent_latitude() {
        let mut rec = record("10.0", "20.0", "2024", "1", "15");
        rec.latitude = None;
        assert_eq!(validate_record(&rec, 0.494), Err(SkipReason::MissingField(COL_LATITUDE)));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let rec = record("inf", "20.0", "2024", "1", "15");
        assert!(matches!(validate_record(&rec, 0.494), Err(SkipReason::InvalidNumber { .. })));

        let rec = record("10.0", "NaN", "2024", "1", "15");
        assert!(matches!(validate_record(&rec, 0.494), Err(SkipReason::InvalidNumber { .. })));
    }

    #[test]
    fn impossible_dates() {
        let rec = record("10.0", "20.0", "2023", "2", "29");
        assert_eq!(
            validate_record(&rec, 0.494),
            Err(SkipReason::InvalidDate { year: 2023, month: 2, day: 29 })
        );

        let rec = record("10.0", "20.0", "2024", "-1", "15");
        assert!(matches!(validate_record(&rec, 0.494), Err(SkipReason::InvalidDate { .. })));

        let rec = record("10.0", "20.0", "2024", "13", "1");
        assert!(matches!(validate_record(&rec, 0.494), Err(SkipReason::InvalidDate { .. })));
    }

    #[test]
    fn leap_day() {
        let point = validate_record(&record("10.0", "20.0", "2024", "2", "29"), 0.494).unwrap();
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
