//! Row validation: raw string tuples in, [`MeterReading`] values or a
//! [`RowError`] out.

use energy_core::error::{Field, RowError};
use energy_core::models::MeterReading;
use energy_core::time_utils::TimestampParser;
use serde::{Deserialize, Serialize};

// ── RawRow ────────────────────────────────────────────────────────────────────

/// An unvalidated input row as handed over by the acquisition layer.
///
/// Every field is optional so that absent columns and blank cells can be
/// reported as [`RowError::MissingField`] instead of failing to decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Where the row came from (file name, `"memory"`, ...).
    pub source: String,
    /// 1-based line within `source`, `0` when unknown.
    pub line: usize,
    pub building: Option<String>,
    pub timestamp: Option<String>,
    pub kwh: Option<String>,
}

impl RawRow {
    /// Convenience constructor for in-memory rows with all three fields set.
    pub fn new(building: &str, timestamp: &str, kwh: &str) -> Self {
        Self {
            source: "memory".to_string(),
            line: 0,
            building: Some(building.to_string()),
            timestamp: Some(timestamp.to_string()),
            kwh: Some(kwh.to_string()),
        }
    }

    pub fn with_origin(mut self, source: impl Into<String>, line: usize) -> Self {
        self.source = source.into();
        self.line = line;
        self
    }

    /// The trimmed building id, or `None` if absent or blank.
    pub fn building_id(&self) -> Option<&str> {
        non_blank(self.building.as_deref())
    }
}

/// A row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReading {
    pub building: String,
    pub reading: MeterReading,
}

// ── ReadingValidator ──────────────────────────────────────────────────────────

/// Stateless, reentrant row validator.
///
/// The only configuration it carries is the immutable timestamp parser, so a
/// single instance can be shared by reference (or copied) across workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadingValidator {
    parser: TimestampParser,
}

impl ReadingValidator {
    pub fn new(parser: TimestampParser) -> Self {
        Self { parser }
    }

    /// Validate one `(building_id, timestamp, kwh)` tuple.
    ///
    /// Missing or blank fields are reported before any parsing is attempted,
    /// in column order: building, timestamp, kwh.
    pub fn validate(
        &self,
        building_id: Option<&str>,
        raw_timestamp: Option<&str>,
        raw_kwh: Option<&str>,
    ) -> Result<ValidReading, RowError> {
        let building = required(building_id, Field::Building)?;
        let raw_timestamp = required(raw_timestamp, Field::Timestamp)?;
        let raw_kwh = required(raw_kwh, Field::Kwh)?;

        let timestamp = self.parser.parse(raw_timestamp)?;
        let kwh = parse_kwh(raw_kwh)?;

        let reading = MeterReading::at(timestamp, kwh).map_err(|e| match e {
            // Report the caller's original text rather than the parsed float.
            RowError::Parse { field, reason, .. } => RowError::Parse {
                field,
                value: raw_kwh.to_string(),
                reason,
            },
            other => other,
        })?;

        Ok(ValidReading {
            building: building.to_string(),
            reading,
        })
    }

    /// Validate a [`RawRow`].
    pub fn validate_row(&self, row: &RawRow) -> Result<ValidReading, RowError> {
        self.validate(
            row.building.as_deref(),
            row.timestamp.as_deref(),
            row.kwh.as_deref(),
        )
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: Option<&str>, field: Field) -> Result<&str, RowError> {
    non_blank(value).ok_or(RowError::MissingField(field))
}

fn parse_kwh(raw: &str) -> Result<f64, RowError> {
    raw.parse::<f64>().map_err(|e| RowError::Parse {
        field: Field::Kwh,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn validator() -> ReadingValidator {
        ReadingValidator::default()
    }

    #[test]
    fn test_validate_ok() {
        let v = validator()
            .validate(Some(" Library "), Some("2024-01-15 08:00:00"), Some(" 12.5 "))
            .unwrap();
        assert_eq!(v.building, "Library");
        assert_eq!(v.reading.kwh(), 12.5);
        assert_eq!(
            v.reading.timestamp(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_validate_missing_building() {
        let err = validator()
            .validate(None, Some("2024-01-15 08:00:00"), Some("1"))
            .unwrap_err();
        assert_eq!(err, RowError::MissingField(Field::Building));
    }

    #[test]
    fn test_validate_blank_timestamp_is_missing() {
        let err = validator()
            .validate(Some("Library"), Some("   "), Some("1"))
            .unwrap_err();
        assert_eq!(err, RowError::MissingField(Field::Timestamp));
    }

    #[test]
    fn test_validate_missing_kwh() {
        let err = validator()
            .validate(Some("Library"), Some("2024-01-15 08:00:00"), Some(""))
            .unwrap_err();
        assert_eq!(err, RowError::MissingField(Field::Kwh));
    }

    #[test]
    fn test_validate_missing_reported_before_parse() {
        // Timestamp is garbage, but the missing kwh is reported first.
        let err = validator()
            .validate(Some("Library"), Some("garbage"), None)
            .unwrap_err();
        assert_eq!(err, RowError::MissingField(Field::Kwh));
    }

    #[test]
    fn test_validate_bad_timestamp() {
        let err = validator()
            .validate(Some("Library"), Some("15/01/2024 8am"), Some("1"))
            .unwrap_err();
        assert!(matches!(
            err,
            RowError::Parse {
                field: Field::Timestamp,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_non_numeric_kwh() {
        let err = validator()
            .validate(Some("Library"), Some("2024-01-15 08:00:00"), Some("twelve"))
            .unwrap_err();
        match err {
            RowError::Parse { field, value, .. } => {
                assert_eq!(field, Field::Kwh);
                assert_eq!(value, "twelve");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_negative_kwh_keeps_raw_value() {
        let err = validator()
            .validate(Some("Library"), Some("2024-01-15 08:00:00"), Some("-3.0"))
            .unwrap_err();
        match err {
            RowError::Parse { field, value, .. } => {
                assert_eq!(field, Field::Kwh);
                assert_eq!(value, "-3.0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_negative_zero_is_plain_zero() {
        for raw in ["-0", "-0.0"] {
            let v = validator()
                .validate(Some("Library"), Some("2024-01-15 08:00:00"), Some(raw))
                .unwrap();
            assert_eq!(v.reading.kwh(), 0.0);
            assert!(v.reading.kwh().is_sign_positive(), "{raw} kept its sign");
        }
    }

    #[test]
    fn test_validate_offset_timestamp_keeps_instant() {
        let v = ReadingValidator::new(TimestampParser::from_name("America/New_York"))
            .validate(Some("Library"), Some("2024-11-03T06:30:00Z"), Some("2"))
            .unwrap();
        assert_eq!(
            v.reading.timestamp(),
            NaiveDate::from_ymd_opt(2024, 11, 3)
                .unwrap()
                .and_hms_opt(1, 30, 0)
                .unwrap()
        );
        assert_eq!(v.reading.instant().to_rfc3339(), "2024-11-03T06:30:00+00:00");
    }

    #[test]
    fn test_validate_nan_kwh_rejected() {
        assert!(validator()
            .validate(Some("Library"), Some("2024-01-15 08:00:00"), Some("NaN"))
            .is_err());
    }

    #[test]
    fn test_validate_row() {
        let row = RawRow::new("Admin", "2024-01-15T09:00:00", "4").with_origin("Admin.csv", 3);
        assert_eq!(row.line, 3);
        let v = validator().validate_row(&row).unwrap();
        assert_eq!(v.building, "Admin");
    }

    #[test]
    fn test_raw_row_building_id_trims() {
        let mut row = RawRow::new("  Gym ", "x", "y");
        assert_eq!(row.building_id(), Some("Gym"));
        row.building = Some("  ".to_string());
        assert_eq!(row.building_id(), None);
    }
}
