use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Field, RowError};

// ── MeterReading ──────────────────────────────────────────────────────────────

/// A single validated energy measurement for one building.
///
/// `timestamp` is campus-local wall-clock time and drives date and hour
/// bucketing.  `instant` is the absolute point in time the reading was taken;
/// readings are ordered and told apart by [`MeterReading::key`], so two
/// readings that share a wall-clock time across a DST fall-back stay distinct.
/// Values are immutable once constructed; the constructors enforce the
/// `kwh >= 0` invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterReading {
    timestamp: NaiveDateTime,
    #[serde(skip)]
    instant: DateTime<Utc>,
    kwh: f64,
}

impl MeterReading {
    /// Build a reading whose wall-clock time is also its UTC instant.
    pub fn new(timestamp: NaiveDateTime, kwh: f64) -> Result<Self, RowError> {
        Self::at(CampusTimestamp::utc(timestamp), kwh)
    }

    /// Build a reading from a parsed campus timestamp, rejecting negative or
    /// non-finite consumption.  `-0.0` is stored as `0.0`.
    pub fn at(at: CampusTimestamp, kwh: f64) -> Result<Self, RowError> {
        if !kwh.is_finite() {
            return Err(RowError::Parse {
                field: Field::Kwh,
                value: kwh.to_string(),
                reason: "value is not a finite number".to_string(),
            });
        }
        if kwh < 0.0 {
            return Err(RowError::Parse {
                field: Field::Kwh,
                value: kwh.to_string(),
                reason: "consumption cannot be negative".to_string(),
            });
        }
        Ok(Self {
            timestamp: at.local,
            instant: at.instant,
            kwh: kwh + 0.0,
        })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// Ordering and identity key: the instant, then the wall-clock time.
    ///
    /// The wall-clock part only matters for naive times skipped by a DST
    /// jump, which share an instant with the first valid time after the gap.
    pub fn key(&self) -> (DateTime<Utc>, NaiveDateTime) {
        (self.instant, self.timestamp)
    }

    pub fn kwh(&self) -> f64 {
        self.kwh
    }

    /// Calendar date the reading falls on.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Hour of day, `0..=23`.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

// ── CampusTimestamp ───────────────────────────────────────────────────────────

/// A parsed timestamp: campus-local wall-clock time plus its UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampusTimestamp {
    pub local: NaiveDateTime,
    pub instant: DateTime<Utc>,
}

impl CampusTimestamp {
    /// A timestamp in a UTC campus, where wall-clock time and instant agree.
    pub fn utc(local: NaiveDateTime) -> Self {
        Self {
            local,
            instant: local.and_utc(),
        }
    }
}

// ── Derived aggregates ────────────────────────────────────────────────────────

/// Sum of one building's consumption on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_kwh: f64,
    /// Number of readings that contributed to the total.
    pub readings: usize,
}

/// Statistics over one fixed, non-overlapping 7-day window.
///
/// Windows are anchored to the first reading's date: window `n` covers days
/// `7n ..= 7n + 6` after the anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub week_index: u32,
    /// First calendar date of the window.
    pub start_date: NaiveDate,
    /// Last calendar date of the window (inclusive), even if it has no readings.
    pub end_date: NaiveDate,
    pub total_kwh: f64,
    /// Mean of the individual readings in the window.
    pub mean_kwh: f64,
    pub max_kwh: f64,
    pub min_kwh: f64,
    pub readings: usize,
}

/// The highest (or, for minimum queries, lowest) reading within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    pub kwh: f64,
    pub timestamp: NaiveDateTime,
}

impl From<&MeterReading> for PeakRecord {
    fn from(reading: &MeterReading) -> Self {
        Self {
            kwh: reading.kwh(),
            timestamp: reading.timestamp(),
        }
    }
}

/// Hour of day with the highest mean consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPeak {
    pub hour: u32,
    pub mean_kwh: f64,
}

/// One point of an hour-of-day consumption profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyMean {
    pub hour: u32,
    pub mean_kwh: f64,
    pub readings: usize,
}

/// Comparison of average daily campus consumption between an early and a
/// late window of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub first_days: usize,
    pub last_days: usize,
    pub first_avg: f64,
    pub last_avg: f64,
    pub percent_change: f64,
}

/// First and last reading timestamps covered by a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Flattened reading used for the cleaned-dataset export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub timestamp: NaiveDateTime,
    pub building: String,
    pub kwh: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
