//! Per-building aggregation over a sorted stream of meter readings.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use energy_core::calculations::{select_minimum, select_peak, HourlyAccumulator};
use energy_core::error::{EnergyError, Result, RowError};
use energy_core::models::{
    AnalysisPeriod, DailyTotal, HourlyMean, HourlyPeak, MeterReading, PeakRecord, WeeklyAggregate,
};

const WEEK_DAYS: i64 = 7;

// ── Bucket ────────────────────────────────────────────────────────────────────

/// Running statistics for one time bucket.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    total: f64,
    max: f64,
    min: f64,
    count: usize,
}

impl Bucket {
    fn new(reading: &MeterReading) -> Self {
        Self {
            total: reading.kwh(),
            max: reading.kwh(),
            min: reading.kwh(),
            count: 1,
        }
    }

    fn add(&mut self, reading: &MeterReading) {
        self.total += reading.kwh();
        self.max = self.max.max(reading.kwh());
        self.min = self.min.min(reading.kwh());
        self.count += 1;
    }
}

// ── Building ──────────────────────────────────────────────────────────────────

/// One facility and its readings, kept sorted ascending by timestamp with no
/// two readings sharing a timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    name: String,
    readings: Vec<MeterReading>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            readings: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Readings in ascending instant order.
    pub fn readings(&self) -> &[MeterReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Insert `reading` at its sorted position.
    ///
    /// Readings are ordered by [`MeterReading::key`].  If a reading with the
    /// same key already exists the existing one is kept and
    /// [`RowError::DuplicateTimestamp`] is returned.
    pub fn add_reading(&mut self, reading: MeterReading) -> std::result::Result<(), RowError> {
        let key = reading.key();

        // Fast path for the common already-sorted input.
        if self.readings.last().map_or(true, |last| last.key() < key) {
            self.readings.push(reading);
            return Ok(());
        }

        match self.readings.binary_search_by_key(&key, MeterReading::key) {
            Ok(_) => Err(RowError::DuplicateTimestamp(reading.timestamp())),
            Err(pos) => {
                self.readings.insert(pos, reading);
                Ok(())
            }
        }
    }

    // ── Totals ────────────────────────────────────────────────────────────────

    /// Sum of all readings (0.0 for an empty building).
    pub fn total_consumption(&self) -> f64 {
        self.readings.iter().map(MeterReading::kwh).sum()
    }

    /// Mean kWh per reading.
    pub fn average_consumption(&self) -> Result<f64> {
        if self.is_empty() {
            return Err(self.empty_error());
        }
        Ok(self.total_consumption() / self.len() as f64)
    }

    /// Highest reading; the earliest timestamp wins a tie.
    pub fn peak_consumption(&self) -> Result<PeakRecord> {
        select_peak(&self.readings).ok_or_else(|| self.empty_error())
    }

    /// Lowest reading; the earliest timestamp wins a tie.
    pub fn minimum_consumption(&self) -> Result<PeakRecord> {
        select_minimum(&self.readings).ok_or_else(|| self.empty_error())
    }

    /// First and last reading timestamps, `None` for an empty building.
    pub fn period(&self) -> Option<AnalysisPeriod> {
        match (self.readings.first(), self.readings.last()) {
            (Some(first), Some(last)) => Some(AnalysisPeriod {
                start: first.timestamp(),
                end: last.timestamp(),
            }),
            _ => None,
        }
    }

    // ── Time buckets ──────────────────────────────────────────────────────────

    /// Consumption per calendar date, ascending.
    ///
    /// Dates without readings are absent rather than zero-filled.
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        self.aggregate_by(MeterReading::date)
            .into_iter()
            .map(|(date, b)| DailyTotal {
                date,
                total_kwh: b.total,
                readings: b.count,
            })
            .collect()
    }

    /// Statistics over fixed 7-day windows anchored to the first reading's date.
    ///
    /// The trailing window may be partial; windows with no readings at all are
    /// absent.
    pub fn weekly_aggregates(&self) -> Vec<WeeklyAggregate> {
        let Some(anchor) = self.readings.first().map(MeterReading::date) else {
            return Vec::new();
        };

        self.aggregate_by(|r| week_index(anchor, r.date()))
            .into_iter()
            .map(|(week_index, b)| {
                let start_date = anchor + Duration::days(i64::from(week_index) * WEEK_DAYS);
                WeeklyAggregate {
                    week_index,
                    start_date,
                    end_date: start_date + Duration::days(WEEK_DAYS - 1),
                    total_kwh: b.total,
                    mean_kwh: b.total / b.count as f64,
                    max_kwh: b.max,
                    min_kwh: b.min,
                    readings: b.count,
                }
            })
            .collect()
    }

    /// Mean kWh per hour of day across all dates, ascending by hour.
    pub fn hourly_profile(&self) -> Vec<HourlyMean> {
        self.hourly().profile()
    }

    /// Hour of day with the highest mean kWh; the lowest hour wins a tie.
    pub fn peak_hour_of_day(&self) -> Result<HourlyPeak> {
        self.hourly().peak().ok_or_else(|| self.empty_error())
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn hourly(&self) -> HourlyAccumulator {
        let mut acc = HourlyAccumulator::new();
        acc.extend(&self.readings);
        acc
    }

    /// Generic bucketing driver; `key_fn` maps a reading to its bucket key.
    fn aggregate_by<K: Ord>(&self, key_fn: impl Fn(&MeterReading) -> K) -> BTreeMap<K, Bucket> {
        let mut map: BTreeMap<K, Bucket> = BTreeMap::new();
        for reading in &self.readings {
            map.entry(key_fn(reading))
                .and_modify(|b| b.add(reading))
                .or_insert_with(|| Bucket::new(reading));
        }
        map
    }

    fn empty_error(&self) -> EnergyError {
        EnergyError::EmptyData(format!("building {}", self.name))
    }
}

/// Index of the fixed 7-day window containing `date`.
fn week_index(anchor: NaiveDate, date: NaiveDate) -> u32 {
    ((date - anchor).num_days() / WEEK_DAYS) as u32
}

// ── Tests ─────────────────────────────────────────────────────────────────────
