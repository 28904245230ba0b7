//! Campus-wide rollups across every building of a run.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use energy_core::calculations::{mean, percent_change, select_peak, HourlyAccumulator};
use energy_core::error::{EnergyError, Result};
use energy_core::models::{
    AnalysisPeriod, DailyTotal, HourlyMean, HourlyPeak, PeakRecord, ReadingRecord, Trend,
};
use tracing::warn;

use crate::building::Building;

/// Every building of one run, keyed by unique name.
///
/// Iteration is by name, ascending, which keeps every derived value
/// deterministic regardless of ingestion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Campus {
    buildings: BTreeMap<String, Building>,
}

impl Campus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `building` to the campus.
    ///
    /// A building without readings is refused with [`EnergyError::EmptyData`].
    /// If a building with the same name already exists it is replaced and
    /// returned.
    pub fn add_building(&mut self, building: Building) -> Result<Option<Building>> {
        if building.is_empty() {
            return Err(EnergyError::EmptyData(format!(
                "building {}",
                building.name()
            )));
        }
        let previous = self.buildings.insert(building.name().to_string(), building);
        if let Some(ref prev) = previous {
            warn!(building = prev.name(), "building replaced in campus");
        }
        Ok(previous)
    }

    pub fn get_building(&self, name: &str) -> Result<&Building> {
        self.buildings
            .get(name)
            .ok_or_else(|| EnergyError::NotFound(name.to_string()))
    }

    /// Buildings in name order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn building_names(&self) -> Vec<&str> {
        self.buildings.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// Total number of readings across all buildings.
    pub fn reading_count(&self) -> usize {
        self.buildings().map(Building::len).sum()
    }

    // ── Rollups ───────────────────────────────────────────────────────────────

    /// Sum of every building's total consumption.
    pub fn campus_total(&self) -> f64 {
        self.buildings().map(Building::total_consumption).sum()
    }

    /// Each building's share of the campus total, in percent.
    ///
    /// The shares sum to 100 (within floating-point tolerance).  Fails with
    /// [`EnergyError::EmptyData`] when the campus total is zero.
    pub fn building_percentages(&self) -> Result<BTreeMap<String, f64>> {
        let total = self.campus_total();
        if total <= 0.0 {
            return Err(EnergyError::EmptyData(
                "campus (total consumption is zero)".to_string(),
            ));
        }
        Ok(self
            .buildings
            .iter()
            .map(|(name, b)| (name.clone(), b.total_consumption() / total * 100.0))
            .collect())
    }

    /// Building with the highest total; ties go to the lexicographically
    /// smallest name.
    pub fn highest_consumer(&self) -> Result<&Building> {
        self.select_consumer(|candidate, best| candidate > best)
    }

    /// Building with the lowest total; ties go to the lexicographically
    /// smallest name.
    pub fn lowest_consumer(&self) -> Result<&Building> {
        self.select_consumer(|candidate, best| candidate < best)
    }

    /// Highest single reading on campus; the earliest timestamp wins a tie,
    /// then the smallest building name.
    pub fn peak_consumption(&self) -> Result<(String, PeakRecord)> {
        let mut best: Option<(&str, PeakRecord)> = None;
        for b in self.buildings() {
            let Some(peak) = select_peak(b.readings()) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, current)) => {
                    peak.kwh > current.kwh
                        || (peak.kwh == current.kwh && peak.timestamp < current.timestamp)
                }
            };
            if better {
                best = Some((b.name(), peak));
            }
        }
        best.map(|(name, peak)| (name.to_string(), peak))
            .ok_or_else(|| EnergyError::EmptyData("campus".to_string()))
    }

    /// Mean kWh per hour of day with readings pooled from every building.
    pub fn campus_hourly_profile(&self) -> Vec<HourlyMean> {
        self.hourly().profile()
    }

    /// Hour of day with the highest pooled mean; the lowest hour wins a tie.
    pub fn campus_peak_hour(&self) -> Result<HourlyPeak> {
        self.hourly()
            .peak()
            .ok_or_else(|| EnergyError::EmptyData("campus".to_string()))
    }

    /// Campus-wide consumption per calendar date, ascending.  Dates where no
    /// building has a reading are absent.
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        let mut by_date: BTreeMap<NaiveDate, DailyTotal> = BTreeMap::new();
        for b in self.buildings() {
            for day in b.daily_totals() {
                by_date
                    .entry(day.date)
                    .and_modify(|d| {
                        d.total_kwh += day.total_kwh;
                        d.readings += day.readings;
                    })
                    .or_insert(day);
            }
        }
        by_date.into_values().collect()
    }

    /// Compare average daily campus consumption over the first
    /// `first_n_days` and the last `last_n_days` distinct dates.
    ///
    /// The two windows never overlap: fewer than `first_n_days + last_n_days`
    /// distinct dates, an empty window, or a zero baseline all fail with
    /// [`EnergyError::InsufficientData`].
    pub fn trend(&self, first_n_days: usize, last_n_days: usize) -> Result<Trend> {
        if first_n_days == 0 || last_n_days == 0 {
            return Err(EnergyError::InsufficientData(
                "trend windows must cover at least one day each".to_string(),
            ));
        }

        let daily: Vec<f64> = self.daily_totals().iter().map(|d| d.total_kwh).collect();
        let required = first_n_days + last_n_days;
        if daily.len() < required {
            return Err(EnergyError::InsufficientData(format!(
                "trend needs {} distinct dates, found {}",
                required,
                daily.len()
            )));
        }

        let first_avg = mean(&daily[..first_n_days]).unwrap_or_default();
        let last_avg = mean(&daily[daily.len() - last_n_days..]).unwrap_or_default();
        if first_avg == 0.0 {
            return Err(EnergyError::InsufficientData(
                "first trend window has zero consumption".to_string(),
            ));
        }

        Ok(Trend {
            first_days: first_n_days,
            last_days: last_n_days,
            first_avg,
            last_avg,
            percent_change: percent_change(first_avg, last_avg),
        })
    }

    /// Earliest and latest reading across the campus.
    pub fn period(&self) -> Option<AnalysisPeriod> {
        self.buildings()
            .filter_map(Building::period)
            .reduce(|acc, p| AnalysisPeriod {
                start: acc.start.min(p.start),
                end: acc.end.max(p.end),
            })
    }

    /// Every reading as a flat record: buildings by name, readings ascending
    /// by timestamp within each building.
    pub fn flattened_readings(&self) -> Vec<ReadingRecord> {
        self.buildings()
            .flat_map(|b| {
                b.readings().iter().map(move |r| ReadingRecord {
                    timestamp: r.timestamp(),
                    building: b.name().to_string(),
                    kwh: r.kwh(),
                })
            })
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn hourly(&self) -> HourlyAccumulator {
        let mut acc = HourlyAccumulator::new();
        for b in self.buildings() {
            acc.extend(b.readings());
        }
        acc
    }

    /// Scan buildings in name order and keep the first one `is_better` prefers.
    fn select_consumer(&self, is_better: impl Fn(f64, f64) -> bool) -> Result<&Building> {
        let mut best: Option<(&Building, f64)> = None;
        for b in self.buildings() {
            let total = b.total_consumption();
            match best {
                Some((_, best_total)) if !is_better(total, best_total) => {}
                _ => best = Some((b, total)),
            }
        }
        best.map(|(b, _)| b)
            .ok_or_else(|| EnergyError::EmptyData("campus (no buildings)".to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
