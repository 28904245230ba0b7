//! Structured hand-off value consumed by the exporters, the summary writer and
//! the terminal UI.

use chrono::{DateTime, Utc};
use energy_core::error::{EnergyError, Result};
use energy_core::models::{AnalysisPeriod, HourlyPeak, PeakRecord, Trend};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::campus::Campus;

/// Default trend window: first week against last week.
pub const DEFAULT_TREND_DAYS: usize = 7;

// ── Options ───────────────────────────────────────────────────────────────────

/// Inputs to [`assemble`] that do not come from the campus itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    /// Days in each of the two trend windows.
    pub trend_days: usize,
    /// Stamped into the report verbatim.
    pub generated_at: DateTime<Utc>,
}

impl ReportOptions {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            trend_days: DEFAULT_TREND_DAYS,
            generated_at,
        }
    }

    pub fn with_trend_days(mut self, days: usize) -> Self {
        self.trend_days = days;
        self
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Per-building row of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSummary {
    pub name: String,
    pub total: f64,
    pub average: f64,
    /// Share of the campus total, in percent.
    pub percentage: f64,
    pub readings: usize,
    pub min_kwh: f64,
    pub peak: PeakRecord,
    pub peak_hour: HourlyPeak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub campus_total: f64,
    pub generated_at: DateTime<Utc>,
    pub period: AnalysisPeriod,
    pub reading_count: usize,
    /// Ordered by building name.
    pub buildings: Vec<BuildingSummary>,
    pub highest_consumer: String,
    pub lowest_consumer: String,
    pub campus_peak_hour: HourlyPeak,
    pub trend: Trend,
}

impl Report {
    pub fn building(&self, name: &str) -> Option<&BuildingSummary> {
        self.buildings.iter().find(|b| b.name == name)
    }
}

/// Per-building rows of the report, ordered by name.
///
/// Needs no trend window, so it succeeds for any campus with a non-zero total.
pub fn building_summaries(campus: &Campus) -> Result<Vec<BuildingSummary>> {
    let percentages = campus.building_percentages()?;

    let mut buildings = Vec::with_capacity(campus.len());
    for b in campus.buildings() {
        let percentage = percentages
            .get(b.name())
            .copied()
            .ok_or_else(|| EnergyError::NotFound(b.name().to_string()))?;
        buildings.push(BuildingSummary {
            name: b.name().to_string(),
            total: b.total_consumption(),
            average: b.average_consumption()?,
            percentage,
            readings: b.len(),
            min_kwh: b.minimum_consumption()?.kwh,
            peak: b.peak_consumption()?,
            peak_hour: b.peak_hour_of_day()?,
        });
    }
    Ok(buildings)
}

/// Build the report for `campus`.
///
/// Pure: the same campus and options always give the same report.  Any
/// aggregate failure (empty campus, zero total, too few dates for the trend)
/// is returned as-is.
pub fn assemble(campus: &Campus, options: &ReportOptions) -> Result<Report> {
    let buildings = building_summaries(campus)?;

    let period = campus
        .period()
        .ok_or_else(|| EnergyError::EmptyData("campus".to_string()))?;

    let report = Report {
        campus_total: campus.campus_total(),
        generated_at: options.generated_at,
        period,
        reading_count: campus.reading_count(),
        buildings,
        highest_consumer: campus.highest_consumer()?.name().to_string(),
        lowest_consumer: campus.lowest_consumer()?.name().to_string(),
        campus_peak_hour: campus.campus_peak_hour()?,
        trend: campus.trend(options.trend_days, options.trend_days)?,
    };

    debug!(
        buildings = report.buildings.len(),
        readings = report.reading_count,
        "assembled report"
    );
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_rows;
    use crate::validator::{RawRow, ReadingValidator};
    use chrono::TimeZone;

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap()
    }

    /// A: 35 kWh, B: 65 kWh over two days.
    fn scenario_rows() -> Vec<RawRow> {
        vec![
            RawRow::new("A", "2024-01-01 08:00", "10"),
            RawRow::new("A", "2024-01-01 09:00", "20"),
            RawRow::new("A", "2024-01-02 08:00", "5"),
            RawRow::new("B", "2024-01-01 08:00", "40"),
            RawRow::new("B", "2024-01-02 09:00", "25"),
        ]
    }

    fn campus(rows: Vec<RawRow>) -> Campus {
        ingest_rows(rows, &ReadingValidator::default()).campus
    }

    fn options() -> ReportOptions {
        ReportOptions::new(generated_at()).with_trend_days(1)
    }

    #[test]
    fn test_assemble_scenario() {
        let report = assemble(&campus(scenario_rows()), &options()).unwrap();

        assert!((report.campus_total - 100.0).abs() < 1e-9);
        assert_eq!(report.reading_count, 5);
        assert_eq!(report.highest_consumer, "B");
        assert_eq!(report.lowest_consumer, "A");
        let names: Vec<&str> = report.buildings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);

        let a = report.building("A").unwrap();
        assert!((a.total - 35.0).abs() < 1e-9);
        assert!((a.average - 35.0 / 3.0).abs() < 1e-9);
        assert!((a.percentage - 35.0).abs() < 1e-9);
        assert_eq!(a.peak.kwh, 20.0);
        assert_eq!(a.min_kwh, 5.0);
        assert_eq!(a.peak_hour.hour, 9);

        // Day 1: 70, day 2: 30.
        assert!((report.trend.first_avg - 70.0).abs() < 1e-9);
        assert!((report.trend.last_avg - 30.0).abs() < 1e-9);
        assert_eq!(report.generated_at, generated_at());
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let first = assemble(&campus(scenario_rows()), &options()).unwrap();
        let second = assemble(&campus(scenario_rows()), &options()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_assemble_propagates_insufficient_data() {
        let opts = ReportOptions::new(generated_at());
        assert_eq!(opts.trend_days, DEFAULT_TREND_DAYS);
        let err = assemble(&campus(scenario_rows()), &opts).unwrap_err();
        assert!(matches!(err, EnergyError::InsufficientData(_)));
    }

    #[test]
    fn test_building_summaries_need_no_trend_window() {
        let campus = campus(scenario_rows());
        let full = assemble(&campus, &options()).unwrap();
        let rows = building_summaries(&campus).unwrap();
        assert_eq!(rows, full.buildings);

        // Still available when the default trend cannot be computed.
        assert!(assemble(&campus, &ReportOptions::new(generated_at())).is_err());
        assert_eq!(building_summaries(&campus).unwrap().len(), 2);
    }

    #[test]
    fn test_assemble_empty_campus() {
        let err = assemble(&Campus::new(), &options()).unwrap_err();
        assert!(matches!(err, EnergyError::EmptyData(_)));
    }

    #[test]
    fn test_assemble_zero_total_campus() {
        let rows = vec![
            RawRow::new("Zero", "2024-01-01 00:00", "0"),
            RawRow::new("Zero", "2024-01-02 00:00", "0"),
        ];
        let err = assemble(&campus(rows), &options()).unwrap_err();
        assert!(matches!(err, EnergyError::EmptyData(_)));
    }

    #[test]
    fn test_report_serializes_expected_shape() {
        let report = assemble(&campus(scenario_rows()), &options()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generated_at"], "2024-02-01T12:00:00Z");
        assert_eq!(json["buildings"][1]["name"], "B");
        assert_eq!(json["buildings"][0]["peak"]["timestamp"], "2024-01-01T09:00:00");
        assert_eq!(json["campus_peak_hour"]["hour"], 9);
        assert!(json["trend"]["percent_change"].is_number());
    }
}
