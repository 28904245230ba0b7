//! Numeric series behind the four dashboard charts.

use chrono::NaiveDate;
use energy_core::calculations::mean;
use energy_core::error::Result;
use serde::{Deserialize, Serialize};

use crate::campus::Campus;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub total_kwh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub hour: u32,
    pub mean_kwh: f64,
}

/// Daily consumption trend of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDaily {
    pub building: String,
    pub points: Vec<DailyPoint>,
}

/// Hour-of-day profile of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingHourly {
    pub building: String,
    pub points: Vec<HourlyPoint>,
}

/// A single labelled value (bar or pie slice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledValue {
    pub building: String,
    pub value: f64,
}

/// Everything the dashboard plots.  Every list is ordered by building name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSeries {
    pub daily: Vec<BuildingDaily>,
    /// Mean of each building's weekly mean reading.
    pub weekly_average: Vec<LabelledValue>,
    pub hourly: Vec<BuildingHourly>,
    /// Share of campus consumption, in percent.
    pub distribution: Vec<LabelledValue>,
}

impl DashboardSeries {
    /// Fails only when the distribution cannot be computed (campus total is zero).
    pub fn from_campus(campus: &Campus) -> Result<Self> {
        let percentages = campus.building_percentages()?;

        let mut series = DashboardSeries {
            daily: Vec::with_capacity(campus.len()),
            weekly_average: Vec::with_capacity(campus.len()),
            hourly: Vec::with_capacity(campus.len()),
            distribution: percentages
                .into_iter()
                .map(|(building, value)| LabelledValue { building, value })
                .collect(),
        };

        for b in campus.buildings() {
            let name = b.name().to_string();

            series.daily.push(BuildingDaily {
                building: name.clone(),
                points: b
                    .daily_totals()
                    .into_iter()
                    .map(|d| DailyPoint {
                        date: d.date,
                        total_kwh: d.total_kwh,
                    })
                    .collect(),
            });

            let weekly_means: Vec<f64> =
                b.weekly_aggregates().iter().map(|w| w.mean_kwh).collect();
            series.weekly_average.push(LabelledValue {
                building: name.clone(),
                value: mean(&weekly_means).unwrap_or_default(),
            });

            series.hourly.push(BuildingHourly {
                building: name,
                points: b
                    .hourly_profile()
                    .into_iter()
                    .map(|h| HourlyPoint {
                        hour: h.hour,
                        mean_kwh: h.mean_kwh,
                    })
                    .collect(),
            });
        }

        Ok(series)
    }

    /// Largest daily total across all buildings, `0.0` when there are none.
    pub fn max_daily(&self) -> f64 {
        self.daily
            .iter()
            .flat_map(|d| d.points.iter().map(|p| p.total_kwh))
            .fold(0.0, f64::max)
    }

    /// Largest hourly mean across all buildings, `0.0` when there are none.
    pub fn max_hourly(&self) -> f64 {
        self.hourly
            .iter()
            .flat_map(|h| h.points.iter().map(|p| p.mean_kwh))
            .fold(0.0, f64::max)
    }

    /// Earliest and latest date on the daily chart.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.daily.iter().flat_map(|d| d.points.iter().map(|p| p.date));
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}
