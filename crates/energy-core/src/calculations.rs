use crate::models::{HourlyMean, HourlyPeak, MeterReading, PeakRecord};

// ── HourlyAccumulator ─────────────────────────────────────────────────────────

/// Running per-hour-of-day sums used for hourly profiles and peak hours.
///
/// Readings from any number of dates (and buildings) can be pooled; each hour
/// bucket keeps its own sum and count so that means are taken only over the
/// readings that actually exist.
#[derive(Debug, Clone, Default)]
pub struct HourlyAccumulator {
    sums: [f64; 24],
    counts: [usize; 24],
}

impl HourlyAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reading to its hour bucket.
    pub fn add(&mut self, reading: &MeterReading) {
        let hour = reading.hour() as usize;
        self.sums[hour] += reading.kwh();
        self.counts[hour] += 1;
    }

    /// Add every reading yielded by `readings`.
    pub fn extend<'a>(&mut self, readings: impl IntoIterator<Item = &'a MeterReading>) {
        for reading in readings {
            self.add(reading);
        }
    }

    /// Total number of readings accumulated.
    pub fn len(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mean consumption per hour, ascending by hour.  Hours with no readings
    /// are omitted rather than reported as zero.
    pub fn profile(&self) -> Vec<HourlyMean> {
        (0..24)
            .filter(|&h| self.counts[h] > 0)
            .map(|h| HourlyMean {
                hour: h as u32,
                mean_kwh: self.sums[h] / self.counts[h] as f64,
                readings: self.counts[h],
            })
            .collect()
    }

    /// Hour with the highest mean consumption; the lowest hour wins a tie.
    ///
    /// Returns `None` when nothing has been accumulated.
    pub fn peak(&self) -> Option<HourlyPeak> {
        let mut best: Option<HourlyPeak> = None;
        for point in self.profile() {
            match best {
                Some(b) if point.mean_kwh <= b.mean_kwh => {}
                _ => {
                    best = Some(HourlyPeak {
                        hour: point.hour,
                        mean_kwh: point.mean_kwh,
                    })
                }
            }
        }
        best
    }
}

// ── Reading selection ─────────────────────────────────────────────────────────

/// Pick the reading with the highest kWh; on equal kWh the earliest
/// timestamp wins regardless of iteration order.
pub fn select_peak<'a>(readings: impl IntoIterator<Item = &'a MeterReading>) -> Option<PeakRecord> {
    let mut best: Option<&MeterReading> = None;
    for reading in readings {
        best = match best {
            Some(b)
                if reading.kwh() < b.kwh()
                    || (reading.kwh() == b.kwh() && reading.key() >= b.key()) =>
            {
                Some(b)
            }
            _ => Some(reading),
        };
    }
    best.map(PeakRecord::from)
}

/// Pick the reading with the lowest kWh; on equal kWh the earliest
/// timestamp wins.
pub fn select_minimum<'a>(
    readings: impl IntoIterator<Item = &'a MeterReading>,
) -> Option<PeakRecord> {
    let mut best: Option<&MeterReading> = None;
    for reading in readings {
        best = match best {
            Some(b)
                if reading.kwh() > b.kwh()
                    || (reading.kwh() == b.kwh() && reading.key() >= b.key()) =>
            {
                Some(b)
            }
            _ => Some(reading),
        };
    }
    best.map(PeakRecord::from)
}

// ── Scalar helpers ────────────────────────────────────────────────────────────

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Relative change from `first` to `last` in percent.
///
/// The caller must ensure `first != 0`.
pub fn percent_change(first: f64, last: f64) -> f64 {
    (last - first) / first * 100.0
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn reading(day: u32, hour: u32, kwh: f64) -> MeterReading {
        MeterReading::new(ts(day, hour), kwh).unwrap()
    }

    // ── HourlyAccumulator ─────────────────────────────────────────────────────

    #[test]
    fn test_hourly_profile_means_per_hour() {
        let readings = vec![
            reading(1, 8, 10.0),
            reading(2, 8, 20.0),
            reading(1, 9, 5.0),
        ];
        let mut acc = HourlyAccumulator::new();
        acc.extend(&readings);

        let profile = acc.profile();
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].hour, 8);
        assert!((profile[0].mean_kwh - 15.0).abs() < 1e-9);
        assert_eq!(profile[0].readings, 2);
        assert_eq!(profile[1].hour, 9);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_hourly_profile_omits_empty_hours() {
        let mut acc = HourlyAccumulator::new();
        acc.add(&reading(1, 23, 1.0));
        let hours: Vec<u32> = acc.profile().iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![23]);
    }

    #[test]
    fn test_hourly_peak_lowest_hour_wins_tie() {
        let mut acc = HourlyAccumulator::new();
        acc.extend(&[reading(1, 14, 30.0), reading(1, 7, 30.0), reading(1, 9, 10.0)]);
        let peak = acc.peak().unwrap();
        assert_eq!(peak.hour, 7);
        assert!((peak.mean_kwh - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_hourly_peak_empty() {
        let acc = HourlyAccumulator::new();
        assert!(acc.is_empty());
        assert!(acc.peak().is_none());
        assert!(acc.profile().is_empty());
    }

    // ── select_peak / select_minimum ──────────────────────────────────────────

    #[test]
    fn test_select_peak_earliest_on_tie_any_order() {
        let readings = vec![reading(3, 10, 50.0), reading(1, 10, 50.0), reading(2, 10, 20.0)];
        let peak = select_peak(&readings).unwrap();
        assert_eq!(peak.kwh, 50.0);
        assert_eq!(peak.timestamp, ts(1, 10));
    }

    #[test]
    fn test_select_minimum_earliest_on_tie() {
        let readings = vec![reading(1, 10, 3.0), reading(1, 5, 1.0), reading(1, 2, 1.0)];
        let min = select_minimum(&readings).unwrap();
        assert_eq!(min.kwh, 1.0);
        assert_eq!(min.timestamp, ts(1, 2));
    }

    #[test]
    fn test_select_peak_empty() {
        let readings: Vec<MeterReading> = vec![];
        assert!(select_peak(&readings).is_none());
        assert!(select_minimum(&readings).is_none());
    }

    // ── Scalars ───────────────────────────────────────────────────────────────

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert!((mean(&[1.0, 2.0, 6.0]).unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(100.0, 110.0) - 10.0).abs() < 1e-9);
        assert!((percent_change(200.0, 150.0) + 25.0).abs() < 1e-9);
    }
}
