use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{Field, RowError};
use crate::models::CampusTimestamp;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

/// Resolve a settings value to a concrete timezone.
///
/// `"auto"` maps to the system timezone; unknown names fall back to UTC with
/// a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    let name = if tz_name == "auto" {
        get_system_timezone()
    } else {
        tz_name.to_string()
    };
    name.parse::<Tz>().unwrap_or_else(|_| {
        warn!("unrecognised timezone \"{}\", falling back to UTC", name);
        Tz::UTC
    })
}

// ── TimestampParser ───────────────────────────────────────────────────────────

/// Offset-aware layouts tried after RFC 3339.
const OFFSET_FMTS: &[&str] = &["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Naive layouts; values are taken as campus-local wall-clock time.
const NAIVE_FMTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses meter timestamps into [`CampusTimestamp`] values.
///
/// Readings are bucketed by local calendar date and hour of day, so any
/// timestamp carrying an explicit offset is converted into the campus
/// timezone for its wall-clock part while keeping its exact instant.
/// Timestamps without an offset are assumed to already be local; their
/// instant is resolved in the campus timezone (the earlier one when a DST
/// fall-back makes the wall-clock time ambiguous).
#[derive(Debug, Clone, Copy)]
pub struct TimestampParser {
    campus_tz: Tz,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl TimestampParser {
    pub fn new(campus_tz: Tz) -> Self {
        Self { campus_tz }
    }

    /// Build a parser from a settings string (IANA name or `"auto"`).
    pub fn from_name(tz_name: &str) -> Self {
        Self::new(resolve_timezone(tz_name))
    }

    pub fn campus_tz(&self) -> Tz {
        self.campus_tz
    }

    /// Parse `raw` (already trimmed) into a campus timestamp.
    pub fn parse(&self, raw: &str) -> Result<CampusTimestamp, RowError> {
        // Trailing 'Z' is accepted by the RFC 3339 parser directly.
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(self.from_instant(dt.with_timezone(&Utc)));
        }
        for fmt in OFFSET_FMTS {
            if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
                return Ok(self.from_instant(dt.with_timezone(&Utc)));
            }
        }
        for fmt in NAIVE_FMTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Ok(self.from_local(naive));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(self.from_local(date.and_time(chrono::NaiveTime::MIN)));
        }

        Err(RowError::Parse {
            field: Field::Timestamp,
            value: raw.to_string(),
            reason: "unrecognised timestamp format".to_string(),
        })
    }

    fn from_instant(&self, instant: DateTime<Utc>) -> CampusTimestamp {
        CampusTimestamp {
            local: instant.with_timezone(&self.campus_tz).naive_local(),
            instant,
        }
    }

    fn from_local(&self, local: NaiveDateTime) -> CampusTimestamp {
        let instant = match self.campus_tz.from_local_datetime(&local).earliest() {
            Some(dt) => dt.with_timezone(&Utc),
            // Skipped by a spring-forward jump: use the zone's offset at the
            // same reading taken as UTC.
            None => {
                let offset = self.campus_tz.offset_from_utc_datetime(&local).fix();
                (local - Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
            }
        };
        CampusTimestamp { local, instant }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("Europe/London"));
        assert!(validate_timezone("UTC"));
        assert!(!validate_timezone("Mars/Olympus"));
    }

    #[test]
    fn test_resolve_timezone_unknown_falls_back_to_utc() {
        assert_eq!(resolve_timezone("Not/AZone"), Tz::UTC);
        assert_eq!(resolve_timezone("Asia/Kolkata"), Tz::Asia__Kolkata);
    }

    #[test]
    fn test_parse_naive_space_separated() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("2024-01-15 08:00:00").unwrap().local, local(2024, 1, 15, 8, 0));
    }

    #[test]
    fn test_parse_naive_iso_with_fraction() {
        let p = TimestampParser::default();
        assert_eq!(
            p.parse("2024-01-15T08:30:00.250").unwrap().local.date(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_minute_resolution() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("2024-01-15 08:45").unwrap().local, local(2024, 1, 15, 8, 45));
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("2024-02-29").unwrap().local, local(2024, 2, 29, 0, 0));
    }

    #[test]
    fn test_parse_z_suffix_in_utc_campus() {
        let p = TimestampParser::default();
        assert_eq!(p.parse("2024-01-15T23:00:00Z").unwrap().local, local(2024, 1, 15, 23, 0));
    }

    #[test]
    fn test_parse_offset_converted_to_campus_zone() {
        // 23:00 UTC is 04:30 the next day in Kolkata (+05:30).
        let p = TimestampParser::new(Tz::Asia__Kolkata);
        assert_eq!(p.parse("2024-01-15T23:00:00Z").unwrap().local, local(2024, 1, 16, 4, 30));
    }

    #[test]
    fn test_parse_space_separated_offset() {
        let p = TimestampParser::default();
        assert_eq!(
            p.parse("2024-01-15 10:00:00+02:00").unwrap().local,
            local(2024, 1, 15, 8, 0)
        );
    }

    #[test]
    fn test_parse_naive_ignores_campus_zone() {
        let p = TimestampParser::new(Tz::America__New_York);
        assert_eq!(p.parse("2024-07-01 12:00:00").unwrap().local, local(2024, 7, 1, 12, 0));
    }

    #[test]
    fn test_parse_fall_back_keeps_distinct_instants() {
        // 05:30Z and 06:30Z are both 01:30 on the New York wall clock.
        let p = TimestampParser::new(Tz::America__New_York);
        let first = p.parse("2024-11-03T05:30:00Z").unwrap();
        let second = p.parse("2024-11-03T06:30:00Z").unwrap();
        assert_eq!(first.local, local(2024, 11, 3, 1, 30));
        assert_eq!(second.local, local(2024, 11, 3, 1, 30));
        assert_eq!(second.instant - first.instant, Duration::hours(1));
    }

    #[test]
    fn test_parse_naive_ambiguous_takes_earlier_instant() {
        let p = TimestampParser::new(Tz::America__New_York);
        let parsed = p.parse("2024-11-03 01:30:00").unwrap();
        assert_eq!(parsed.instant, local(2024, 11, 3, 5, 30).and_utc());
    }

    #[test]
    fn test_parse_naive_in_spring_gap() {
        // 02:30 does not exist on 2024-03-10 in New York; EST (-05:00) applies.
        let p = TimestampParser::new(Tz::America__New_York);
        let parsed = p.parse("2024-03-10 02:30:00").unwrap();
        assert_eq!(parsed.local, local(2024, 3, 10, 2, 30));
        assert_eq!(parsed.instant, local(2024, 3, 10, 7, 30).and_utc());
    }

    #[test]
    fn test_parse_naive_instant_in_campus_zone() {
        let p = TimestampParser::new(Tz::Asia__Kolkata);
        let parsed = p.parse("2024-01-16 04:30").unwrap();
        assert_eq!(parsed.instant, local(2024, 1, 15, 23, 0).and_utc());
    }

    #[test]
    fn test_parse_garbage_is_parse_error() {
        let p = TimestampParser::default();
        let err = p.parse("yesterday-ish").unwrap_err();
        assert!(matches!(
            err,
            RowError::Parse {
                field: Field::Timestamp,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_invalid_calendar_date() {
        let p = TimestampParser::default();
        assert!(p.parse("2023-02-30 10:00:00").is_err());
    }

    #[test]
    fn test_get_system_timezone_returns_nonempty_string() {
        assert!(!get_system_timezone().is_empty());
    }
}
