//! Turning an ordered stream of [`RawRow`]s into a [`Campus`].
//!
//! Ingestion is split into three steps so the runtime can fan the middle one
//! out across workers:
//!
//! 1. [`partition_by_building`] numbers every row and groups it by building id
//!    (rows without an id are rejected here);
//! 2. [`ingest_building`] validates one group and builds its [`Building`];
//! 3. [`assemble_campus`] joins the per-building results.
//!
//! [`ingest_rows`] runs all three sequentially.

use std::collections::BTreeMap;

use energy_core::error::{Field, RowError};
use tracing::{debug, warn};

use crate::building::Building;
use crate::campus::Campus;
use crate::rejection::RejectionLog;
use crate::validator::{RawRow, ReadingValidator};

/// A raw row tagged with its position in the overall input.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedRow {
    pub seq: usize,
    pub row: RawRow,
}

/// Output of [`partition_by_building`].
#[derive(Debug, Default)]
pub struct Partitioned {
    /// Rows keyed by trimmed building id, each group in input order.
    pub groups: BTreeMap<String, Vec<SequencedRow>>,
    /// Rows rejected before grouping.
    pub rejections: RejectionLog,
    pub rows_seen: usize,
}

/// One building's ingestion result.
#[derive(Debug)]
pub struct BuildingIngestion {
    pub name: String,
    /// `None` when none of the building's rows were valid.
    pub building: Option<Building>,
    pub rejections: RejectionLog,
}

/// The fully ingested dataset.
#[derive(Debug)]
pub struct Ingestion {
    pub campus: Campus,
    pub rejections: RejectionLog,
    pub rows_seen: usize,
}

impl Ingestion {
    pub fn accepted(&self) -> usize {
        self.campus.reading_count()
    }
}

pub fn partition_by_building(rows: impl IntoIterator<Item = RawRow>) -> Partitioned {
    let mut out = Partitioned::default();
    for (seq, row) in rows.into_iter().enumerate() {
        out.rows_seen += 1;
        let Some(id) = row.building_id().map(str::to_string) else {
            out.rejections
                .record(seq, &row, RowError::MissingField(Field::Building));
            continue;
        };
        out.groups
            .entry(id)
            .or_default()
            .push(SequencedRow { seq, row });
    }
    debug!(
        rows = out.rows_seen,
        buildings = out.groups.len(),
        rejected = out.rejections.len(),
        "partitioned input rows"
    );
    out
}

/// Validate one building's rows in input order.
///
/// The first reading at a timestamp is kept; later ones are rejected as
/// duplicates.
pub fn ingest_building(
    name: &str,
    rows: &[SequencedRow],
    validator: &ReadingValidator,
) -> BuildingIngestion {
    let mut building = Building::new(name);
    let mut rejections = RejectionLog::new();

    for SequencedRow { seq, row } in rows {
        let result = validator
            .validate_row(row)
            .and_then(|valid| building.add_reading(valid.reading));
        if let Err(reason) = result {
            rejections.record(*seq, row, reason);
        }
    }

    debug!(
        building = name,
        accepted = building.len(),
        rejected = rejections.len(),
        "ingested building"
    );

    BuildingIngestion {
        name: name.to_string(),
        building: (!building.is_empty()).then_some(building),
        rejections,
    }
}

/// Join per-building results into a campus.  `rejections` holds the rows
/// already rejected during partitioning.
pub fn assemble_campus(
    parts: impl IntoIterator<Item = BuildingIngestion>,
    mut rejections: RejectionLog,
    rows_seen: usize,
) -> Ingestion {
    let mut campus = Campus::new();
    for part in parts {
        rejections.merge(part.rejections);
        match part.building {
            Some(building) => {
                // Names are unique after partitioning; nothing is ever replaced.
                if let Err(e) = campus.add_building(building) {
                    warn!(building = %part.name, "building not added: {}", e);
                }
            }
            None => warn!(building = %part.name, "building has no valid readings"),
        }
    }
    Ingestion {
        campus,
        rejections,
        rows_seen,
    }
}

/// Sequential ingestion of `rows`.
pub fn ingest_rows(rows: impl IntoIterator<Item = RawRow>, validator: &ReadingValidator) -> Ingestion {
    let Partitioned {
        groups,
        rejections,
        rows_seen,
    } = partition_by_building(rows);

    let parts: Vec<BuildingIngestion> = groups
        .iter()
        .map(|(name, group)| ingest_building(name, group, validator))
        .collect();

    assemble_campus(parts, rejections, rows_seen)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use energy_core::error::{EnergyError, RejectionKind};

    fn rows(data: &[(&str, &str, &str)]) -> Vec<RawRow> {
        data.iter()
            .enumerate()
            .map(|(i, (b, t, k))| RawRow::new(b, t, k).with_origin("test.csv", i + 2))
            .collect()
    }

    #[test]
    fn test_partition_rejects_missing_building() {
        let input = vec![
            RawRow::new("A", "2024-01-01 00:00", "1"),
            RawRow {
                building: None,
                ..RawRow::new("", "2024-01-01 01:00", "1")
            },
            RawRow::new("  ", "2024-01-01 02:00", "1"),
            RawRow::new(" A ", "2024-01-01 03:00", "1"),
        ];
        let parts = partition_by_building(input);
        assert_eq!(parts.rows_seen, 4);
        assert_eq!(parts.groups.len(), 1);
        assert_eq!(parts.groups["A"].len(), 2);
        assert_eq!(parts.groups["A"][1].seq, 3);
        let seqs: Vec<usize> = parts.rejections.rows().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_fall_back_readings_are_both_accepted() {
        use energy_core::time_utils::TimestampParser;

        let validator = ReadingValidator::new(TimestampParser::from_name("America/New_York"));
        let input = rows(&[
            ("A", "2024-11-03T05:30:00Z", "1"),
            ("A", "2024-11-03T06:30:00Z", "2"),
            ("A", "2024-11-03T06:30:00Z", "3"),
        ]);
        let ingestion = ingest_rows(input, &validator);

        assert_eq!(ingestion.accepted(), 2);
        assert_eq!(ingestion.rejections.len(), 1);
        assert_eq!(ingestion.rejections.rows()[0].seq, 2);
        assert!((ingestion.campus.campus_total() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_timestamp_keeps_first() {
        let input = rows(&[
            ("A", "2024-01-01 08:00", "10"),
            ("A", "2024-01-01 08:00", "99"),
            ("A", "2024-01-01 09:00", "5"),
        ]);
        let out = ingest_rows(input, &ReadingValidator::default());

        let a = out.campus.get_building("A").unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.readings()[0].kwh(), 10.0);
        assert_eq!(out.rejections.len(), 1);
        assert_eq!(
            out.rejections.rows()[0].reason.kind(),
            RejectionKind::DuplicateTimestamp
        );
        assert_eq!(out.rejections.rows()[0].line, 3);
    }

    #[test]
    fn test_zero_kwh_building_with_one_malformed_row() {
        let input = rows(&[
            ("Zero", "2024-01-01 00:00", "0"),
            ("Zero", "2024-01-01 01:00", "0"),
            ("Zero", "not a time", "0"),
            ("Zero", "2024-01-01 02:00", "0"),
        ]);
        let out = ingest_rows(input, &ReadingValidator::default());

        let zero = out.campus.get_building("Zero").unwrap();
        assert_eq!(zero.len(), 3);
        assert_eq!(zero.total_consumption(), 0.0);
        assert_eq!(zero.average_consumption().unwrap(), 0.0);
        assert_eq!(out.rejections.len(), 1);
        assert_eq!(
            out.rejections.breakdown().get(&RejectionKind::Parse),
            Some(&1)
        );
        assert!(matches!(
            out.campus.building_percentages(),
            Err(EnergyError::EmptyData(_))
        ));
        assert_eq!(out.accepted(), 3);
        assert_eq!(out.rows_seen, 4);
    }

    #[test]
    fn test_building_with_only_invalid_rows_is_absent() {
        let input = rows(&[
            ("Good", "2024-01-01 00:00", "1"),
            ("Bad", "2024-01-01 00:00", "oops"),
            ("Bad", "", "1"),
        ]);
        let out = ingest_rows(input, &ReadingValidator::default());
        assert_eq!(out.campus.len(), 1);
        assert!(out.campus.get_building("Bad").is_err());
        assert_eq!(out.rejections.len(), 2);
    }

    #[test]
    fn test_rejections_ordered_by_input_sequence() {
        let input = rows(&[
            ("B", "bad", "1"),
            ("A", "bad", "1"),
            ("B", "2024-01-01 00:00", "x"),
            ("A", "2024-01-01 00:00", "-1"),
        ]);
        let out = ingest_rows(input, &ReadingValidator::default());
        let seqs: Vec<usize> = out.rejections.rows().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert!(out.campus.is_empty());
    }

    #[test]
    fn test_ingestion_order_does_not_change_campus() {
        let forward = rows(&[
            ("A", "2024-01-01 00:00", "1"),
            ("B", "2024-01-01 00:00", "2"),
            ("A", "2024-01-01 01:00", "3"),
        ]);
        let mut reversed = forward.clone();
        reversed.reverse();

        let v = ReadingValidator::default();
        let a = ingest_rows(forward, &v);
        let b = ingest_rows(reversed, &v);
        assert_eq!(a.campus, b.campus);
    }
}
