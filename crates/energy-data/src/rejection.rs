//! Collection of rows skipped during ingestion.

use std::collections::BTreeMap;

use energy_core::error::{RejectionKind, RowError};
use tracing::warn;

use crate::validator::RawRow;

/// One skipped input row and why it was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// Position of the row in the overall input sequence.
    pub seq: usize,
    pub source: String,
    pub line: usize,
    pub building: Option<String>,
    pub reason: RowError,
}

/// Rejection sink shared by every ingestion path.
#[derive(Debug, Clone, Default)]
pub struct RejectionLog {
    rows: Vec<RejectedRow>,
}

impl RejectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `row` (sequence number `seq`) as rejected for `reason`.
    pub fn record(&mut self, seq: usize, row: &RawRow, reason: RowError) {
        warn!(
            source = %row.source,
            line = row.line,
            building = row.building_id().unwrap_or("-"),
            "rejected row: {}",
            reason
        );
        self.rows.push(RejectedRow {
            seq,
            source: row.source.clone(),
            line: row.line,
            building: row.building_id().map(str::to_string),
            reason,
        });
    }

    /// Absorb another log, keeping rows ordered by input sequence.
    pub fn merge(&mut self, other: RejectionLog) {
        self.rows.extend(other.rows);
        self.rows.sort_by_key(|r| r.seq);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RejectedRow] {
        &self.rows
    }

    /// Rejection counts per [`RejectionKind`].  Kinds with no rejections are absent.
    pub fn breakdown(&self) -> BTreeMap<RejectionKind, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}
