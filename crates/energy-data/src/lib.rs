//! Aggregation engine for campus energy data.
//!
//! Validates raw meter rows, builds per-building and campus-wide aggregates,
//! assembles the structured report and derives the dashboard chart series.
//! The [`reader`] module loads rows from CSV meter files.

pub mod building;
pub mod campus;
pub mod ingest;
pub mod reader;
pub mod rejection;
pub mod report;
pub mod series;
pub mod validator;

pub use building::Building;
pub use campus::Campus;
pub use energy_core as core;
pub use ingest::{ingest_rows, Ingestion};
pub use rejection::{RejectedRow, RejectionLog};
pub use report::{assemble, building_summaries, BuildingSummary, Report, ReportOptions};
pub use series::DashboardSeries;
pub use validator::{RawRow, ReadingValidator};
