//! Batch runtime for the campus energy engine.
//!
//! Runs the ingestion pipeline (one worker per building), writes the export
//! files and renders the executive summary.

pub mod exporter;
pub mod pipeline;
pub mod summary;

pub use energy_core as core;
pub use energy_data as data;
pub use exporter::Exporter;
pub use pipeline::{Analysis, Pipeline};
