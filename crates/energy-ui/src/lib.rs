//! Terminal UI for the campus energy report.
//!
//! Renders the four-panel chart dashboard and the building summary table
//! with [`ratatui`], and runs the key-driven event loop.

pub mod app;
pub mod dashboard;
pub mod table_view;
pub mod themes;

pub use energy_core as core;
