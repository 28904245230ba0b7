//! Core domain layer for Campus Energy.
//!
//! Holds the meter-reading models, the error taxonomy, the numeric helpers
//! shared by the aggregators, timestamp parsing, display formatting and the
//! command-line settings.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{EnergyError, Result, RowError};
