use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Row-level errors ──────────────────────────────────────────────────────────

/// One of the three columns every input row must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Building,
    Timestamp,
    Kwh,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Building => "building",
            Field::Timestamp => "timestamp",
            Field::Kwh => "kwh",
        };
        f.write_str(name)
    }
}

/// Why a single input row was rejected during ingestion.
///
/// These never abort a run: the row is skipped and recorded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// A field was present but its value could not be interpreted.
    #[error("Failed to parse {field} {value:?}: {reason}")]
    Parse {
        field: Field,
        value: String,
        reason: String,
    },

    /// A required field was absent or blank.
    #[error("Missing required field: {0}")]
    MissingField(Field),

    /// The building already holds a reading at this timestamp.
    #[error("Duplicate reading at {0}")]
    DuplicateTimestamp(NaiveDateTime),
}

/// Coarse classification of a [`RowError`], used for rejection breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Parse,
    MissingField,
    DuplicateTimestamp,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectionKind::Parse => "parse",
            RejectionKind::MissingField => "missing_field",
            RejectionKind::DuplicateTimestamp => "duplicate_timestamp",
        };
        f.write_str(name)
    }
}

impl RowError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            RowError::Parse { .. } => RejectionKind::Parse,
            RowError::MissingField(_) => RejectionKind::MissingField,
            RowError::DuplicateTimestamp(_) => RejectionKind::DuplicateTimestamp,
        }
    }
}

// ── Run-level errors ──────────────────────────────────────────────────────────

/// All errors surfaced to callers of the aggregation engine and its collaborators.
#[derive(Error, Debug)]
pub enum EnergyError {
    /// A requested aggregate has nothing to aggregate.
    #[error("No data available for {0}")]
    EmptyData(String),

    /// A trend window needs more distinct dates (or a non-zero baseline).
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// An unknown building name was requested.
    #[error("Building not found: {0}")]
    NotFound(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be produced or parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A meter file is readable but unusable as a whole (e.g. missing columns).
    #[error("Invalid meter file {path}: {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    /// No CSV meter files were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the energy crates.
pub type Result<T> = std::result::Result<T, EnergyError>;
