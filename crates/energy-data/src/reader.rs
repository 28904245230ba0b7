//! CSV meter-file discovery and loading.
//!
//! Each `*.csv` file in the data directory holds readings for one or more
//! buildings.  Files are turned into [`RawRow`]s without any interpretation of
//! the values; validation happens during ingestion.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use energy_core::error::{EnergyError, Result};
use tracing::{debug, info, warn};

use crate::validator::RawRow;

const TIMESTAMP_COLUMN: &str = "timestamp";
const KWH_COLUMN: &str = "kwh";
const BUILDING_COLUMN: &str = "building";

// ── Public types ──────────────────────────────────────────────────────────────

/// A file that was found but could not be used at all.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Rows read from a single meter file.
#[derive(Debug, Clone, Default)]
pub struct MeterFile {
    pub rows: Vec<RawRow>,
    /// Records the CSV decoder itself could not read.
    pub skipped_records: usize,
}

/// Everything read from a data directory.
#[derive(Debug, Clone, Default)]
pub struct LoadedRows {
    /// All rows, file by file in path order, each file in line order.
    pub rows: Vec<RawRow>,
    /// Files that contributed rows (possibly zero rows).
    pub files: Vec<PathBuf>,
    pub failed_files: Vec<FailedFile>,
    pub skipped_records: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find the `.csv` files directly inside `data_dir`, sorted by path.
pub fn find_csv_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(EnergyError::DataPathNotFound(data_dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}

/// Read one meter file.
///
/// The header must contain `timestamp` and `kwh` columns (case-insensitive),
/// otherwise the file is refused with [`EnergyError::InvalidSource`].  If the
/// file has a `building` column its non-blank cells name the building,
/// otherwise the file stem does.
pub fn read_meter_file(path: &Path) -> Result<MeterFile> {
    let file = File::open(path).map_err(|source| EnergyError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);
    let headers = rdr.headers()?.clone();

    let columns = Columns::locate(&headers).ok_or_else(|| EnergyError::InvalidSource {
        path: path.to_path_buf(),
        reason: format!("missing required columns '{TIMESTAMP_COLUMN}' and '{KWH_COLUMN}'"),
    })?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let stem = building_from_stem(path);

    let mut out = MeterFile::default();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(file = %source, "skipping unreadable record: {}", e);
                out.skipped_records += 1;
                continue;
            }
        };
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        out.rows.push(columns.row(&record, &stem, &source, line));
    }

    debug!(
        file = %source,
        rows = out.rows.len(),
        skipped = out.skipped_records,
        "read meter file"
    );
    Ok(out)
}

/// Read every meter file in `data_dir`.
///
/// A file that cannot be used is recorded in [`LoadedRows::failed_files`] and
/// the others are still read.  Fails with [`EnergyError::DataPathNotFound`] or
/// [`EnergyError::NoDataFiles`] when there is nothing to read.
pub fn load_meter_rows(data_dir: &Path) -> Result<LoadedRows> {
    let files = find_csv_files(data_dir)?;
    if files.is_empty() {
        return Err(EnergyError::NoDataFiles(data_dir.to_path_buf()));
    }

    let mut loaded = LoadedRows::default();
    for path in files {
        match read_meter_file(&path) {
            Ok(file) => {
                loaded.rows.extend(file.rows);
                loaded.skipped_records += file.skipped_records;
                loaded.files.push(path);
            }
            Err(e) => {
                warn!("Skipping meter file {}: {}", path.display(), e);
                loaded.failed_files.push(FailedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        files = loaded.files.len(),
        failed = loaded.failed_files.len(),
        rows = loaded.rows.len(),
        "loaded meter rows from {}",
        data_dir.display()
    );
    Ok(loaded)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Column indices resolved from a header record.
struct Columns {
    timestamp: usize,
    kwh: usize,
    building: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        Some(Self {
            timestamp: find(TIMESTAMP_COLUMN)?,
            kwh: find(KWH_COLUMN)?,
            building: find(BUILDING_COLUMN),
        })
    }

    fn row(&self, record: &StringRecord, stem: &str, source: &str, line: usize) -> RawRow {
        let cell = |idx: usize| record.get(idx).map(str::to_string);
        let building = self
            .building
            .and_then(|idx| record.get(idx))
            .filter(|b| !b.is_empty())
            .unwrap_or(stem);

        RawRow {
            source: source.to_string(),
            line,
            building: Some(building.to_string()),
            timestamp: cell(self.timestamp),
            kwh: cell(self.kwh),
        }
    }
}

fn building_from_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_find_csv_files_sorted_and_shallow() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Science.csv", "timestamp,kwh\n");
        write(&dir, "Admin.CSV", "timestamp,kwh\n");
        write(&dir, "notes.txt", "ignore me");
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/Deep.csv"), "timestamp,kwh\n").unwrap();

        let files = find_csv_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Admin.CSV", "Science.csv"]);
    }

    #[test]
    fn test_find_csv_files_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            find_csv_files(&missing),
            Err(EnergyError::DataPathNotFound(_))
        ));
    }

    #[test]
    fn test_read_meter_file_uses_stem_as_building() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "Library.csv",
            "timestamp,kwh\n2024-01-01 00:00:00,12.5\n2024-01-01 01:00:00, 7 \n",
        );
        let file = read_meter_file(&path).unwrap();
        assert_eq!(file.rows.len(), 2);

        let first = &file.rows[0];
        assert_eq!(first.building.as_deref(), Some("Library"));
        assert_eq!(first.timestamp.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(first.kwh.as_deref(), Some("12.5"));
        assert_eq!(first.source, "Library.csv");
        assert_eq!(first.line, 2);
        assert_eq!(file.rows[1].kwh.as_deref(), Some("7"));
    }

    #[test]
    fn test_read_meter_file_building_column() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "mixed.csv",
            "Timestamp,Building,kWh\n2024-01-01 00:00,Gym,1\n2024-01-01 00:00,,2\n",
        );
        let file = read_meter_file(&path).unwrap();
        assert_eq!(file.rows[0].building.as_deref(), Some("Gym"));
        // Blank building cell falls back to the file stem.
        assert_eq!(file.rows[1].building.as_deref(), Some("mixed"));
    }

    #[test]
    fn test_read_meter_file_short_row_has_missing_kwh() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Admin.csv", "timestamp,kwh\n2024-01-01 00:00\n");
        let file = read_meter_file(&path).unwrap();
        assert_eq!(file.rows.len(), 1);
        assert_eq!(file.rows[0].kwh, None);
    }

    #[test]
    fn test_read_meter_file_missing_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Bad.csv", "time,energy\n2024-01-01,1\n");
        assert!(matches!(
            read_meter_file(&path),
            Err(EnergyError::InvalidSource { .. })
        ));
    }

    #[test]
    fn test_load_meter_rows_records_failed_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "A.csv", "timestamp,kwh\n2024-01-01 00:00,1\n");
        write(&dir, "B.csv", "when,what\nx,y\n");
        write(&dir, "C.csv", "timestamp,kwh\n2024-01-01 00:00,3\n2024-01-01 01:00,4\n");

        let loaded = load_meter_rows(dir.path()).unwrap();
        assert_eq!(loaded.rows.len(), 3);
        assert_eq!(loaded.files.len(), 2);
        assert_eq!(loaded.failed_files.len(), 1);
        assert!(loaded.failed_files[0].path.ends_with("B.csv"));
        let buildings: Vec<&str> = loaded
            .rows
            .iter()
            .filter_map(|r| r.building.as_deref())
            .collect();
        assert_eq!(buildings, vec!["A", "C", "C"]);
    }

    #[test]
    fn test_load_meter_rows_no_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "readme.md", "nothing here");
        assert!(matches!(
            load_meter_rows(dir.path()),
            Err(EnergyError::NoDataFiles(_))
        ));
    }
}
