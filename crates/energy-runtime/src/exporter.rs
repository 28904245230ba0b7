//! Writing run outputs to the output directory.
//!
//! Every file is written to a temporary sibling first and then renamed into
//! place, so a reader never sees a half-written export.

use std::fs;
use std::path::{Path, PathBuf};

use energy_core::error::{EnergyError, Result};
use energy_data::campus::Campus;
use energy_data::rejection::RejectionLog;
use energy_data::report::{BuildingSummary, Report};
use energy_data::series::DashboardSeries;
use serde::Serialize;
use tracing::info;

pub const CLEANED_DATA_FILE: &str = "cleaned_energy_data.csv";
pub const BUILDING_SUMMARY_FILE: &str = "building_summary.csv";
pub const REJECTED_ROWS_FILE: &str = "rejected_rows.csv";
pub const REPORT_FILE: &str = "report.json";
pub const DASHBOARD_FILE: &str = "dashboard.json";
pub const SUMMARY_FILE: &str = "summary.txt";

const CLEANED_DATA_HEADER: [&str; 3] = ["timestamp", "building", "kwh"];
const BUILDING_SUMMARY_HEADER: [&str; 10] = [
    "building",
    "total_kwh",
    "mean_kwh",
    "max_kwh",
    "min_kwh",
    "readings",
    "percentage",
    "peak_timestamp",
    "peak_hour",
    "peak_hour_mean_kwh",
];
const REJECTED_ROWS_HEADER: [&str; 6] = ["seq", "source", "line", "building", "kind", "reason"];

// ── CSV row shapes ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct BuildingSummaryRow<'a> {
    building: &'a str,
    total_kwh: f64,
    mean_kwh: f64,
    max_kwh: f64,
    min_kwh: f64,
    readings: usize,
    percentage: f64,
    peak_timestamp: String,
    peak_hour: u32,
    peak_hour_mean_kwh: f64,
}

#[derive(Debug, Serialize)]
struct RejectedRowRecord<'a> {
    seq: usize,
    source: &'a str,
    line: usize,
    building: &'a str,
    kind: String,
    reason: String,
}

// ── Exporter ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `timestamp,building,kwh` for every accepted reading.
    pub fn write_cleaned_data(&self, campus: &Campus) -> Result<PathBuf> {
        self.write_csv(
            CLEANED_DATA_FILE,
            &CLEANED_DATA_HEADER,
            campus.flattened_readings().iter(),
        )
    }

    /// One row per building, in the order given.
    pub fn write_building_summary(&self, buildings: &[BuildingSummary]) -> Result<PathBuf> {
        let rows = buildings.iter().map(|b| BuildingSummaryRow {
            building: &b.name,
            total_kwh: b.total,
            mean_kwh: b.average,
            max_kwh: b.peak.kwh,
            min_kwh: b.min_kwh,
            readings: b.readings,
            percentage: b.percentage,
            peak_timestamp: b.peak.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            peak_hour: b.peak_hour.hour,
            peak_hour_mean_kwh: b.peak_hour.mean_kwh,
        });
        self.write_csv(BUILDING_SUMMARY_FILE, &BUILDING_SUMMARY_HEADER, rows)
    }

    /// One line per rejected row, in input order.  A clean run still gets the
    /// header line.
    pub fn write_rejections(&self, log: &RejectionLog) -> Result<PathBuf> {
        let rows = log.rows().iter().map(|r| RejectedRowRecord {
            seq: r.seq,
            source: &r.source,
            line: r.line,
            building: r.building.as_deref().unwrap_or(""),
            kind: r.reason.kind().to_string(),
            reason: r.reason.to_string(),
        });
        self.write_csv(REJECTED_ROWS_FILE, &REJECTED_ROWS_HEADER, rows)
    }

    pub fn write_report(&self, report: &Report) -> Result<PathBuf> {
        self.write_json(REPORT_FILE, report)
    }

    pub fn write_dashboard(&self, series: &DashboardSeries) -> Result<PathBuf> {
        self.write_json(DASHBOARD_FILE, series)
    }

    pub fn write_summary(&self, text: &str) -> Result<PathBuf> {
        self.write_file(SUMMARY_FILE, text.as_bytes())
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn write_csv<T: Serialize>(
        &self,
        name: &str,
        header: &[&str],
        rows: impl IntoIterator<Item = T>,
    ) -> Result<PathBuf> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| EnergyError::Io(e.into_error()))?;
        self.write_file(name, &bytes)
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_file(name, json.as_bytes())
    }

    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(name);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        info!("wrote {}", path.display());
        Ok(path)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
