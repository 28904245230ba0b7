//! Batch pipeline: rows in, campus and report out.
//!
//! Ingestion fans out to one blocking worker per building, tracked by a
//! [`JoinSet`].  The campus is assembled only after every worker has joined,
//! so nothing reads it while it is still being written.

use energy_core::error::{EnergyError, Result};
use energy_data::ingest::{
    assemble_campus, ingest_building, ingest_rows, partition_by_building, BuildingIngestion,
    Ingestion, Partitioned,
};
use energy_data::report::{assemble, Report, ReportOptions};
use energy_data::series::DashboardSeries;
use energy_data::validator::{RawRow, ReadingValidator};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Report and chart series for one ingested dataset.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: Report,
    pub series: DashboardSeries,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    validator: ReadingValidator,
    parallel: bool,
}

impl Pipeline {
    pub fn new(validator: ReadingValidator) -> Self {
        Self {
            validator,
            parallel: true,
        }
    }

    /// Run ingestion on the calling task instead of fanning out.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate `rows` and build the campus.
    pub async fn ingest(&self, rows: Vec<RawRow>) -> Result<Ingestion> {
        let ingestion = if self.parallel {
            self.ingest_parallel(rows).await?
        } else {
            ingest_rows(rows, &self.validator)
        };

        info!(
            rows = ingestion.rows_seen,
            accepted = ingestion.accepted(),
            rejected = ingestion.rejections.len(),
            buildings = ingestion.campus.len(),
            "ingestion complete"
        );
        Ok(ingestion)
    }

    /// Assemble the report and dashboard series from an ingested campus.
    pub fn analyze(&self, ingestion: &Ingestion, options: &ReportOptions) -> Result<Analysis> {
        let report = assemble(&ingestion.campus, options)?;
        let series = DashboardSeries::from_campus(&ingestion.campus)?;
        Ok(Analysis { report, series })
    }

    /// [`ingest`](Self::ingest) followed by [`analyze`](Self::analyze).
    pub async fn run(
        &self,
        rows: Vec<RawRow>,
        options: &ReportOptions,
    ) -> Result<(Ingestion, Analysis)> {
        let ingestion = self.ingest(rows).await?;
        let analysis = self.analyze(&ingestion, options)?;
        Ok((ingestion, analysis))
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn ingest_parallel(&self, rows: Vec<RawRow>) -> Result<Ingestion> {
        let Partitioned {
            groups,
            rejections,
            rows_seen,
        } = partition_by_building(rows);

        let mut workers: JoinSet<BuildingIngestion> = JoinSet::new();
        for (name, group) in groups {
            let validator = self.validator;
            workers.spawn_blocking(move || ingest_building(&name, &group, &validator));
        }
        debug!(workers = workers.len(), "spawned ingestion workers");

        // Barrier: every building must finish before the campus exists.
        let mut parts = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            let part = joined.map_err(|e| {
                EnergyError::Other(anyhow::anyhow!("ingestion worker failed: {e}"))
            })?;
            parts.push(part);
        }

        Ok(assemble_campus(parts, rejections, rows_seen))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
