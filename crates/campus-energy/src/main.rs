mod bootstrap;

use anyhow::{Context, Result};
use chrono::Utc;
use energy_core::settings::Settings;
use energy_core::time_utils::TimestampParser;
use energy_data::ingest::Ingestion;
use energy_data::reader::{self, LoadedRows};
use energy_data::report::{building_summaries, ReportOptions};
use energy_data::validator::ReadingValidator;
use energy_runtime::summary::{executive_summary, DataQuality};
use energy_runtime::{Analysis, Exporter, Pipeline};
use energy_ui::app::{App, ViewData, ViewMode};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Campus Energy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, Output: {}, View: {}, Timezone: {}",
        settings.data_dir.display(),
        settings.output_dir.display(),
        settings.view,
        settings.timezone
    );

    let mut loaded = reader::load_meter_rows(&settings.data_dir)
        .with_context(|| format!("reading meter files from {}", settings.data_dir.display()))?;
    for failed in &loaded.failed_files {
        tracing::warn!(path = %failed.path.display(), reason = %failed.reason, "skipped meter file");
    }

    let validator = ReadingValidator::new(TimestampParser::from_name(&settings.timezone));
    let pipeline = Pipeline::new(validator);
    let ingestion = pipeline.ingest(std::mem::take(&mut loaded.rows)).await?;

    bootstrap::ensure_output_dir(&settings.output_dir)?;
    let exporter = Exporter::new(settings.output_dir.clone());
    exporter.write_cleaned_data(&ingestion.campus)?;
    exporter.write_rejections(&ingestion.rejections)?;
    match building_summaries(&ingestion.campus) {
        Ok(buildings) => {
            exporter.write_building_summary(&buildings)?;
        }
        Err(e) => tracing::warn!(error = %e, "building summary skipped"),
    }

    let options = ReportOptions::new(Utc::now()).with_trend_days(settings.trend_days as usize);
    let analysis = match pipeline.analyze(&ingestion, &options) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::error!(error = %e, "report could not be assembled");
            if let Some(mode) = tui_mode(&settings.view) {
                App::new(&settings.theme, mode, ViewData::Unavailable(e.to_string()))
                    .run()
                    .await?;
            }
            return Err(e).context("assembling campus report");
        }
    };

    let summary = write_reports(&exporter, &ingestion, &analysis, &loaded)?;

    match settings.view.as_str() {
        "summary" => println!("{summary}"),
        "none" => {}
        view => {
            if let Some(mode) = tui_mode(view) {
                let data = ViewData::ready(analysis.report, analysis.series);
                App::new(&settings.theme, mode, data).run().await?;
            }
        }
    }

    tracing::info!("Reports written to {}", exporter.output_dir().display());
    Ok(())
}

/// Write every analysis artefact and return the executive summary text.
fn write_reports(
    exporter: &Exporter,
    ingestion: &Ingestion,
    analysis: &Analysis,
    loaded: &LoadedRows,
) -> Result<String> {
    exporter.write_report(&analysis.report)?;
    exporter.write_dashboard(&analysis.series)?;

    let quality = DataQuality {
        rows_seen: ingestion.rows_seen,
        rejections: Some(&ingestion.rejections),
        failed_files: loaded.failed_files.len(),
    };
    let summary = executive_summary(&analysis.report, &quality);
    exporter.write_summary(&summary)?;
    Ok(summary)
}

fn tui_mode(view: &str) -> Option<ViewMode> {
    match view {
        "dashboard" => Some(ViewMode::Dashboard),
        "table" => Some(ViewMode::Table),
        _ => None,
    }
}
