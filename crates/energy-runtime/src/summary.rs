//! Plain-text executive summary written to `summary.txt`.

use energy_core::formatting::{format_hour, format_hour_window, format_kwh, format_signed_percent};
use energy_data::rejection::RejectionLog;
use energy_data::report::Report;

const RULE_WIDTH: usize = 70;

/// Data-quality figures printed alongside the report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataQuality<'a> {
    pub rows_seen: usize,
    pub rejections: Option<&'a RejectionLog>,
    pub failed_files: usize,
}

/// Render the executive summary for `report`.
pub fn executive_summary(report: &Report, quality: &DataQuality<'_>) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines: Vec<String> = Vec::new();

    lines.push(heavy.clone());
    lines.push("CAMPUS ENERGY CONSUMPTION - EXECUTIVE SUMMARY".to_string());
    lines.push(heavy.clone());
    lines.push(String::new());
    lines.push(format!(
        "Report Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.push(String::new());
    lines.push("KEY FINDINGS:".to_string());
    lines.push(light.clone());
    lines.push(String::new());

    lines.push("1. TOTAL CAMPUS CONSUMPTION".to_string());
    lines.push(format!("   Total Energy Used: {}", format_kwh(report.campus_total)));
    lines.push(format!(
        "   Analysis Period: {} to {}",
        report.period.start.format("%Y-%m-%d"),
        report.period.end.format("%Y-%m-%d")
    ));
    lines.push(format!(
        "   Total Buildings Monitored: {}",
        report.buildings.len()
    ));
    lines.push(format!("   Readings Analysed: {}", report.reading_count));
    lines.push(String::new());

    lines.push("2. HIGHEST CONSUMING BUILDING".to_string());
    if let Some(top) = report.building(&report.highest_consumer) {
        lines.push(format!("   Building Name: {}", top.name));
        lines.push(format!("   Total Consumption: {}", format_kwh(top.total)));
        lines.push(format!("   Average Hourly: {}", format_kwh(top.average)));
        lines.push(format!(
            "   Peak Reading: {} at {}",
            format_kwh(top.peak.kwh),
            top.peak.timestamp.format("%Y-%m-%d %H:%M")
        ));
    }
    lines.push(String::new());

    lines.push("3. PEAK LOAD ANALYSIS".to_string());
    lines.push(format!(
        "   Campus Peak Hour: {}",
        format_hour_window(report.campus_peak_hour.hour)
    ));
    lines.push(String::new());
    lines.push("   Building-Specific Peak Hours:".to_string());
    for b in &report.buildings {
        lines.push(format!(
            "   - {}: {} ({} avg)",
            b.name,
            format_hour(b.peak_hour.hour),
            format_kwh(b.peak_hour.mean_kwh)
        ));
    }
    lines.push(String::new());

    let trend = &report.trend;
    lines.push("4. CONSUMPTION TRENDS".to_string());
    lines.push(format!(
        "   First {} Days Average: {}/day",
        trend.first_days,
        format_kwh(trend.first_avg)
    ));
    lines.push(format!(
        "   Last {} Days Average: {}/day",
        trend.last_days,
        format_kwh(trend.last_avg)
    ));
    lines.push(format!("   Trend: {}", format_signed_percent(trend.percent_change)));
    lines.push(String::new());

    lines.push("5. BUILDING PERFORMANCE SUMMARY".to_string());
    lines.push(light.clone());
    for b in &report.buildings {
        lines.push(String::new());
        lines.push(format!("   {}:", b.name));
        lines.push(format!("   - Total: {}", format_kwh(b.total)));
        lines.push(format!("   - Share of Campus: {:.1}%", b.percentage));
        lines.push(format!("   - Average: {}/hour", format_kwh(b.average)));
        lines.push(format!(
            "   - Range: {} - {}",
            format_kwh(b.min_kwh),
            format_kwh(b.peak.kwh)
        ));
    }
    lines.push(String::new());

    lines.push("6. DATA QUALITY".to_string());
    lines.push(light.clone());
    lines.push(format!("   Rows Read: {}", quality.rows_seen));
    let rejected = quality.rejections.map_or(0, RejectionLog::len);
    lines.push(format!("   Rows Rejected: {}", rejected));
    if let Some(log) = quality.rejections {
        for (kind, count) in log.breakdown() {
            lines.push(format!("   - {}: {}", kind, count));
        }
    }
    if quality.failed_files > 0 {
        lines.push(format!("   Files Skipped: {}", quality.failed_files));
    }
    lines.push(String::new());

    let direction = if trend.percent_change > 0.0 {
        "increasing"
    } else {
        "decreasing"
    };
    lines.push(heavy.clone());
    lines.push("RECOMMENDATIONS:".to_string());
    lines.push(light);
    lines.push(String::new());
    lines.push(format!(
        "1. Focus energy-saving initiatives on {}",
        report.highest_consumer
    ));
    lines.push(format!(
        "2. Implement load-shifting strategies during peak hour ({})",
        format_hour(report.campus_peak_hour.hour)
    ));
    lines.push(format!("3. Investigate {} consumption trend", direction));
    lines.push("4. Consider demand response programs during peak hours".to_string());
    lines.push(String::new());
    lines.push(heavy);
    lines.push(String::new());

    lines.join("\n")
}
