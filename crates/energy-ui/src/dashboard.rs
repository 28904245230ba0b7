//! Four-panel chart dashboard.
//!
//! ```text
//! ┌ header: campus total, period, peak hour, trend ─────────────┐
//! ├ daily consumption trend ──────┬ average weekly usage ───────┤
//! ├ hourly profile ───────────────┼ consumption distribution ───┤
//! └───────────────────────────────┴─────────────────────────────┘
//! ```

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use energy_core::formatting::{
    format_hour_window, format_kwh, format_number, format_percent, format_signed_percent,
};
use energy_data::report::Report;
use energy_data::series::DashboardSeries;

use crate::themes::Theme;

const HEADER_HEIGHT: u16 = 4;

/// Render the whole dashboard into `area`.
pub fn render_dashboard(
    frame: &mut Frame,
    area: Rect,
    report: &Report,
    series: &DashboardSeries,
    theme: &Theme,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(area);

    let top = halves(rows[1]);
    let bottom = halves(rows[2]);

    render_header(frame, rows[0], report, theme);
    render_daily_chart(frame, top[0], series, theme);
    render_weekly_bars(frame, top[1], series, theme);
    render_hourly_scatter(frame, bottom[0], series, theme);
    render_distribution(frame, bottom[1], series, theme);
}

fn halves(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
}

fn panel(title: &str, theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.separator)
        .title(Span::styled(format!(" {title} "), theme.header))
}

// ── Header ────────────────────────────────────────────────────────────────────

fn render_header(frame: &mut Frame, area: Rect, report: &Report, theme: &Theme) {
    let trend = &report.trend;
    let lines = vec![
        Line::from(vec![
            Span::styled("Campus total: ", theme.label),
            Span::styled(format_kwh(report.campus_total), theme.value),
            Span::styled("   Buildings: ", theme.label),
            Span::styled(report.buildings.len().to_string(), theme.value),
            Span::styled("   Period: ", theme.label),
            Span::styled(
                format!(
                    "{} to {}",
                    report.period.start.format("%Y-%m-%d"),
                    report.period.end.format("%Y-%m-%d")
                ),
                theme.value,
            ),
        ]),
        Line::from(vec![
            Span::styled("Peak hour: ", theme.label),
            Span::styled(format_hour_window(report.campus_peak_hour.hour), theme.value),
            Span::styled("   Highest: ", theme.label),
            Span::styled(report.highest_consumer.clone(), theme.value),
            Span::styled(format!("   Trend ({}d): ", trend.first_days), theme.label),
            Span::styled(
                format_signed_percent(trend.percent_change),
                theme.trend_style(trend.percent_change),
            ),
        ]),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(panel("Campus Energy Dashboard", theme)),
        area,
    );
}

// ── Daily consumption trend ───────────────────────────────────────────────────

/// Daily points as `(days since first date, kWh)`.
fn daily_points(series: &DashboardSeries, origin: NaiveDate) -> Vec<Vec<(f64, f64)>> {
    series
        .daily
        .iter()
        .map(|b| {
            b.points
                .iter()
                .map(|p| ((p.date - origin).num_days() as f64, p.total_kwh))
                .collect()
        })
        .collect()
}

fn render_daily_chart(frame: &mut Frame, area: Rect, series: &DashboardSeries, theme: &Theme) {
    let block = panel("Daily Consumption Trend", theme);
    let Some((first, last)) = series.date_range() else {
        frame.render_widget(block, area);
        return;
    };

    let points = daily_points(series, first);
    let datasets: Vec<Dataset> = series
        .daily
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (b, pts))| {
            Dataset::default()
                .name(b.building.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(theme.series_color(i)))
                .data(pts)
        })
        .collect();

    let span_days = ((last - first).num_days() as f64).max(1.0);
    let max_kwh = series.max_daily().max(1.0);
    let mid = first + chrono::Duration::days((span_days / 2.0) as i64);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([0.0, span_days])
                .labels([
                    first.format("%m-%d").to_string(),
                    mid.format("%m-%d").to_string(),
                    last.format("%m-%d").to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("kWh")
                .style(theme.axis)
                .bounds([0.0, max_kwh * 1.05])
                .labels(["0".to_string(), format_number(max_kwh, 0)]),
        );
    frame.render_widget(chart, area);
}

// ── Average weekly usage ──────────────────────────────────────────────────────

fn render_weekly_bars(frame: &mut Frame, area: Rect, series: &DashboardSeries, theme: &Theme) {
    let bars: Vec<Bar> = series
        .weekly_average
        .iter()
        .enumerate()
        .map(|(i, w)| {
            Bar::default()
                .value(w.value.round() as u64)
                .text_value(format_number(w.value, 1))
                .label(Line::from(w.building.clone()))
                .style(Style::default().fg(theme.series_color(i)))
        })
        .collect();

    let width = bar_width(area, bars.len());
    let chart = BarChart::default()
        .block(panel("Average Weekly Usage (kWh)", theme))
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(1)
        .value_style(theme.value)
        .label_style(theme.label);
    frame.render_widget(chart, area);
}

/// Widest bars that still fit `count` bars (plus gaps) inside `area`.
fn bar_width(area: Rect, count: usize) -> u16 {
    if count == 0 {
        return 1;
    }
    let inner = area.width.saturating_sub(2) as usize;
    let per_bar = inner / count;
    per_bar.saturating_sub(1).clamp(1, 12) as u16
}

// ── Hourly profile ────────────────────────────────────────────────────────────

fn render_hourly_scatter(frame: &mut Frame, area: Rect, series: &DashboardSeries, theme: &Theme) {
    let points: Vec<Vec<(f64, f64)>> = series
        .hourly
        .iter()
        .map(|b| {
            b.points
                .iter()
                .map(|p| (f64::from(p.hour), p.mean_kwh))
                .collect()
        })
        .collect();

    let datasets: Vec<Dataset> = series
        .hourly
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (b, pts))| {
            Dataset::default()
                .name(b.building.clone())
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(theme.series_color(i)))
                .data(pts)
        })
        .collect();

    let max_kwh = series.max_hourly().max(1.0);
    let chart = Chart::new(datasets)
        .block(panel("Hourly Consumption Profile", theme))
        .x_axis(
            Axis::default()
                .title("hour")
                .style(theme.axis)
                .bounds([0.0, 23.0])
                .labels(["0", "6", "12", "18", "23"]),
        )
        .y_axis(
            Axis::default()
                .title("kWh")
                .style(theme.axis)
                .bounds([0.0, max_kwh * 1.05])
                .labels(["0".to_string(), format_number(max_kwh, 1)]),
        );
    frame.render_widget(chart, area);
}

// ── Distribution ──────────────────────────────────────────────────────────────

fn render_distribution(frame: &mut Frame, area: Rect, series: &DashboardSeries, theme: &Theme) {
    // Tenths of a percent keep small shares visible.
    let bars: Vec<Bar> = series
        .distribution
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Bar::default()
                .value((d.value * 10.0).round() as u64)
                .text_value(format_percent(d.value, 1))
                .label(Line::from(d.building.clone()))
                .style(Style::default().fg(theme.series_color(i)))
        })
        .collect();

    let chart = BarChart::default()
        .block(panel("Consumption Distribution", theme))
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max(1000)
        .value_style(theme.value)
        .label_style(theme.label);
    frame.render_widget(chart, area);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
