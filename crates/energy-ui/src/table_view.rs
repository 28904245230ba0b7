//! Building summary table.
//!
//! One row per building in name order, followed by a highlighted campus
//! totals row.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use energy_core::formatting::{format_hour, format_number, format_percent};
use energy_data::report::Report;

use crate::themes::Theme;

const NAME_HEADER: &str = "Building";
const MAX_NAME_WIDTH: usize = 32;

/// Display width of the building-name column.
pub fn name_column_width(report: &Report) -> u16 {
    let widest = report
        .buildings
        .iter()
        .map(|b| UnicodeWidthStr::width(b.name.as_str()))
        .chain(std::iter::once(NAME_HEADER.width()))
        .max()
        .unwrap_or(0);
    widest.min(MAX_NAME_WIDTH) as u16
}

/// Render the building summary for `report` into `area`.
pub fn render_table_view(frame: &mut Frame, area: Rect, report: &Report, theme: &Theme) {
    let header_cells = [
        NAME_HEADER,
        "Total kWh",
        "Share",
        "Mean kWh",
        "Min kWh",
        "Peak kWh",
        "Peak At",
        "Peak Hour",
        "Readings",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let mut rows: Vec<Row> = report
        .buildings
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(b.name.clone()),
                Cell::from(format_number(b.total, 2)),
                Cell::from(format_percent(b.percentage, 1)).style(theme.share_style(b.percentage)),
                Cell::from(format_number(b.average, 2)),
                Cell::from(format_number(b.min_kwh, 2)),
                Cell::from(format_number(b.peak.kwh, 2)),
                Cell::from(b.peak.timestamp.format("%Y-%m-%d %H:%M").to_string()),
                Cell::from(format_hour(b.peak_hour.hour)),
                Cell::from(b.readings.to_string()),
            ])
            .style(style)
        })
        .collect();

    rows.push(
        Row::new(vec![
            Cell::from("CAMPUS"),
            Cell::from(format_number(report.campus_total, 2)),
            Cell::from(format_percent(100.0, 1)),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(format_hour(report.campus_peak_hour.hour)),
            Cell::from(report.reading_count.to_string()),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Length(name_column_width(report)),
        Constraint::Length(14),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(17),
        Constraint::Length(10),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Building Summary "),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Placeholder shown when no report could be assembled.
pub fn render_no_data(frame: &mut Frame, area: Rect, reason: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No report available", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(reason.to_string(), theme.dim)),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Campus Energy "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
