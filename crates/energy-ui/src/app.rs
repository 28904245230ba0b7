//! Application state and TUI event loop.
//!
//! [`App`] owns the theme, the active view and the data to show.  The data
//! is fixed for the lifetime of the app; the loop only redraws and reacts to
//! keys.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use energy_data::report::Report;
use energy_data::series::DashboardSeries;

use crate::dashboard;
use crate::table_view;
use crate::themes::Theme;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which view the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Four-panel chart dashboard.
    Dashboard,
    /// Building summary table.
    Table,
}

impl ViewMode {
    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Dashboard => ViewMode::Table,
            ViewMode::Table => ViewMode::Dashboard,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::Dashboard => "Dashboard",
            ViewMode::Table => "Buildings",
        }
    }
}

// ── ViewData ──────────────────────────────────────────────────────────────────

/// What the app has to show.
#[derive(Debug, Clone)]
pub enum ViewData {
    Ready {
        report: Box<Report>,
        series: Box<DashboardSeries>,
    },
    /// The analysis failed; the message explains why.
    Unavailable(String),
}

impl ViewData {
    pub fn ready(report: Report, series: DashboardSeries) -> Self {
        ViewData::Ready {
            report: Box::new(report),
            series: Box::new(series),
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    pub data: ViewData,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str, view_mode: ViewMode, data: ViewData) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view_mode,
            data,
            should_quit: false,
        }
    }

    /// Run the interactive view until `q`, `Esc` or `Ctrl+C`.  `Tab` switches
    /// between the dashboard and the table.
    pub async fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Apply one key press to the app state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => self.view_mode = self.view_mode.toggle(),
            KeyCode::Char('d') => self.view_mode = ViewMode::Dashboard,
            KeyCode::Char('t') => self.view_mode = ViewMode::Table,
            _ => {}
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub(crate) fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        match &self.data {
            ViewData::Ready { report, series } => match self.view_mode {
                ViewMode::Dashboard => {
                    dashboard::render_dashboard(frame, chunks[0], report, series, &self.theme)
                }
                ViewMode::Table => {
                    table_view::render_table_view(frame, chunks[0], report, &self.theme)
                }
            },
            ViewData::Unavailable(reason) => {
                table_view::render_no_data(frame, chunks[0], reason, &self.theme)
            }
        }

        frame.render_widget(Paragraph::new(self.footer()), chunks[1]);
    }

    fn footer(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for mode in [ViewMode::Dashboard, ViewMode::Table] {
            let style = if mode == self.view_mode {
                self.theme.tab_active
            } else {
                self.theme.tab_inactive
            };
            spans.push(Span::styled(format!(" {} ", mode.title()), style));
        }
        spans.push(Span::styled(
            "  Tab: switch view  q/Esc: quit",
            self.theme.dim,
        ));
        Line::from(spans)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_view::tests::{buffer_text, sample_report};
    use energy_data::ingest::ingest_rows;
    use energy_data::validator::{RawRow, ReadingValidator};
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;

    fn ready() -> ViewData {
        let rows = vec![
            RawRow::new("Library", "2024-01-01 08:00", "10"),
            RawRow::new("Library", "2024-01-01 09:00", "20"),
            RawRow::new("Library", "2024-01-02 08:00", "5"),
            RawRow::new("Science", "2024-01-01 08:00", "40"),
            RawRow::new("Science", "2024-01-02 09:00", "25"),
        ];
        let campus = ingest_rows(rows, &ReadingValidator::default()).campus;
        ViewData::ready(
            sample_report(["Library", "Science"]),
            DashboardSeries::from_campus(&campus).unwrap(),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_view_mode_toggle() {
        assert_eq!(ViewMode::Dashboard.toggle(), ViewMode::Table);
        assert_eq!(ViewMode::Table.toggle(), ViewMode::Dashboard);
    }

    #[test]
    fn test_app_creation_defaults() {
        let app = App::new("dark", ViewMode::Dashboard, ready());
        assert!(!app.should_quit);
        assert_eq!(app.view_mode, ViewMode::Dashboard);
        assert_eq!(app.theme.text.fg, Some(Color::White));
    }

    #[test]
    fn test_app_creation_light_theme() {
        let app = App::new("light", ViewMode::Table, ready());
        assert_eq!(app.theme.text.fg, Some(Color::Black));
    }

    #[test]
    fn test_handle_key_tab_switches_view() {
        let mut app = App::new("dark", ViewMode::Dashboard, ready());
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.view_mode, ViewMode::Table);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.view_mode, ViewMode::Dashboard);
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(app.view_mode, ViewMode::Table);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_handle_key_quit_keys() {
        for event in [
            key(KeyCode::Char('q')),
            key(KeyCode::Esc),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut app = App::new("dark", ViewMode::Table, ready());
            app.handle_key(event);
            assert!(app.should_quit);
        }
    }

    #[test]
    fn test_plain_c_does_not_quit() {
        let mut app = App::new("dark", ViewMode::Table, ready());
        app.handle_key(key(KeyCode::Char('c')));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_render_each_view() {
        let mut app = App::new("dark", ViewMode::Dashboard, ready());
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();

        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(buffer_text(&terminal).contains("Daily Consumption Trend"));

        app.handle_key(key(KeyCode::Tab));
        terminal.draw(|frame| app.render(frame)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Building Summary"));
        assert!(text.contains("Tab: switch view"));
    }

    #[test]
    fn test_render_unavailable() {
        let app = App::new(
            "classic",
            ViewMode::Dashboard,
            ViewData::Unavailable("No data available for campus".to_string()),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(buffer_text(&terminal).contains("No data available for campus"));
    }
}
