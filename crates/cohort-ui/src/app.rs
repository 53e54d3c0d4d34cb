//! Dashboard state and TUI event loop.
//!
//! [`App`] owns the theme, the active tab, the cohort filter and everything
//! derived from the filter. Key handling is separate from the terminal loop
//! so it can be driven directly in tests.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    text::{Line, Text},
    widgets::{Paragraph, Tabs},
    Frame, Terminal,
};
use tracing::debug;

use cohort_core::formatting::format_count;
use cohort_core::models::CohortMetricRow;
use cohort_data::analysis::AnalysisResult;
use cohort_data::filter::{activity_bounds, available_cohorts, CohortFilter};
use cohort_data::series::ChartData;

use crate::chart_view::render_charts;
use crate::components::header::Header;
use crate::components::key_hints::key_hints_line;
use crate::explore_view::render_explore;
use crate::filter_panel::render_filter_panel;
use crate::report::{profile_sections, Section};
use crate::table_view::render_metrics_table;
use crate::themes::Theme;

/// Width of the filter side panel.
const FILTER_PANEL_WIDTH: u16 = 24;
/// Lines moved per PgUp / PgDn.
const PAGE: usize = 10;

// ── Tab ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Metrics,
    Charts,
    Explore,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Metrics, Tab::Charts, Tab::Explore];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Metrics => "Metrics",
            Tab::Charts => "Charts",
            Tab::Explore => "Explore",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Metrics => 0,
            Tab::Charts => 1,
            Tab::Explore => 2,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard.
pub struct App {
    pub theme: Theme,
    pub tab: Tab,
    pub filter: CohortFilter,
    /// Cursor position in the cohort list.
    pub cursor: usize,
    /// Rows scrolled off the top of the metrics table or explore page.
    pub scroll: usize,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,

    metrics: Vec<CohortMetricRow>,
    cohorts: Vec<NaiveDate>,
    bounds: Option<(NaiveDate, NaiveDate)>,
    sections: Vec<Section>,
    dataset_label: String,

    filtered: Vec<CohortMetricRow>,
    charts: ChartData,
}

impl App {
    /// Build the dashboard over `result`, starting from `filter`.
    pub fn new(theme_name: &str, result: &AnalysisResult, filter: CohortFilter, head_rows: usize) -> Self {
        let cohorts = available_cohorts(&result.metrics);
        let dataset_label = format!(
            "{} requests, {} fees, {} cohorts",
            format_count(result.metadata.requests_loaded as u64),
            format_count(result.metadata.fees_loaded as u64),
            cohorts.len()
        );
        let mut app = Self {
            theme: Theme::from_name(theme_name),
            tab: Tab::Metrics,
            filter,
            cursor: 0,
            scroll: 0,
            should_quit: false,
            metrics: result.metrics.clone(),
            cohorts,
            bounds: activity_bounds(&result.metrics),
            sections: profile_sections(result, head_rows),
            dataset_label,
            filtered: Vec::new(),
            charts: ChartData::default(),
        };
        app.refresh();
        app
    }

    /// Metric rows passing the current filter.
    pub fn filtered(&self) -> &[CohortMetricRow] {
        &self.filtered
    }

    pub fn charts(&self) -> &ChartData {
        &self.charts
    }

    pub fn cohorts(&self) -> &[NaiveDate] {
        &self.cohorts
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the dashboard until `q`, `Q` or `Ctrl+C`.
    pub fn run(mut self) -> io::Result<()> {
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

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,

            KeyCode::Tab | KeyCode::Right => self.switch_tab(self.tab.next()),
            KeyCode::BackTab | KeyCode::Left => self.switch_tab(self.tab.previous()),

            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < self.cohorts.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(PAGE),
            KeyCode::PageDown => self.scroll += PAGE,

            KeyCode::Char(' ') => {
                if let Some(cohort) = self.cohorts.get(self.cursor).copied() {
                    self.filter.toggle_cohort(cohort);
                    self.refresh();
                }
            }
            KeyCode::Char('c') => {
                self.filter.clear_cohorts();
                self.refresh();
            }
            KeyCode::Char('[') => self.shift_range(|f, b| f.shift_start(-1, b)),
            KeyCode::Char(']') => self.shift_range(|f, b| f.shift_start(1, b)),
            KeyCode::Char('{') => self.shift_range(|f, b| f.shift_end(-1, b)),
            KeyCode::Char('}') => self.shift_range(|f, b| f.shift_end(1, b)),
            KeyCode::Char('r') => {
                self.filter.reset();
                self.refresh();
            }
            _ => {}
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let filter_label = self.filter.to_string();
        let header = Header::new(&self.dataset_label, &filter_label, &self.theme);

        let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(Paragraph::new(Text::from(header.to_lines())), header_area);

        let titles: Vec<Line> = Tab::ALL.iter().map(|t| Line::from(t.title())).collect();
        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .style(self.theme.tab_inactive)
            .highlight_style(self.theme.tab_active)
            .divider("|");
        frame.render_widget(tabs, tabs_area);

        let [panel_area, content_area] =
            Layout::horizontal([Constraint::Length(FILTER_PANEL_WIDTH), Constraint::Min(0)])
                .areas(body_area);

        render_filter_panel(
            frame,
            panel_area,
            &self.cohorts,
            &self.filter,
            self.cursor,
            &self.theme,
        );

        match self.tab {
            Tab::Metrics => {
                render_metrics_table(frame, content_area, &self.filtered, self.scroll, &self.theme)
            }
            Tab::Charts => render_charts(frame, content_area, &self.charts, &self.theme),
            Tab::Explore => render_explore(
                frame,
                content_area,
                &self.sections,
                u16::try_from(self.scroll).unwrap_or(u16::MAX),
                &self.theme,
            ),
        }

        frame.render_widget(Paragraph::new(key_hints_line(&self.theme)), footer_area);
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.scroll = 0;
    }

    fn shift_range(&mut self, shift: impl FnOnce(&mut CohortFilter, (NaiveDate, NaiveDate))) {
        if let Some(bounds) = self.bounds {
            shift(&mut self.filter, bounds);
            self.refresh();
        }
    }

    /// Recompute everything derived from the filter.
    fn refresh(&mut self) {
        self.filtered = self.filter.apply(&self.metrics);
        self.charts = ChartData::from_rows(&self.filtered);
        self.scroll = self.scroll.min(self.filtered.len());
        debug!("Filter {} keeps {} of {} rows", self.filter, self.filtered.len(), self.metrics.len());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
