use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark, 7–15 light. Absent or unparseable values give `Unknown`.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Unknown
}

/// Every style the dashboard, charts and report use.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Tabs ─────────────────────────────────────────────────────────────────
    pub tab_active: Style,
    pub tab_inactive: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,
    /// Rows whose cohort size was estimated.
    pub table_estimated: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    pub chart_axis: Style,
    pub chart_usage: Style,
    pub chart_incident: Style,
    pub chart_retention: Style,
    pub chart_revenue: Style,
    pub chart_bar: Style,

    // ── Filter panel ─────────────────────────────────────────────────────────
    pub filter_cursor: Style,
    pub filter_selected: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            tab_active: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            table_estimated: Style::default().fg(Color::Magenta),

            chart_axis: Style::default().fg(Color::Gray),
            chart_usage: Style::default().fg(Color::Cyan),
            chart_incident: Style::default().fg(Color::Red),
            chart_retention: Style::default().fg(Color::Green),
            chart_revenue: Style::default().fg(Color::Yellow),
            chart_bar: Style::default().fg(Color::Blue),

            filter_cursor: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan),
            filter_selected: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            tab_active: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            table_estimated: Style::default().fg(Color::Magenta),

            chart_axis: Style::default().fg(Color::DarkGray),
            chart_usage: Style::default().fg(Color::Blue),
            chart_incident: Style::default().fg(Color::Red),
            chart_retention: Style::default().fg(Color::Green),
            chart_revenue: Style::default().fg(Color::Magenta),
            chart_bar: Style::default().fg(Color::Blue),

            filter_cursor: Style::default()
                .fg(Color::White)
                .bg(Color::Blue),
            filter_selected: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Basic 8-colour ANSI palette without bold modifiers.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            tab_active: Style::default().fg(Color::Yellow),
            tab_inactive: Style::default().fg(Color::Gray),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),
            table_estimated: Style::default().fg(Color::Magenta),

            chart_axis: Style::default().fg(Color::White),
            chart_usage: Style::default().fg(Color::Cyan),
            chart_incident: Style::default().fg(Color::Red),
            chart_retention: Style::default().fg(Color::Green),
            chart_revenue: Style::default().fg(Color::Yellow),
            chart_bar: Style::default().fg(Color::Cyan),

            filter_cursor: Style::default().fg(Color::Black).bg(Color::White),
            filter_selected: Style::default().fg(Color::Green),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Style for an incident rate: low is good.
    ///
    /// * `< 10 %`  → `success`
    /// * `10–25 %` → `warning`
    /// * `≥ 25 %`  → `error`
    pub fn incident_style(&self, rate: f64) -> Style {
        if rate >= 0.25 {
            self.error
        } else if rate >= 0.10 {
            self.warning
        } else {
            self.success
        }
    }

    /// Style for a retention rate: high is good. Values above 1 only occur
    /// for estimated cohort sizes.
    pub fn retention_style(&self, rate: f64) -> Style {
        if rate > 1.0 {
            self.table_estimated
        } else if rate >= 0.5 {
            self.success
        } else if rate >= 0.2 {
            self.warning
        } else {
            self.error
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
