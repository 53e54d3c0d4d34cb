//! Cohort metrics table for the dashboard TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per
//! (cohort month, activity month) bucket plus a highlighted totals row.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use cohort_core::formatting::{format_count, format_optional_amount, format_ratio};
use cohort_core::models::CohortMetricRow;
use cohort_core::months::format_month;
use cohort_data::metrics::{calculate_totals, MetricTotals};

use crate::themes::Theme;

/// Column titles, in display order.
pub const HEADERS: [&str; 10] = [
    "Cohort",
    "Activity",
    "Index",
    "Attempts",
    "Incidents",
    "Incident %",
    "Users",
    "Initial",
    "Retention",
    "Revenue",
];

/// Display text for one metric row, in [`HEADERS`] order. Estimated cohort
/// sizes are marked with `*`.
pub fn row_cells(row: &CohortMetricRow) -> [String; 10] {
    let initial = if row.initial_users_estimated {
        format!("{}*", format_count(row.initial_users))
    } else {
        format_count(row.initial_users)
    };
    [
        format_month(row.cohort_month),
        format_month(row.activity_month),
        row.cohort_index.to_string(),
        format_count(row.cash_request_attempt),
        format_count(row.incident_count),
        format_ratio(row.incident_rate),
        format_count(row.unique_users),
        initial,
        format_ratio(row.retention_rate),
        format_optional_amount(row.revenue),
    ]
}

/// Display text for the totals row, in [`HEADERS`] order.
pub fn totals_cells(totals: &MetricTotals) -> [String; 10] {
    [
        "TOTAL".to_string(),
        format!("{} buckets", totals.buckets),
        String::new(),
        format_count(totals.cash_request_attempt),
        format_count(totals.incident_count),
        format_ratio(totals.incident_rate()),
        String::new(),
        String::new(),
        String::new(),
        format_optional_amount(totals.revenue),
    ]
}

/// Render `rows` into `area`, skipping the first `scroll` rows.
pub fn render_metrics_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[CohortMetricRow],
    scroll: usize,
    theme: &Theme,
) {
    if rows.is_empty() {
        render_no_data(frame, area, theme);
        return;
    }

    let header = Row::new(HEADERS.iter().map(|h| Cell::from(*h).style(theme.table_header))).height(1);

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(scroll)
        .map(|(i, row)| {
            let style = if row.initial_users_estimated {
                theme.table_estimated
            } else if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let cells = row_cells(row);
            let [cohort, activity, index, attempts, incidents, incident_rate, users, initial, retention, revenue] =
                cells;
            Row::new(vec![
                Cell::from(cohort),
                Cell::from(activity),
                Cell::from(index),
                Cell::from(attempts),
                Cell::from(incidents),
                Cell::from(incident_rate).style(theme.incident_style(row.incident_rate)),
                Cell::from(users),
                Cell::from(initial),
                Cell::from(retention).style(theme.retention_style(row.retention_rate)),
                Cell::from(revenue),
            ])
            .style(style)
        })
        .collect();

    let totals = calculate_totals(rows);
    let total_row = Row::new(totals_cells(&totals).into_iter().map(Cell::from)).style(theme.table_total);

    let mut all_rows = data_rows;
    all_rows.push(total_row);

    let widths = [
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Length(9),
        Constraint::Length(10),
        Constraint::Length(12),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" Cohort Metrics ({} buckets) ", rows.len())),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Placeholder when the filter leaves nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No metric rows match the current filter", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Press 'r' to reset filters, or 'q' / Ctrl+C to exit",
            theme.dim,
        )),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Cohort Metrics "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
