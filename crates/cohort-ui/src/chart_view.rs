//! Charts tab: four monthly line charts, attempts per cohort and the revenue
//! histogram.

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    symbols,
    text::Span,
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use cohort_core::formatting::format_number;
use cohort_core::months::{format_month, month_ordinal};
use cohort_data::series::{ChartData, HistogramBin, MonthPoint};

use crate::themes::Theme;

/// How a line chart labels its y axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueFormat {
    Count,
    Ratio,
    Amount,
}

impl ValueFormat {
    pub fn label(self, value: f64) -> String {
        match self {
            ValueFormat::Count => format_number(value, 0),
            ValueFormat::Ratio => format!("{}%", format_number(value * 100.0, 0)),
            ValueFormat::Amount => format_number(value, 2),
        }
    }
}

/// Series as chart coordinates, x being months since the first point.
/// Months without a point leave a gap on the axis.
pub fn line_points(series: &[MonthPoint]) -> Vec<(f64, f64)> {
    let Some(first) = series.first().map(|p| month_ordinal(p.month)) else {
        return Vec::new();
    };
    series
        .iter()
        .map(|p| (f64::from(month_ordinal(p.month) - first), p.value))
        .collect()
}

/// Y-axis bounds from zero to a little above the largest value.
pub fn y_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let max = points.iter().map(|(_, y)| *y).fold(0.0_f64, f64::max);
    if max <= 0.0 {
        [0.0, 1.0]
    } else {
        [0.0, max * 1.1]
    }
}

/// Render every chart of the tab into `area`.
pub fn render_charts(frame: &mut Frame, area: Rect, charts: &ChartData, theme: &Theme) {
    let rows = Layout::vertical([
        Constraint::Percentage(34),
        Constraint::Percentage(33),
        Constraint::Percentage(33),
    ])
    .split(area);
    let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[0]);
    let middle =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[1]);
    let bottom =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[2]);

    render_line_chart(
        frame,
        top[0],
        "Usage Over Time (attempts)",
        &charts.usage,
        ValueFormat::Count,
        theme.chart_usage,
        theme,
    );
    render_line_chart(
        frame,
        top[1],
        "Incident Rate Over Time",
        &charts.incident_rate,
        ValueFormat::Ratio,
        theme.chart_incident,
        theme,
    );
    render_line_chart(
        frame,
        middle[0],
        "Retention Rate Over Time",
        &charts.retention,
        ValueFormat::Ratio,
        theme.chart_retention,
        theme,
    );
    render_line_chart(
        frame,
        middle[1],
        "Revenue Over Time (mean per bucket)",
        &charts.revenue,
        ValueFormat::Amount,
        theme.chart_revenue,
        theme,
    );
    render_cohort_bars(frame, bottom[0], &charts.attempts_per_cohort, theme);
    render_histogram(frame, bottom[1], &charts.revenue_histogram, theme);
}

/// One monthly series as a line chart.
pub fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    series: &[MonthPoint],
    format: ValueFormat,
    style: Style,
    theme: &Theme,
) {
    let block = chart_block(title, theme);
    if series.is_empty() {
        render_empty(frame, area, block, theme);
        return;
    }

    let points = line_points(series);
    let [y_min, y_max] = y_bounds(&points);
    let x_max = points.last().map_or(1.0, |(x, _)| x.max(1.0));

    let first = series.first().map(|p| p.month);
    let last = series.last().map(|p| p.month);
    let x_labels: Vec<String> = [first, last].into_iter().flatten().map(format_month).collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(style)
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(theme.chart_axis)
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(theme.chart_axis)
                .bounds([y_min, y_max])
                .labels([format.label(y_min), format.label(y_max)]),
        );

    frame.render_widget(chart, area);
}

/// Bar per cohort month with its total attempts.
pub fn render_cohort_bars(
    frame: &mut Frame,
    area: Rect,
    data: &[(NaiveDate, u64)],
    theme: &Theme,
) {
    let block = chart_block("Total Attempts per Cohort", theme);
    if data.is_empty() {
        render_empty(frame, area, block, theme);
        return;
    }

    let labels: Vec<String> = data.iter().map(|(month, _)| format_month(*month)).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(data)
        .map(|(label, (_, value))| (label.as_str(), *value))
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(bars.as_slice())
        .bar_width(bar_width(area, data.len(), 7))
        .bar_gap(1)
        .bar_style(theme.chart_bar)
        .value_style(theme.value)
        .label_style(theme.label);

    frame.render_widget(chart, area);
}

/// Revenue histogram, one bar per bin labelled with its lower bound.
pub fn render_histogram(frame: &mut Frame, area: Rect, bins: &[HistogramBin], theme: &Theme) {
    let block = chart_block("Revenue Distribution", theme);
    if bins.is_empty() {
        render_empty(frame, area, block, theme);
        return;
    }

    let labels: Vec<String> = bins.iter().map(|b| format_number(b.lower, 0)).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(bins)
        .map(|(label, bin)| (label.as_str(), bin.count as u64))
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(bars.as_slice())
        .bar_width(bar_width(area, bins.len(), 1))
        .bar_gap(0)
        .bar_style(theme.chart_revenue)
        .value_style(theme.value)
        .label_style(theme.dim);

    frame.render_widget(chart, area);
}

// ── Private ───────────────────────────────────────────────────────────────────

fn chart_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(format!(" {title} "), theme.header))
}

fn render_empty(frame: &mut Frame, area: Rect, block: Block, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(Span::styled("No data for the current filter", theme.dim)).block(block),
        area,
    );
}

/// Widest bar that fits `count` bars in `area`, at least `min` cells.
fn bar_width(area: Rect, count: usize, min: u16) -> u16 {
    let inner = area.width.saturating_sub(2) as usize;
    let per_bar = inner / count.max(1);
    (per_bar.saturating_sub(1) as u16).clamp(1, 12).max(min)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
