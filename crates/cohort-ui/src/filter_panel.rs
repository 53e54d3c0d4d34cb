//! Side panel listing the cohort months and the activity range.

use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use cohort_core::months::format_month;
use cohort_data::filter::CohortFilter;

use crate::themes::Theme;

/// List label for one cohort: a check box and the month.
pub fn cohort_label(cohort: NaiveDate, filter: &CohortFilter) -> String {
    let mark = if filter.cohorts.contains(&cohort) {
        "[x]"
    } else {
        "[ ]"
    };
    format!("{mark} {}", format_month(cohort))
}

/// Render the cohort list with the cursor on `cursor`, and the activity range
/// below it.
pub fn render_filter_panel(
    frame: &mut Frame,
    area: Rect,
    cohorts: &[NaiveDate],
    filter: &CohortFilter,
    cursor: usize,
    theme: &Theme,
) {
    let [list_area, range_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(5)]).areas(area);

    let items: Vec<ListItem> = cohorts
        .iter()
        .map(|c| {
            let style = if filter.cohorts.contains(c) {
                theme.filter_selected
            } else {
                theme.text
            };
            ListItem::new(Span::styled(cohort_label(*c, filter), style))
        })
        .collect();

    let title = if filter.cohorts.is_empty() {
        " Cohorts (all) ".to_string()
    } else {
        format!(" Cohorts ({}/{}) ", filter.cohorts.len(), cohorts.len())
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(title, theme.header)),
        )
        .highlight_style(theme.filter_cursor);

    let mut state = ListState::default();
    if !cohorts.is_empty() {
        state.select(Some(cursor.min(cohorts.len() - 1)));
    }
    frame.render_stateful_widget(list, list_area, &mut state);

    let (start, end) = match filter.range {
        Some((start, end)) => (start.to_string(), end.to_string()),
        None => ("first".to_string(), "last".to_string()),
    };
    let range_lines = vec![
        Line::from(vec![
            Span::styled("From ", theme.label),
            Span::styled(start, theme.value),
        ]),
        Line::from(vec![
            Span::styled("To   ", theme.label),
            Span::styled(end, theme.value),
        ]),
        Line::from(Span::styled("[ ] start  { } end", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(range_lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(" Activity ", theme.header)),
        ),
        range_area,
    );
}
