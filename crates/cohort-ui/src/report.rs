//! Plain-text rendering of the profiling sections and the metrics table.
//!
//! The same [`Section`]s feed the Explore tab and the non-interactive
//! `report` view.

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

use cohort_core::formatting::{format_count, format_number};
use cohort_core::models::{CohortMetricRow, Tabular};
use cohort_data::analysis::AnalysisResult;
use cohort_data::filter::CohortFilter;
use cohort_data::metrics::calculate_totals;
use cohort_data::profile::{head, ColumnSummary, TableProfile, ValueCount};

use crate::table_view::{row_cells, totals_cells, HEADERS};

/// Rows of `user_id` frequencies shown.
const TOP_USERS: usize = 10;

// ── TextTable ─────────────────────────────────────────────────────────────────

/// Column-aligned plain-text table. Widths are measured in terminal cells.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Header, dashed rule and rows. The first column is left-aligned, the
    /// rest right-aligned.
    pub fn render(&self) -> Vec<String> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0usize; columns];
        for row in std::iter::once(&self.headers).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let mut out = Vec::with_capacity(self.rows.len() + 2);
        out.push(render_row(&self.headers, &widths));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for row in &self.rows {
            out.push(render_row(row, &widths));
        }
        out
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        let pad = width.saturating_sub(cell.width());
        if i > 0 {
            line.push_str("  ");
        }
        if i == 0 {
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
        } else {
            line.push_str(&" ".repeat(pad));
            line.push_str(cell);
        }
    }
    line.trim_end().to_string()
}

// ── Sections ──────────────────────────────────────────────────────────────────

/// One titled block of report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
        }
    }
}

/// First `n` rows of any table, every column as text.
pub fn head_table<T: Tabular>(rows: &[T], n: usize) -> TextTable {
    let columns = T::columns();
    let mut table = TextTable::new(columns.iter().map(|c| c.name));
    for row in head(rows, n) {
        table.push((0..columns.len()).map(|i| row.cell(i).to_string()));
    }
    table
}

pub fn describe_table(summaries: &[ColumnSummary]) -> TextTable {
    let stat = |v: Option<f64>| v.map_or_else(|| "NaN".to_string(), |v| format_number(v, 2));
    let mut table = TextTable::new(["column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
    for s in summaries {
        table.push([
            s.name.to_string(),
            format_count(s.count as u64),
            stat(s.mean),
            stat(s.std),
            stat(s.min),
            stat(s.p25),
            stat(s.p50),
            stat(s.p75),
            stat(s.max),
        ]);
    }
    table
}

/// Column, non-null count, kind and null count.
pub fn info_table(profile: &TableProfile) -> TextTable {
    let mut table = TextTable::new(["column", "non-null", "dtype", "nulls"]);
    for (info, (_, nulls)) in profile.info.iter().zip(&profile.nulls) {
        table.push([
            info.name.to_string(),
            format_count(info.non_null as u64),
            info.kind.to_string(),
            format_count(*nulls as u64),
        ]);
    }
    table
}

pub fn value_count_table(column: &str, counts: &[ValueCount], limit: usize) -> TextTable {
    let mut table = TextTable::new([column, "count"]);
    for vc in counts.iter().take(limit) {
        table.push([vc.value.clone(), format_count(vc.count as u64)]);
    }
    table
}

/// Every profiling section, in the order the Explore tab and report show
/// them.
pub fn profile_sections(result: &AnalysisResult, head_rows: usize) -> Vec<Section> {
    let profile = &result.profile;
    let report = &result.cleaned.report;

    let mut sections = vec![
        Section::new(
            format!("Fees: first {head_rows} rows"),
            head_table(&result.raw.fees, head_rows).render(),
        ),
        Section::new(
            format!("Cash requests: first {head_rows} rows"),
            head_table(&result.raw.cash, head_rows).render(),
        ),
        Section::new("Fees: summary statistics", describe_table(&profile.fees.describe).render()),
        Section::new(
            "Cash requests: summary statistics",
            describe_table(&profile.cash.describe).render(),
        ),
        Section::new(
            format!("Fees: columns ({} rows)", format_count(profile.fees.rows as u64)),
            info_table(&profile.fees).render(),
        ),
        Section::new(
            format!("Cash requests: columns ({} rows)", format_count(profile.cash.rows as u64)),
            info_table(&profile.cash).render(),
        ),
        Section::new(
            "Cleaning",
            vec![
                format!(
                    "Fees without cash_request_id dropped: {} ({} -> {})",
                    report.fees.dropped(),
                    report.fees.before,
                    report.fees.after
                ),
                format!(
                    "Cash requests without user_id dropped: {} ({} -> {})",
                    report.cash.dropped(),
                    report.cash.before,
                    report.cash.after
                ),
            ],
        ),
        Section::new(
            "Cash requests by status",
            value_count_table("status", &profile.status_counts, usize::MAX).render(),
        ),
        Section::new(
            format!("Most frequent users (top {TOP_USERS})"),
            value_count_table("user_id", &profile.user_counts, TOP_USERS).render(),
        ),
        Section::new(
            "Cash request ids referenced by fees",
            vec![
                format!("Matched:   {}", format_count(profile.id_match.matched as u64)),
                format!("Unmatched: {}", format_count(profile.id_match.unmatched as u64)),
            ],
        ),
    ];

    let timeline_title = match profile.most_active_user {
        Some((user, count)) => format!("Most active user: {user} ({count} requests)"),
        None => "Most active user: none".to_string(),
    };
    sections.push(Section::new(
        timeline_title,
        head_table(&profile.timeline, usize::MAX).render(),
    ));

    sections
}

/// The metrics table with its totals row.
pub fn metrics_section(rows: &[CohortMetricRow]) -> Section {
    let mut table = TextTable::new(HEADERS);
    for row in rows {
        table.push(row_cells(row));
    }
    table.push(totals_cells(&calculate_totals(rows)));

    let mut lines = table.render();
    if rows.iter().any(|r| r.initial_users_estimated) {
        lines.push(String::new());
        lines.push("* initial users unknown, defaulted to 1".to_string());
    }
    Section::new(format!("Cohort metrics ({} buckets)", rows.len()), lines)
}

/// Active filter and how many of the `total` buckets it keeps.
pub fn filter_section(filter: &CohortFilter, kept: usize, total: usize) -> Section {
    let lines = if filter.is_active() {
        vec![filter.to_string(), format!("{kept} of {total} buckets shown")]
    } else {
        vec![format!("none ({total} buckets shown)")]
    };
    Section::new("Filter", lines)
}

/// Full text report: profiling sections, the active filter and the filtered
/// metrics table.
pub fn render_report(
    result: &AnalysisResult,
    rows: &[CohortMetricRow],
    filter: &CohortFilter,
    head_rows: usize,
) -> String {
    let mut sections = profile_sections(result, head_rows);
    sections.push(filter_section(filter, rows.len(), result.metrics.len()));
    sections.push(metrics_section(rows));

    let mut out = String::new();
    for section in &sections {
        let _ = writeln!(out, "{}", section.title);
        let _ = writeln!(out, "{}", "=".repeat(section.title.width()));
        for line in &section.lines {
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
