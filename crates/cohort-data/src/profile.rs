//! Exploratory profiling of the loaded tables.
//!
//! Everything here works over any [`Tabular`] record type, reading cells by
//! column index.

use std::collections::{HashMap, HashSet};

use cohort_core::models::{CashRequest, CohortRecord, ColumnKind, Fee, Tabular};
use serde::Serialize;

use crate::cleaner::CleanedTables;
use crate::reader::RawTables;

// ── Per-column summaries ──────────────────────────────────────────────────────

/// Summary statistics for one numeric column. Null cells are skipped; every
/// statistic is `None` when the column has no values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); `None` below two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Name, non-null count and kind of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub non_null: usize,
    pub kind: ColumnKind,
}

/// How often one distinct value occurs in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Cash requests whose id is, or is not, referenced by some fee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdMatch {
    pub matched: usize,
    pub unmatched: usize,
}

/// First `n` rows.
pub fn head<T>(rows: &[T], n: usize) -> &[T] {
    &rows[..n.min(rows.len())]
}

/// Position of `name` in `T`'s columns.
pub fn column_index<T: Tabular>(name: &str) -> Option<usize> {
    T::columns().iter().position(|c| c.name == name)
}

/// `count`, `mean`, `std`, `min`, quartiles and `max` for every numeric
/// column, in column order.
pub fn describe<T: Tabular>(rows: &[T]) -> Vec<ColumnSummary> {
    T::columns()
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.kind.is_numeric())
        .map(|(index, spec)| {
            let mut values: Vec<f64> = rows.iter().filter_map(|r| r.cell(index).as_f64()).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            summarize(spec.name, &values)
        })
        .collect()
}

/// Non-null count and kind for every column.
pub fn info<T: Tabular>(rows: &[T]) -> Vec<ColumnInfo> {
    T::columns()
        .iter()
        .enumerate()
        .map(|(index, spec)| ColumnInfo {
            name: spec.name,
            non_null: rows.iter().filter(|r| !r.cell(index).is_null()).count(),
            kind: spec.kind,
        })
        .collect()
}

/// Null count for every column.
pub fn null_counts<T: Tabular>(rows: &[T]) -> Vec<(&'static str, usize)> {
    T::columns()
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let nulls = rows.iter().filter(|r| r.cell(index).is_null()).count();
            (spec.name, nulls)
        })
        .collect()
}

/// Frequency of each distinct non-null value of `column`, most frequent
/// first; ties are ordered by value, numerically for numeric cells.
///
/// Returns `None` when `T` has no such column.
pub fn value_counts<T: Tabular>(rows: &[T], column: &str) -> Option<Vec<ValueCount>> {
    let index = column_index::<T>(column)?;

    let mut counts: HashMap<String, (usize, Option<f64>)> = HashMap::new();
    for row in rows {
        let cell = row.cell(index);
        if cell.is_null() {
            continue;
        }
        let numeric = cell.as_f64();
        counts.entry(cell.to_string()).or_insert((0, numeric)).0 += 1;
    }

    let mut entries: Vec<(String, usize, Option<f64>)> = counts
        .into_iter()
        .map(|(value, (count, numeric))| (value, count, numeric))
        .collect();
    entries.sort_by(|a, b| {
        b.1.cmp(&a.1).then_with(|| match (a.2, b.2) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a.0.cmp(&b.0),
        })
    });

    Some(
        entries
            .into_iter()
            .map(|(value, count, _)| ValueCount { value, count })
            .collect(),
    )
}

/// How many cash requests are referenced by at least one fee.
pub fn id_match_counts(cash: &[CashRequest], fees: &[Fee]) -> IdMatch {
    let referenced: HashSet<u64> = fees.iter().filter_map(|f| f.cash_request_id).collect();
    let matched = cash.iter().filter(|r| referenced.contains(&r.id)).count();
    IdMatch {
        matched,
        unmatched: cash.len() - matched,
    }
}

/// User with the most requests and their request count. Ties go to the
/// smallest user id.
pub fn most_active_user(records: &[CohortRecord]) -> Option<(u64, usize)> {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.user_id).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
}

/// One user's records, most recent activity month first.
pub fn user_timeline(records: &[CohortRecord], user_id: u64) -> Vec<CohortRecord> {
    let mut timeline: Vec<CohortRecord> = records
        .iter()
        .filter(|r| r.user_id == user_id)
        .cloned()
        .collect();
    timeline.sort_by(|a, b| {
        b.activity_month
            .cmp(&a.activity_month)
            .then(b.created_at.cmp(&a.created_at))
    });
    timeline
}

// ── Dataset profile ───────────────────────────────────────────────────────────

/// Per-table profiling sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableProfile {
    pub name: &'static str,
    pub rows: usize,
    pub info: Vec<ColumnInfo>,
    pub describe: Vec<ColumnSummary>,
    pub nulls: Vec<(&'static str, usize)>,
}

impl TableProfile {
    pub fn of<T: Tabular>(name: &'static str, rows: &[T]) -> Self {
        Self {
            name,
            rows: rows.len(),
            info: info(rows),
            describe: describe(rows),
            nulls: null_counts(rows),
        }
    }
}

/// Everything the explore view and the text report show about the dataset.
///
/// Table sections describe the raw, uncleaned tables. Status and user
/// frequencies and the id match use the cleaned tables; the timeline uses
/// the derived cohort records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetProfile {
    pub cash: TableProfile,
    pub fees: TableProfile,
    pub status_counts: Vec<ValueCount>,
    pub user_counts: Vec<ValueCount>,
    pub id_match: IdMatch,
    pub most_active_user: Option<(u64, usize)>,
    pub timeline: Vec<CohortRecord>,
}

/// Profile `raw`, its cleaned form and the cohort records derived from it.
pub fn profile_dataset(
    raw: &RawTables,
    cleaned: &CleanedTables,
    records: &[CohortRecord],
) -> DatasetProfile {
    let most_active = most_active_user(records);
    let timeline = most_active
        .map(|(user_id, _)| user_timeline(records, user_id))
        .unwrap_or_default();

    DatasetProfile {
        cash: TableProfile::of("cash_request", &raw.cash),
        fees: TableProfile::of("fees", &raw.fees),
        status_counts: value_counts(&cleaned.cash, "status").unwrap_or_default(),
        user_counts: value_counts(&cleaned.cash, "user_id").unwrap_or_default(),
        id_match: id_match_counts(&cleaned.cash, &cleaned.fees),
        most_active_user: most_active,
        timeline,
    }
}

// ── Private ───────────────────────────────────────────────────────────────────

fn summarize(name: &'static str, sorted: &[f64]) -> ColumnSummary {
    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        let var = sorted.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    });

    ColumnSummary {
        name,
        count,
        mean,
        std,
        min: sorted.first().copied(),
        p25: quantile(sorted, 0.25),
        p50: quantile(sorted, 0.5),
        p75: quantile(sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
