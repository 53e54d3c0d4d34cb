//! Cohort and date-range selection over metric rows.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use cohort_core::models::CohortMetricRow;
use cohort_core::months::{format_month, shift_months};
use cohort_core::{CohortError, Result};

/// Which metric rows to show.
///
/// An empty cohort set means every cohort. `range` bounds `activity_month`
/// inclusively on both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CohortFilter {
    pub cohorts: BTreeSet<NaiveDate>,
    pub range: Option<(NaiveDate, NaiveDate)>,
}

impl CohortFilter {
    /// Build a filter, rejecting a range whose start is after its end.
    pub fn new(
        cohorts: impl IntoIterator<Item = NaiveDate>,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Self> {
        if let Some((start, end)) = range {
            if start > end {
                return Err(CohortError::InvalidFilter(format!(
                    "range start {start} is after range end {end}"
                )));
            }
        }
        Ok(Self {
            cohorts: cohorts.into_iter().collect(),
            range,
        })
    }

    /// Whether any restriction is in place.
    pub fn is_active(&self) -> bool {
        !self.cohorts.is_empty() || self.range.is_some()
    }

    pub fn matches(&self, row: &CohortMetricRow) -> bool {
        let cohort_ok = self.cohorts.is_empty() || self.cohorts.contains(&row.cohort_month);
        let range_ok = self
            .range
            .map_or(true, |(start, end)| start <= row.activity_month && row.activity_month <= end);
        cohort_ok && range_ok
    }

    /// Rows passing the filter, in their original order.
    pub fn apply(&self, rows: &[CohortMetricRow]) -> Vec<CohortMetricRow> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Add `cohort` to the selection, or remove it if already selected.
    pub fn toggle_cohort(&mut self, cohort: NaiveDate) {
        if !self.cohorts.remove(&cohort) {
            self.cohorts.insert(cohort);
        }
    }

    pub fn clear_cohorts(&mut self) {
        self.cohorts.clear();
    }

    /// Move the range start by `delta` months, never past the range end.
    ///
    /// With no range yet, `bounds` (usually the data's activity span) is
    /// taken as the starting range.
    pub fn shift_start(&mut self, delta: i32, bounds: (NaiveDate, NaiveDate)) {
        let (start, end) = self.range.unwrap_or(bounds);
        let moved = shift_months(start, delta);
        self.range = Some((moved.min(end), end));
    }

    /// Move the range end by `delta` months, never before the range start.
    pub fn shift_end(&mut self, delta: i32, bounds: (NaiveDate, NaiveDate)) {
        let (start, end) = self.range.unwrap_or(bounds);
        let moved = shift_months(end, delta);
        self.range = Some((start, moved.max(start)));
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for CohortFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cohorts.is_empty() {
            f.write_str("cohorts: all")?;
        } else {
            let names: Vec<String> = self.cohorts.iter().map(|c| format_month(*c)).collect();
            write!(f, "cohorts: {}", names.join(", "))?;
        }
        match self.range {
            Some((start, end)) => write!(f, " | activity: {start} to {end}"),
            None => f.write_str(" | activity: all"),
        }
    }
}

/// Distinct cohort months, ascending.
pub fn available_cohorts(rows: &[CohortMetricRow]) -> Vec<NaiveDate> {
    rows.iter()
        .map(|r| r.cohort_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest and latest activity month, `None` for no rows.
pub fn activity_bounds(rows: &[CohortMetricRow]) -> Option<(NaiveDate, NaiveDate)> {
    let min = rows.iter().map(|r| r.activity_month).min()?;
    let max = rows.iter().map(|r| r.activity_month).max()?;
    Some((min, max))
}
