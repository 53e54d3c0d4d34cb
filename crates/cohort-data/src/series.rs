//! Chart-ready series derived from metric rows.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use cohort_core::models::CohortMetricRow;
use serde::Serialize;

/// Number of bins in the revenue histogram.
pub const REVENUE_BINS: usize = 30;

/// One x/y point keyed by month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: NaiveDate,
    pub value: f64,
}

/// One equal-width histogram bin, `[lower, upper)` except the last, which
/// also includes `upper`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Total attempts per activity month.
pub fn usage_over_time(rows: &[CohortMetricRow]) -> Vec<MonthPoint> {
    let mut sums: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in rows {
        *sums.entry(row.activity_month).or_insert(0.0) += row.cash_request_attempt as f64;
    }
    to_points(sums)
}

/// Mean of `value` per activity month, skipping rows where it is `None`.
/// Months where every row was skipped do not appear.
pub fn mean_by_activity_month(
    rows: &[CohortMetricRow],
    value: impl Fn(&CohortMetricRow) -> Option<f64>,
) -> Vec<MonthPoint> {
    let mut acc: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(v) = value(row) {
            let entry = acc.entry(row.activity_month).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(month, (sum, n))| MonthPoint {
            month,
            value: sum / n as f64,
        })
        .collect()
}

pub fn incident_rate_over_time(rows: &[CohortMetricRow]) -> Vec<MonthPoint> {
    mean_by_activity_month(rows, |r| Some(r.incident_rate))
}

pub fn retention_over_time(rows: &[CohortMetricRow]) -> Vec<MonthPoint> {
    mean_by_activity_month(rows, |r| Some(r.retention_rate))
}

pub fn revenue_over_time(rows: &[CohortMetricRow]) -> Vec<MonthPoint> {
    mean_by_activity_month(rows, |r| r.revenue)
}

/// Total attempts per cohort month.
pub fn attempts_per_cohort(rows: &[CohortMetricRow]) -> Vec<(NaiveDate, u64)> {
    let mut sums: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for row in rows {
        *sums.entry(row.cohort_month).or_insert(0) += row.cash_request_attempt;
    }
    sums.into_iter().collect()
}

/// Equal-width histogram of the present per-bucket revenues.
///
/// Empty when no row has revenue. When every value is equal the single
/// value is centred in a range one unit wide.
pub fn revenue_histogram(rows: &[CohortMetricRow], bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.revenue).collect();
    histogram(&values, bins)
}

/// Equal-width histogram over `values`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in values {
        let index = (((v - lo) / width) as usize).min(bins - 1);
        out[index].count += 1;
    }
    out
}

/// Every series the charts tab draws, computed once per filter change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub usage: Vec<MonthPoint>,
    pub incident_rate: Vec<MonthPoint>,
    pub retention: Vec<MonthPoint>,
    pub revenue: Vec<MonthPoint>,
    pub attempts_per_cohort: Vec<(NaiveDate, u64)>,
    pub revenue_histogram: Vec<HistogramBin>,
}

impl ChartData {
    pub fn from_rows(rows: &[CohortMetricRow]) -> Self {
        Self {
            usage: usage_over_time(rows),
            incident_rate: incident_rate_over_time(rows),
            retention: retention_over_time(rows),
            revenue: revenue_over_time(rows),
            attempts_per_cohort: attempts_per_cohort(rows),
            revenue_histogram: revenue_histogram(rows, REVENUE_BINS),
        }
    }
}

fn to_points(map: BTreeMap<NaiveDate, f64>) -> Vec<MonthPoint> {
    map.into_iter()
        .map(|(month, value)| MonthPoint { month, value })
        .collect()
}
