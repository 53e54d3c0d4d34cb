//! Per-bucket cohort metrics.
//!
//! A bucket is one `(cohort_month, activity_month)` pair. Every metric is
//! left-joined onto the buckets present in the records.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use cohort_core::models::{CohortMetricRow, CohortRecord};
use cohort_core::months::months_between;
use tracing::{debug, warn};

type BucketKey = (NaiveDate, NaiveDate);

// ── BucketStats ───────────────────────────────────────────────────────────────

/// Running counters for one bucket.
#[derive(Debug, Clone, Default)]
struct BucketStats {
    attempts: u64,
    incidents: u64,
    users: HashSet<u64>,
    revenue: Option<f64>,
}

impl BucketStats {
    fn add_record(&mut self, record: &CohortRecord) {
        self.attempts += 1;
        if record.is_incident() {
            self.incidents += 1;
        }
        self.users.insert(record.user_id);
        if let Some(amount) = record.revenue {
            *self.revenue.get_or_insert(0.0) += amount;
        }
    }
}

// ── MetricTotals ──────────────────────────────────────────────────────────────

/// Column totals over a set of metric rows, for table footers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTotals {
    pub buckets: usize,
    pub cash_request_attempt: u64,
    pub incident_count: u64,
    pub revenue: Option<f64>,
}

impl MetricTotals {
    /// Incidents over attempts across all rows, 0 when there are none.
    pub fn incident_rate(&self) -> f64 {
        if self.cash_request_attempt == 0 {
            0.0
        } else {
            self.incident_count as f64 / self.cash_request_attempt as f64
        }
    }
}

/// Sum attempts, incidents and present revenue over `rows`.
pub fn calculate_totals(rows: &[CohortMetricRow]) -> MetricTotals {
    let mut totals = MetricTotals {
        buckets: rows.len(),
        ..MetricTotals::default()
    };
    for row in rows {
        totals.cash_request_attempt += row.cash_request_attempt;
        totals.incident_count += row.incident_count;
        if let Some(amount) = row.revenue {
            *totals.revenue.get_or_insert(0.0) += amount;
        }
    }
    totals
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Distinct users per cohort month.
pub fn initial_users(records: &[CohortRecord]) -> HashMap<NaiveDate, u64> {
    let mut users: HashMap<NaiveDate, HashSet<u64>> = HashMap::new();
    for record in records {
        users
            .entry(record.cohort_month)
            .or_default()
            .insert(record.user_id);
    }
    users
        .into_iter()
        .map(|(cohort, set)| (cohort, set.len() as u64))
        .collect()
}

/// One metric row per `(cohort_month, activity_month)` bucket, ordered by
/// cohort month then activity month.
pub fn aggregate(records: &[CohortRecord]) -> Vec<CohortMetricRow> {
    aggregate_with_initial_users(records, &initial_users(records))
}

/// Like [`aggregate`], but reads cohort sizes from `initial`.
///
/// A cohort missing from `initial` gets `initial_users = 1` and
/// `initial_users_estimated = true`; its retention is then the raw unique
/// user count and may exceed 1.
pub fn aggregate_with_initial_users(
    records: &[CohortRecord],
    initial: &HashMap<NaiveDate, u64>,
) -> Vec<CohortMetricRow> {
    let mut buckets: BTreeMap<BucketKey, BucketStats> = BTreeMap::new();
    for record in records {
        buckets
            .entry((record.cohort_month, record.activity_month))
            .or_default()
            .add_record(record);
    }

    let mut estimated = 0usize;
    let rows: Vec<CohortMetricRow> = buckets
        .into_iter()
        .map(|((cohort_month, activity_month), stats)| {
            let unique_users = stats.users.len() as u64;
            let (initial_users, initial_users_estimated) = match initial.get(&cohort_month) {
                Some(&n) if n > 0 => (n, false),
                _ => {
                    estimated += 1;
                    (1, true)
                }
            };
            CohortMetricRow {
                cohort_month,
                activity_month,
                cohort_index: months_between(activity_month, cohort_month),
                cash_request_attempt: stats.attempts,
                incident_count: stats.incidents,
                incident_rate: stats.incidents as f64 / stats.attempts as f64,
                unique_users,
                initial_users,
                initial_users_estimated,
                retention_rate: unique_users as f64 / initial_users as f64,
                revenue: stats.revenue,
            }
        })
        .collect();

    if estimated > 0 {
        warn!("{estimated} buckets had no initial user count; defaulted to 1");
    }
    debug!("Aggregated {} records into {} buckets", records.len(), rows.len());
    rows
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDateTime};

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn record(
        request_id: u64,
        user_id: u64,
        status: &str,
        cohort: NaiveDate,
        activity: NaiveDate,
        revenue: Option<f64>,
    ) -> CohortRecord {
        CohortRecord {
            request_id,
            user_id,
            status: status.to_string(),
            created_at: ts(activity.year(), activity.month(), 10),
            activity_month: activity,
            cohort_month: cohort,
            cohort_index: months_between(activity, cohort),
            revenue,
        }
    }

    fn sample() -> Vec<CohortRecord> {
        let jan = month(2020, 1);
        let feb = month(2020, 2);
        vec![
            record(1, 1, "money_back", jan, jan, Some(5.0)),
            record(2, 2, "rejected", jan, jan, None),
            record(3, 1, "money_back", jan, feb, None),
            record(4, 1, "rejected", jan, feb, Some(10.0)),
            record(5, 3, "money_back", feb, feb, None),
        ]
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    #[test]
    fn test_buckets_sorted_by_cohort_then_activity() {
        let rows = aggregate(&sample());
        let keys: Vec<BucketKey> = rows
            .iter()
            .map(|r| (r.cohort_month, r.activity_month))
            .collect();
        assert_eq!(
            keys,
            vec![
                (month(2020, 1), month(2020, 1)),
                (month(2020, 1), month(2020, 2)),
                (month(2020, 2), month(2020, 2)),
            ]
        );
    }

    #[test]
    fn test_bucket_counts() {
        let rows = aggregate(&sample());

        assert_eq!(rows[0].cash_request_attempt, 2);
        assert_eq!(rows[0].incident_count, 1);
        assert!((rows[0].incident_rate - 0.5).abs() < 1e-9);
        assert_eq!(rows[0].unique_users, 2);
        assert_eq!(rows[0].initial_users, 2);
        assert!((rows[0].retention_rate - 1.0).abs() < 1e-9);

        assert_eq!(rows[1].cohort_index, 1);
        assert_eq!(rows[1].unique_users, 1);
        assert!((rows[1].retention_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_without_incidents_has_zero_rate() {
        let jan = month(2021, 1);
        let records: Vec<CohortRecord> = (0..10)
            .map(|i| record(i, i, "money_back", jan, jan, None))
            .collect();

        let rows = aggregate(&records);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cash_request_attempt, 10);
        assert_eq!(rows[0].incident_count, 0);
        assert_eq!(rows[0].incident_rate, 0.0);
    }

    #[test]
    fn test_revenue_absent_when_no_accepted_fee() {
        let rows = aggregate(&sample());

        assert_eq!(rows[0].revenue, Some(5.0));
        assert_eq!(rows[1].revenue, Some(10.0));
        assert_eq!(rows[2].revenue, None);
    }

    #[test]
    fn test_rates_stay_in_bounds() {
        for row in aggregate(&sample()) {
            assert!(row.incident_count <= row.cash_request_attempt);
            assert!((0.0..=1.0).contains(&row.incident_rate));
            assert!((0.0..=1.0).contains(&row.retention_rate));
            assert!(!row.initial_users_estimated);
            assert!(row.activity_month >= row.cohort_month);
        }
    }

    #[test]
    fn test_attempts_sum_to_record_count() {
        let records = sample();
        let total: u64 = aggregate(&records)
            .iter()
            .map(|r| r.cash_request_attempt)
            .sum();
        assert_eq!(total, records.len() as u64);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = sample();
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    // ── aggregate_with_initial_users ──────────────────────────────────────────

    #[test]
    fn test_missing_initial_users_defaults_to_one() {
        let cohort = month(2020, 3);
        let activity = month(2020, 5);
        let records: Vec<CohortRecord> = (0..5)
            .map(|i| record(i, i, "money_back", cohort, activity, None))
            .collect();

        let rows = aggregate_with_initial_users(&records, &HashMap::new());

        assert_eq!(rows[0].unique_users, 5);
        assert_eq!(rows[0].initial_users, 1);
        assert!(rows[0].initial_users_estimated);
        assert!((rows[0].retention_rate - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_initial_users_are_used() {
        let jan = month(2020, 1);
        let records = vec![record(1, 1, "money_back", jan, jan, None)];
        let initial = HashMap::from([(jan, 4)]);

        let rows = aggregate_with_initial_users(&records, &initial);

        assert_eq!(rows[0].initial_users, 4);
        assert!((rows[0].retention_rate - 0.25).abs() < 1e-9);
    }

    // ── totals ────────────────────────────────────────────────────────────────

    #[test]
    fn test_calculate_totals() {
        let totals = calculate_totals(&aggregate(&sample()));

        assert_eq!(totals.buckets, 3);
        assert_eq!(totals.cash_request_attempt, 5);
        assert_eq!(totals.incident_count, 2);
        assert_eq!(totals.revenue, Some(15.0));
        assert!((totals.incident_rate() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_totals_empty() {
        let totals = calculate_totals(&[]);
        assert_eq!(totals.revenue, None);
        assert_eq!(totals.incident_rate(), 0.0);
    }

    #[test]
    fn test_initial_users_counts_distinct() {
        let initial = initial_users(&sample());
        assert_eq!(initial.get(&month(2020, 1)), Some(&2));
        assert_eq!(initial.get(&month(2020, 2)), Some(&1));
    }
}
