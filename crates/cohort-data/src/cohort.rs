//! Cohort placement of each cleaned cash request.
//!
//! A user's cohort is the month of their first request; every request then
//! gets a cohort index counting whole calendar months since that start.

use std::collections::HashMap;

use chrono::NaiveDate;
use cohort_core::models::{CashRequest, CohortRecord, RequestRevenue};
use cohort_core::months::{activity_month, months_between};
use tracing::debug;

use crate::revenue::revenue_lookup;

/// Earliest activity month per user.
pub fn cohort_months(requests: &[CashRequest]) -> HashMap<u64, NaiveDate> {
    let mut firsts: HashMap<u64, NaiveDate> = HashMap::new();
    for request in requests {
        let Some(user_id) = request.user_id else {
            continue;
        };
        let month = activity_month(&request.created_at);
        firsts
            .entry(user_id)
            .and_modify(|first| {
                if month < *first {
                    *first = month;
                }
            })
            .or_insert(month);
    }
    firsts
}

/// Derive activity month, cohort month and cohort index for every request,
/// and attach its accepted-fee revenue (absent when none matched).
///
/// Requests without a `user_id` cannot be placed in a cohort and are skipped;
/// the cleaner removes them beforehand. Input order is preserved.
pub fn derive_cohorts(requests: &[CashRequest], revenue: &[RequestRevenue]) -> Vec<CohortRecord> {
    let firsts = cohort_months(requests);
    let revenue = revenue_lookup(revenue);

    let records: Vec<CohortRecord> = requests
        .iter()
        .filter_map(|request| {
            let user_id = request.user_id?;
            let cohort_month = *firsts.get(&user_id)?;
            let activity_month = activity_month(&request.created_at);
            Some(CohortRecord {
                request_id: request.id,
                user_id,
                status: request.status.clone(),
                created_at: request.created_at,
                activity_month,
                cohort_month,
                cohort_index: months_between(activity_month, cohort_month),
                revenue: revenue.get(&request.id).copied(),
            })
        })
        .collect();

    debug!(
        "Derived {} cohort records for {} users",
        records.len(),
        firsts.len()
    );
    records
}
