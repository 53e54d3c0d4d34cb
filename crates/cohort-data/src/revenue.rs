//! Accepted-fee revenue per cash request.

use std::collections::{BTreeMap, HashMap};

use cohort_core::models::{Fee, RequestRevenue};

/// Sum `total_amount` over accepted fees, grouped by `cash_request_id`.
///
/// Fees without a `cash_request_id` are ignored. Output is sorted by request
/// id; requests with no accepted fee do not appear.
pub fn revenue_by_request(fees: &[Fee]) -> Vec<RequestRevenue> {
    let mut sums: BTreeMap<u64, f64> = BTreeMap::new();

    for fee in fees.iter().filter(|f| f.is_revenue()) {
        if let Some(request_id) = fee.cash_request_id {
            *sums.entry(request_id).or_insert(0.0) += fee.total_amount;
        }
    }

    sums.into_iter()
        .map(|(cash_request_id, total_amount)| RequestRevenue {
            cash_request_id,
            total_amount,
        })
        .collect()
}

/// Index revenue rows by request id for the left join onto requests.
pub fn revenue_lookup(revenue: &[RequestRevenue]) -> HashMap<u64, f64> {
    revenue
        .iter()
        .map(|r| (r.cash_request_id, r.total_amount))
        .collect()
}
