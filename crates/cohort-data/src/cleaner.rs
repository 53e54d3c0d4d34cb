//! Drops rows whose join or grouping keys are missing.

use cohort_core::models::{CashRequest, Fee};
use tracing::info;

use crate::reader::RawTables;

/// Row counts before and after cleaning one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DropCount {
    pub before: usize,
    pub after: usize,
}

impl DropCount {
    pub fn dropped(&self) -> usize {
        self.before - self.after
    }
}

/// What the cleaner removed from each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleaningReport {
    /// Requests without a `user_id`.
    pub cash: DropCount,
    /// Fees without a `cash_request_id`.
    pub fees: DropCount,
}

/// Cleaned tables: every request has a `user_id`, every fee a
/// `cash_request_id`.
#[derive(Debug, Clone, Default)]
pub struct CleanedTables {
    pub cash: Vec<CashRequest>,
    pub fees: Vec<Fee>,
    pub report: CleaningReport,
}

/// Remove requests with no `user_id` and fees with no `cash_request_id`.
/// Retained rows are passed through unchanged and in their original order.
pub fn clean(raw: &RawTables) -> CleanedTables {
    let cash: Vec<CashRequest> = raw
        .cash
        .iter()
        .filter(|r| r.user_id.is_some())
        .cloned()
        .collect();
    let fees: Vec<Fee> = raw
        .fees
        .iter()
        .filter(|f| f.cash_request_id.is_some())
        .cloned()
        .collect();

    let report = CleaningReport {
        cash: DropCount {
            before: raw.cash.len(),
            after: cash.len(),
        },
        fees: DropCount {
            before: raw.fees.len(),
            after: fees.len(),
        },
    };

    info!(
        "Cleaning dropped {} requests without user_id and {} fees without cash_request_id",
        report.cash.dropped(),
        report.fees.dropped()
    );

    CleanedTables { cash, fees, report }
}
