//! End-to-end cohort pipeline.
//!
//! Loads the two CSV exports, cleans them, derives cohort records with their
//! revenue, aggregates per-bucket metrics and profiles the dataset, returning
//! an [`AnalysisResult`] ready for the presentation layer.

use std::time::Instant;

use chrono::Utc;
use cohort_core::models::{CohortMetricRow, CohortRecord, RequestRevenue};
use cohort_core::Result;
use tracing::info;

use crate::cleaner::{clean, CleanedTables};
use crate::cohort::derive_cohorts;
use crate::metrics::aggregate;
use crate::profile::{profile_dataset, DatasetProfile};
use crate::reader::{load_dataset, DatasetPaths, RawTables};
use crate::revenue::revenue_by_request;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub requests_loaded: usize,
    pub fees_loaded: usize,
    /// Cohort records after cleaning.
    pub records: usize,
    /// Metric buckets produced.
    pub buckets: usize,
    /// Wall-clock seconds spent reading the CSV files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent cleaning, deriving and aggregating.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Tables as loaded, before cleaning.
    pub raw: RawTables,
    pub cleaned: CleanedTables,
    pub revenue: Vec<RequestRevenue>,
    pub records: Vec<CohortRecord>,
    /// One row per (cohort month, activity month), unfiltered.
    pub metrics: Vec<CohortMetricRow>,
    pub profile: DatasetProfile,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load both files from `paths` and run [`analyze`] over them.
pub fn analyze_paths(paths: &DatasetPaths) -> Result<AnalysisResult> {
    let load_start = Instant::now();
    let raw = load_dataset(paths)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut result = analyze(raw);
    result.metadata.load_time_seconds = load_time;
    Ok(result)
}

/// Run the pipeline over already-loaded tables.
///
/// 1. Drop rows missing their join or grouping key.
/// 2. Sum accepted fees per request.
/// 3. Derive cohort month and index per request, attaching revenue.
/// 4. Aggregate per-bucket metrics.
/// 5. Profile the raw tables and the cohort records.
pub fn analyze(raw: RawTables) -> AnalysisResult {
    let transform_start = Instant::now();

    // ── Step 1: Clean ─────────────────────────────────────────────────────────
    let cleaned = clean(&raw);

    // ── Step 2: Revenue ───────────────────────────────────────────────────────
    let revenue = revenue_by_request(&cleaned.fees);

    // ── Step 3: Cohorts ───────────────────────────────────────────────────────
    let records = derive_cohorts(&cleaned.cash, &revenue);

    // ── Step 4: Metrics ───────────────────────────────────────────────────────
    let metrics = aggregate(&records);

    // ── Step 5: Profile ───────────────────────────────────────────────────────
    let profile = profile_dataset(&raw, &cleaned, &records);

    let transform_time = transform_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        requests_loaded: raw.cash.len(),
        fees_loaded: raw.fees.len(),
        records: records.len(),
        buckets: metrics.len(),
        load_time_seconds: 0.0,
        transform_time_seconds: transform_time,
    };

    info!(
        "Analysis complete: {} requests, {} fees, {} records, {} buckets",
        metadata.requests_loaded, metadata.fees_loaded, metadata.records, metadata.buckets
    );

    AnalysisResult {
        raw,
        cleaned,
        revenue,
        records,
        metrics,
        profile,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cohort_core::models::{CashRequest, Fee};

    fn request(id: u64, user_id: Option<u64>, y: i32, m: u32, status: &str) -> CashRequest {
        CashRequest {
            id,
            amount: Some(100.0),
            status: status.to_string(),
            created_at: NaiveDate::from_ymd_opt(y, m, 12)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            user_id,
            deleted_account_id: None,
            transfer_type: None,
        }
    }

    fn fee(id: u64, cash_request_id: Option<u64>, status: &str, amount: f64) -> Fee {
        Fee {
            id,
            cash_request_id,
            fee_type: "instant_payment".to_string(),
            status: status.to_string(),
            category: None,
            total_amount: amount,
        }
    }

    fn raw() -> RawTables {
        RawTables {
            cash: vec![
                request(1, Some(1), 2020, 1, "money_back"),
                request(2, Some(1), 2020, 2, "rejected"),
                request(3, Some(2), 2020, 2, "money_back"),
                request(4, None, 2020, 2, "money_back"),
            ],
            fees: vec![
                fee(1, Some(1), "accepted", 5.0),
                fee(2, Some(3), "cancelled", 5.0),
                fee(3, None, "accepted", 5.0),
            ],
        }
    }

    #[test]
    fn test_analyze_runs_every_stage() {
        let result = analyze(raw());

        assert_eq!(result.cleaned.report.cash.dropped(), 1);
        assert_eq!(result.cleaned.report.fees.dropped(), 1);
        assert_eq!(result.revenue.len(), 1);
        assert_eq!(result.records.len(), 3);
        assert_eq!(result.metrics.len(), 3);
        assert_eq!(result.metadata.records, 3);
        assert_eq!(result.metadata.buckets, 3);
        assert_eq!(result.profile.cash.rows, 4);
    }

    #[test]
    fn test_attempts_sum_to_cleaned_requests() {
        let result = analyze(raw());
        let total: u64 = result.metrics.iter().map(|m| m.cash_request_attempt).sum();
        assert_eq!(total, result.cleaned.cash.len() as u64);
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let first = analyze(raw());
        let second = analyze(raw());
        assert_eq!(first.records, second.records);
        assert_eq!(first.metrics, second.metrics);
        assert_eq!(first.profile, second.profile);
    }

    #[test]
    fn test_analyze_empty_tables() {
        let result = analyze(RawTables::default());
        assert!(result.records.is_empty());
        assert!(result.metrics.is_empty());
        assert_eq!(result.profile.most_active_user, None);
    }
}
