//! Typed records flowing through the cohort pipeline.
//!
//! Raw rows ([`CashRequest`], [`Fee`]) come from the loader, [`CohortRecord`]
//! is one cleaned request enriched with its cohort fields, and
//! [`CohortMetricRow`] is one (cohort month, activity month) bucket of the
//! final analysis table.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Request status that marks a payment incident.
pub const INCIDENT_STATUS: &str = "rejected";

/// Fee status whose amounts count as revenue.
pub const REVENUE_FEE_STATUS: &str = "accepted";

// ── Column metadata ───────────────────────────────────────────────────────────

/// Storage kind of a column, used by the profiler's `info` view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
    Date,
    DateTime,
}

impl ColumnKind {
    /// Numeric columns take part in `describe`.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
            ColumnKind::DateTime => "datetime",
        };
        f.write_str(name)
    }
}

/// Name and kind of one column of a [`Tabular`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

/// One cell of a [`Tabular`] record.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue<'a> {
    Null,
    Int(u64),
    Signed(i32),
    Float(f64),
    Text(&'a str),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, `None` for nulls and non-numeric cells.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Signed(v) => Some(f64::from(*v)),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => f.write_str("NaN"),
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Signed(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Column-addressable view over a record type, so the profiler and the
/// presenters can treat every table uniformly.
pub trait Tabular {
    /// Columns in display order.
    fn columns() -> &'static [ColumnSpec];

    /// Value of the column at `index` in [`Tabular::columns`].
    fn cell(&self, index: usize) -> CellValue<'_>;
}

// ── CashRequest ───────────────────────────────────────────────────────────────

/// One cash-advance request as loaded from the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashRequest {
    pub id: u64,
    pub amount: Option<f64>,
    pub status: String,
    pub created_at: NaiveDateTime,
    /// Absent for requests whose account was deleted.
    pub user_id: Option<u64>,
    pub deleted_account_id: Option<u64>,
    pub transfer_type: Option<String>,
}

static CASH_REQUEST_COLUMNS: [ColumnSpec; 7] = [
    col("id", ColumnKind::Integer),
    col("amount", ColumnKind::Float),
    col("status", ColumnKind::Text),
    col("created_at", ColumnKind::DateTime),
    col("user_id", ColumnKind::Float),
    col("deleted_account_id", ColumnKind::Float),
    col("transfer_type", ColumnKind::Text),
];

impl Tabular for CashRequest {
    fn columns() -> &'static [ColumnSpec] {
        &CASH_REQUEST_COLUMNS
    }

    fn cell(&self, index: usize) -> CellValue<'_> {
        match index {
            0 => CellValue::Int(self.id),
            1 => self.amount.map_or(CellValue::Null, CellValue::Float),
            2 => CellValue::Text(&self.status),
            3 => CellValue::DateTime(self.created_at),
            4 => self.user_id.map_or(CellValue::Null, CellValue::Int),
            5 => self.deleted_account_id.map_or(CellValue::Null, CellValue::Int),
            6 => self
                .transfer_type
                .as_deref()
                .map_or(CellValue::Null, CellValue::Text),
            _ => CellValue::Null,
        }
    }
}

// ── Fee ───────────────────────────────────────────────────────────────────────

/// One fee charged against a cash request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub id: u64,
    /// Absent for a handful of orphaned fee rows.
    pub cash_request_id: Option<u64>,
    pub fee_type: String,
    pub status: String,
    pub category: Option<String>,
    pub total_amount: f64,
}

impl Fee {
    /// Whether this fee's amount counts towards revenue.
    pub fn is_revenue(&self) -> bool {
        self.status == REVENUE_FEE_STATUS
    }
}

static FEE_COLUMNS: [ColumnSpec; 6] = [
    col("id", ColumnKind::Integer),
    col("cash_request_id", ColumnKind::Float),
    col("type", ColumnKind::Text),
    col("status", ColumnKind::Text),
    col("category", ColumnKind::Text),
    col("total_amount", ColumnKind::Float),
];

impl Tabular for Fee {
    fn columns() -> &'static [ColumnSpec] {
        &FEE_COLUMNS
    }

    fn cell(&self, index: usize) -> CellValue<'_> {
        match index {
            0 => CellValue::Int(self.id),
            1 => self.cash_request_id.map_or(CellValue::Null, CellValue::Int),
            2 => CellValue::Text(&self.fee_type),
            3 => CellValue::Text(&self.status),
            4 => self
                .category
                .as_deref()
                .map_or(CellValue::Null, CellValue::Text),
            5 => CellValue::Float(self.total_amount),
            _ => CellValue::Null,
        }
    }
}

// ── RequestRevenue ────────────────────────────────────────────────────────────

/// Accepted-fee revenue collected on one cash request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestRevenue {
    pub cash_request_id: u64,
    pub total_amount: f64,
}

// ── CohortRecord ──────────────────────────────────────────────────────────────

/// A cleaned cash request with its cohort placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub request_id: u64,
    pub user_id: u64,
    pub status: String,
    pub created_at: NaiveDateTime,
    /// First day of the month of `created_at`.
    pub activity_month: NaiveDate,
    /// The user's earliest `activity_month`.
    pub cohort_month: NaiveDate,
    /// Whole months from `cohort_month` to `activity_month`; never negative.
    pub cohort_index: i32,
    /// Accepted-fee revenue for this request, absent when none matched.
    pub revenue: Option<f64>,
}

impl CohortRecord {
    pub fn is_incident(&self) -> bool {
        self.status == INCIDENT_STATUS
    }
}

static COHORT_RECORD_COLUMNS: [ColumnSpec; 8] = [
    col("id", ColumnKind::Integer),
    col("created_at", ColumnKind::DateTime),
    col("user_id", ColumnKind::Integer),
    col("status", ColumnKind::Text),
    col("activity_month", ColumnKind::Date),
    col("cohort_month", ColumnKind::Date),
    col("cohort_index", ColumnKind::Integer),
    col("total_amount", ColumnKind::Float),
];

impl Tabular for CohortRecord {
    fn columns() -> &'static [ColumnSpec] {
        &COHORT_RECORD_COLUMNS
    }

    fn cell(&self, index: usize) -> CellValue<'_> {
        match index {
            0 => CellValue::Int(self.request_id),
            1 => CellValue::DateTime(self.created_at),
            2 => CellValue::Int(self.user_id),
            3 => CellValue::Text(&self.status),
            4 => CellValue::Date(self.activity_month),
            5 => CellValue::Date(self.cohort_month),
            6 => CellValue::Signed(self.cohort_index),
            7 => self.revenue.map_or(CellValue::Null, CellValue::Float),
            _ => CellValue::Null,
        }
    }
}

// ── CohortMetricRow ───────────────────────────────────────────────────────────

/// Metrics for one (cohort month, activity month) bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMetricRow {
    pub cohort_month: NaiveDate,
    pub activity_month: NaiveDate,
    pub cohort_index: i32,
    pub cash_request_attempt: u64,
    pub incident_count: u64,
    pub incident_rate: f64,
    pub unique_users: u64,
    pub initial_users: u64,
    /// `true` when `initial_users` had no match and fell back to 1, in which
    /// case `retention_rate` may exceed 1.
    pub initial_users_estimated: bool,
    pub retention_rate: f64,
    pub revenue: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CashRequest {
        CashRequest {
            id: 5,
            amount: Some(100.0),
            status: "rejected".to_string(),
            created_at: NaiveDate::from_ymd_opt(2020, 1, 2)
                .unwrap()
                .and_hms_opt(3, 4, 5)
                .unwrap(),
            user_id: None,
            deleted_account_id: Some(12),
            transfer_type: Some("instant".to_string()),
        }
    }

    #[test]
    fn test_cash_request_cells_follow_columns() {
        let r = request();
        assert_eq!(CashRequest::columns().len(), 7);
        assert_eq!(r.cell(0), CellValue::Int(5));
        assert!(r.cell(4).is_null());
        assert_eq!(r.cell(5).as_f64(), Some(12.0));
        assert_eq!(r.cell(6), CellValue::Text("instant"));
        assert!(r.cell(99).is_null());
    }

    #[test]
    fn test_fee_is_revenue() {
        let mut fee = Fee {
            id: 1,
            cash_request_id: Some(5),
            fee_type: "instant_payment".to_string(),
            status: "accepted".to_string(),
            category: None,
            total_amount: 5.0,
        };
        assert!(fee.is_revenue());
        fee.status = "cancelled".to_string();
        assert!(!fee.is_revenue());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Null.to_string(), "NaN");
        assert_eq!(CellValue::Float(5.0).to_string(), "5.00");
        let d = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        assert_eq!(CellValue::Date(d).to_string(), "2020-06-01");
    }

    #[test]
    fn test_column_kind_numeric() {
        assert!(ColumnKind::Integer.is_numeric());
        assert!(ColumnKind::Float.is_numeric());
        assert!(!ColumnKind::Text.is_numeric());
        assert!(!ColumnKind::DateTime.is_numeric());
    }

    #[test]
    fn test_metric_row_serializes_months_as_dates() {
        let d = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let row = CohortMetricRow {
            cohort_month: d,
            activity_month: d,
            cohort_index: 0,
            cash_request_attempt: 1,
            incident_count: 0,
            incident_rate: 0.0,
            unique_users: 1,
            initial_users: 1,
            initial_users_estimated: false,
            retention_rate: 1.0,
            revenue: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["cohort_month"], "2020-06-01");
        assert!(json["revenue"].is_null());
    }
}
