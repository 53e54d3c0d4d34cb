//! Calendar-month arithmetic on first-of-month [`NaiveDate`] values.
//!
//! Months are compared through a linear ordinal (`year * 12 + month0`) so
//! differences stay correct across year boundaries.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{CohortError, Result};

/// Truncate `date` to the first day of its month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month.
    date.with_day(1).unwrap_or(date)
}

/// Truncate a timestamp to the first day of its month.
pub fn activity_month(ts: &NaiveDateTime) -> NaiveDate {
    month_start(ts.date())
}

/// Linear month count: `year * 12 + (month - 1)`.
pub fn month_ordinal(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Whole calendar months from `earlier` to `later` (negative when `later`
/// precedes `earlier`). Day components are ignored.
///
/// ```
/// use chrono::NaiveDate;
/// use cohort_core::months::months_between;
///
/// let jan_2023 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
/// let feb_2024 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
/// assert_eq!(months_between(feb_2024, jan_2023), 13);
/// ```
pub fn months_between(later: NaiveDate, earlier: NaiveDate) -> i32 {
    month_ordinal(later) - month_ordinal(earlier)
}

/// Move a first-of-month date by `delta` months.
pub fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let ordinal = month_ordinal(date) + delta;
    let year = ordinal.div_euclid(12);
    let month = ordinal.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Render a month as `YYYY-MM`.
pub fn format_month(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse `YYYY-MM` or `YYYY-MM-DD` into the first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(month_start(date));
    }
    NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
        .map_err(|_| CohortError::InvalidFilter(format!("not a month: {trimmed}")))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CohortError::InvalidFilter(format!("not a date: {}", s.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_start_truncates_day() {
        assert_eq!(month_start(ymd(2020, 6, 17)), ymd(2020, 6, 1));
        assert_eq!(month_start(ymd(2020, 6, 1)), ymd(2020, 6, 1));
    }

    #[test]
    fn test_activity_month_from_timestamp() {
        let ts = ymd(2019, 12, 31).and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(activity_month(&ts), ymd(2019, 12, 1));
    }

    #[test]
    fn test_months_between_same_month_is_zero() {
        assert_eq!(months_between(ymd(2020, 3, 1), ymd(2020, 3, 1)), 0);
    }

    #[test]
    fn test_months_between_crosses_year_boundary() {
        assert_eq!(months_between(ymd(2024, 2, 1), ymd(2023, 1, 1)), 13);
        assert_eq!(months_between(ymd(2020, 1, 1), ymd(2019, 12, 1)), 1);
    }

    #[test]
    fn test_months_between_negative() {
        assert_eq!(months_between(ymd(2019, 11, 1), ymd(2020, 1, 1)), -2);
    }

    #[test]
    fn test_shift_months_forward_and_back() {
        assert_eq!(shift_months(ymd(2019, 12, 1), 1), ymd(2020, 1, 1));
        assert_eq!(shift_months(ymd(2020, 1, 1), -1), ymd(2019, 12, 1));
        assert_eq!(shift_months(ymd(2020, 5, 1), 0), ymd(2020, 5, 1));
        assert_eq!(shift_months(ymd(2020, 5, 1), 25), ymd(2022, 6, 1));
    }

    #[test]
    fn test_format_month() {
        assert_eq!(format_month(ymd(2020, 7, 1)), "2020-07");
    }

    #[test]
    fn test_parse_month_accepts_both_forms() {
        assert_eq!(parse_month("2020-07").unwrap(), ymd(2020, 7, 1));
        assert_eq!(parse_month("2020-07-15").unwrap(), ymd(2020, 7, 1));
        assert_eq!(parse_month(" 2020-07 ").unwrap(), ymd(2020, 7, 1));
    }

    #[test]
    fn test_parse_month_rejects_garbage() {
        assert!(parse_month("2020-13").is_err());
        assert!(parse_month("july").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2020-10-31").unwrap(), ymd(2020, 10, 31));
        assert!(parse_date("2020-10").is_err());
    }
}
