use chrono::{NaiveDate, NaiveDateTime};
use tracing::warn;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses the timestamp text found in request and fee exports.
///
/// The calendar fields are taken as written: a trailing UTC offset (`+00`,
/// `+01:00`, `Z`) is stripped, not applied, so the month a request lands in
/// is the month printed in the file.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse `s` into a [`NaiveDateTime`], or `None` when no format matches.
    pub fn parse_str(s: &str) -> Option<NaiveDateTime> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }

        let local = Self::strip_offset(trimmed);

        const FORMATS: &[&str] = &[
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
        ];

        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(local, fmt) {
                return Some(naive);
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(local, "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }

        warn!(
            "TimestampProcessor: could not parse timestamp string \"{}\"",
            s
        );
        None
    }

    /// Drop a trailing `Z` or `±HH[[:]MM]` offset that follows the time part.
    fn strip_offset(s: &str) -> &str {
        if let Some(stripped) = s.strip_suffix('Z') {
            return stripped;
        }
        // The date part itself contains '-', so only look past it.
        match s.get(10..).and_then(|tail| tail.rfind(['+', '-'])) {
            Some(pos) => &s[..10 + pos],
            None => s,
        }
    }
}

// ── FieldParser ───────────────────────────────────────────────────────────────

/// Converts raw CSV cells into typed values.
///
/// Identifier columns that contain nulls are exported as floats (`3377.0`),
/// so integral floats are accepted wherever an identifier is expected.
pub struct FieldParser;

impl FieldParser {
    /// `None` for empty / `NaN` / `null` cells, otherwise the trimmed text.
    pub fn non_null(raw: &str) -> Option<&str> {
        let trimmed = raw.trim();
        match trimmed {
            "" => None,
            t if t.eq_ignore_ascii_case("nan")
                || t.eq_ignore_ascii_case("null")
                || t.eq_ignore_ascii_case("none") =>
            {
                None
            }
            t => Some(t),
        }
    }

    /// Parse an identifier, accepting `42` and `42.0`.
    pub fn parse_id(raw: &str) -> Option<u64> {
        let cell = Self::non_null(raw)?;
        if let Ok(id) = cell.parse::<u64>() {
            return Some(id);
        }
        let f = cell.parse::<f64>().ok()?;
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
            Some(f as u64)
        } else {
            None
        }
    }

    /// Parse a decimal amount.
    pub fn parse_amount(raw: &str) -> Option<f64> {
        Self::non_null(raw)?.parse::<f64>().ok()
    }

    /// Owned text for optional categorical columns.
    pub fn parse_text(raw: &str) -> Option<String> {
        Self::non_null(raw).map(str::to_string)
    }
}
