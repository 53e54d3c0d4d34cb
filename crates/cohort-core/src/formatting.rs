/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use cohort_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by half an ULP at the target precision so exact midpoints
    // round away from zero.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` is "0.xx"; keep ".xx".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format an integer count with thousands separators.
///
/// ```
/// use cohort_core::formatting::format_count;
///
/// assert_eq!(format_count(23_970), "23,970");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a fee amount with two decimals and thousands separators.
///
/// ```
/// use cohort_core::formatting::format_amount;
///
/// assert_eq!(format_amount(1234.5), "1,234.50");
/// ```
pub fn format_amount(amount: f64) -> String {
    format_number(amount, 2)
}

/// Format an optional amount, rendering an absent value as `"-"`.
pub fn format_optional_amount(amount: Option<f64>) -> String {
    amount.map_or_else(|| "-".to_string(), format_amount)
}

/// Format a ratio (`0.25`) as a percentage string (`"25.0%"`).
///
/// Ratios above 1 are shown as-is (`"500.0%"`); they are not clamped.
///
/// ```
/// use cohort_core::formatting::format_ratio;
///
/// assert_eq!(format_ratio(0.25), "25.0%");
/// assert_eq!(format_ratio(5.0), "500.0%");
/// ```
pub fn format_ratio(ratio: f64) -> String {
    format!("{}%", format_number(ratio * 100.0, 1))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
