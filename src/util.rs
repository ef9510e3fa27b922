// Parsing, rounding and formatting helpers.
//
// Timestamp handling lives here so the loader can treat every date column
// the same way and the reporter gets consistent number formatting.
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_format::{Locale, ToFormattedString};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an order timestamp cell.
///
/// - `None` and blank cells are a missing value, not an error.
/// - Full `YYYY-MM-DD HH:MM:SS` values are taken as-is.
/// - Bare `YYYY-MM-DD` dates are read as midnight.
/// - Anything else is returned as the parse error of the full format.
pub fn parse_timestamp(s: Option<&str>) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    let s = match s.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(None),
    };
    match NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        Ok(ts) => Ok(Some(ts)),
        Err(full_err) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(|d| Some(d.and_time(NaiveTime::default())))
            .map_err(|_| full_err),
    }
}

/// Whole days from `start` to `end`, floored (a negative partial day counts as -1).
pub fn days_floor(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds().div_euclid(86_400)
}

pub fn mean(v: &[f64]) -> f64 {
    // Empty input yields 0 rather than NaN.
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Round to two decimals, ties to even on the scaled value.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// `part` out of `total` as a percentage rounded to two decimals; 0 when `total` is 0.
pub fn pct_of(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}

/// Fixed decimals with `en` thousands separators, e.g. `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = int_part
        .parse::<u64>()
        .map(|v| v.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| int_part.to_string());
    let sign = if n.is_sign_negative() && n != 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn format_currency(n: f64) -> String {
    format!("${}", format_number(n, 2))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
