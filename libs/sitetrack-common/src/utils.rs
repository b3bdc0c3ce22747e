//! Formatting and parsing helpers

use crate::constants::DATE_FORMATS;
use chrono::{DateTime, NaiveDate, Utc};

/// Format a date for display
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format an optional timestamp as a date, or "N/A"
#[must_use]
pub fn format_optional_date(dt: Option<&DateTime<Utc>>) -> String {
    dt.map_or_else(
        || crate::constants::NOT_AVAILABLE.to_string(),
        |dt| format_date(&dt.date_naive()),
    )
}

/// Parse a plain date in any of [`DATE_FORMATS`]
///
/// # Errors
/// Returns `chrono::ParseError` from the last attempted format if none match
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    let mut last_err = None;
    for fmt in DATE_FORMATS {
        match NaiveDate::parse_from_str(date_str, fmt) {
            Ok(date) => return Ok(date),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(e) => Err(e),
        None => NaiveDate::parse_from_str(date_str, "%Y-%m-%d"),
    }
}

/// Format a monetary amount with thousands separators and two decimals
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}.{fraction:02}")
    } else {
        format!("${grouped}.{fraction:02}")
    }
}

/// Parse a boolean flag from an environment-style string
///
/// Accepts `true/1/yes/on` and `false/0/no/off`, case-insensitively.
#[must_use]
pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Truncate a string to a maximum length
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
