//! Field normalization for identity keys
//!
//! Every function returns `None` for blank or placeholder input so callers
//! can tell "missing" apart from a real value.

use crate::core::matching::normalize::normalize_name;
use chrono::{DateTime, NaiveDate};

/// Values that mean "not filled in"
const PLACEHOLDERS: &[&str] = &["", "n/a", "na", "none", "null", "unknown", "-", "?", "tbd"];

/// Date layouts accepted on input, tried in order
///
/// Two-digit years come first: `%Y` would read `25` as year 25.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// True for empty strings and the usual "no value" markers, ignoring case
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    PLACEHOLDERS.contains(&value.as_str())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !is_placeholder(v))
}

/// `"$1,234.5"` becomes `"1234.50"`; unparseable amounts give `None`
///
/// Digits are handled as text so amounts of any size keep every digit.
/// A third decimal of 5 or more rounds the cents up.
pub fn normalize_amount(value: Option<&str>) -> Option<String> {
    let cleaned: String = present(value)?
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',') && !c.is_whitespace())
        .collect();
    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }

    let mut cents: Vec<u8> = whole
        .bytes()
        .chain(fraction.bytes().chain(std::iter::repeat(b'0')).take(2))
        .map(|b| b - b'0')
        .collect();
    if fraction.as_bytes().get(2).is_some_and(|d| *d >= b'5') {
        round_up(&mut cents);
    }

    let leading_zeros = cents
        .iter()
        .take(cents.len().saturating_sub(3))
        .take_while(|d| **d == 0)
        .count();
    cents.drain(..leading_zeros);
    while cents.len() < 3 {
        cents.insert(0, 0);
    }

    let sign = if negative && cents.iter().any(|d| *d != 0) { "-" } else { "" };
    let (units, hundredths) = cents.split_at(cents.len() - 2);
    Some(format!("{sign}{}.{}", render_digits(units), render_digits(hundredths)))
}

/// Adds one to a most-significant-first digit string, growing it on overflow
fn round_up(digits: &mut Vec<u8>) {
    for digit in digits.iter_mut().rev() {
        if *digit == 9 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
    digits.insert(0, 1);
}

fn render_digits(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Strips whitespace, a leading `#` and leading zeros; all zeros give `"0"`
pub fn normalize_check_number(value: Option<&str>) -> Option<String> {
    let compact: String = present(value)?
        .trim_start_matches('#')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }
    let stripped = compact.trim_start_matches('0');
    Some(if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    })
}

/// Lowercase, punctuation removed, whitespace collapsed
pub fn normalize_donor(value: Option<&str>) -> Option<String> {
    let normalized = normalize_name(present(value)?);
    (!normalized.is_empty()).then_some(normalized)
}

/// ISO `YYYY-MM-DD` when the date parses, otherwise the trimmed original
pub fn normalize_date(value: Option<&str>) -> Option<String> {
    let value = present(value)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive().format("%Y-%m-%d").to_string());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .or_else(|| Some(value.to_string()))
}
