//! Parsing of locale-ambiguous money text, plus date normalization.
//!
//! The backing sheets are hand-edited by people in different locales, so the
//! same amount shows up as `1.234,56`, `1,234.56`, `43,00` or plain `43.00`.
//! The most specific encoding is tried first; guessing the wrong decimal
//! separator would silently corrupt financial totals.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// European grouped format, e.g. `1.234,56`.
static EUROPEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(\.\d{3})*(,\d{1,2})?$").unwrap());

/// Anglo grouped format, e.g. `1,234.56`.
static ANGLO: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}(,\d{3})*(\.\d{1,2})?$").unwrap());

/// Bare comma-decimal, e.g. `1234,56`.
static COMMA_DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(,\d{1,2})$").unwrap());

/// Parses money text into a decimal amount, or `None` if no known encoding
/// matches.
///
/// Currency symbols and whitespace are stripped first, then the encodings
/// are tried in order: European grouped, Anglo grouped, bare comma-decimal,
/// plain numeric.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    if EUROPEAN.is_match(&cleaned) {
        let normalized = cleaned.replace('.', "").replace(',', ".");
        return Decimal::from_str(&normalized).ok();
    }

    if ANGLO.is_match(&cleaned) {
        return Decimal::from_str(&cleaned.replace(',', "")).ok();
    }

    if COMMA_DECIMAL.is_match(&cleaned) {
        return Decimal::from_str(&cleaned.replace(',', ".")).ok();
    }

    Decimal::from_str(&cleaned).ok()
}

/// Rounds to two decimal places, half away from zero.
///
/// Applied at the point a derived value is produced, never at intermediate
/// steps, so rounding error does not compound across a year of months.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rewrites a `YYYY-MM-DD` date into the sheet's canonical `DD/MM/YYYY`.
/// Any other textual form is passed through unchanged; the sheet is the
/// source of truth for display format.
pub fn normalize_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%d/%m/%Y").to_string(),
        Err(_) => date.trim().to_string(),
    }
}
