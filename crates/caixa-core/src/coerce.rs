//! Cell coercion.
//!
//! Worksheet cells are plain text. These functions turn them into amounts and
//! dates. Blank cells coerce to the default (zero, or no date) without an
//! error; anything else that fails to parse is reported as a
//! [`CoercionError`] so callers can decide whether to warn.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;

/// What a cell was expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// A decimal amount
    Amount,
    /// A calendar date
    Date,
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Amount => f.write_str("amount"),
            Expected::Date => f.write_str("date"),
        }
    }
}

/// A non-blank cell that does not parse as the expected type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {expected}")]
pub struct CoercionError {
    /// Expected type
    pub expected: Expected,
    /// Raw cell text
    pub value: String,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses an amount cell. Blank cells are zero.
pub fn parse_amount(cell: &str) -> Result<Decimal, CoercionError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| CoercionError {
            expected: Expected::Amount,
            value: cell.to_string(),
        })
}

/// Parses an amount cell, treating anything unparseable as zero.
pub fn amount_or_zero(cell: &str) -> Decimal {
    parse_amount(cell).unwrap_or(Decimal::ZERO)
}

/// Parses a date cell. Blank cells have no date.
///
/// Accepts ISO dates (what this crate writes), slash-separated dates in
/// year-first or month-first order, and timestamps whose time part is
/// dropped.
pub fn parse_date(cell: &str) -> Result<Option<NaiveDate>, CoercionError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(Some(date));
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Some(datetime.date()));
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(datetime.date_naive()));
    }

    Err(CoercionError {
        expected: Expected::Date,
        value: cell.to_string(),
    })
}

/// Parses a date cell, treating anything unparseable as no date.
pub fn date_or_none(cell: &str) -> Option<NaiveDate> {
    parse_date(cell).ok().flatten()
}

/// Formats an amount the way it is written to a cell.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Formats an amount for display, e.g. `R$ 12.50`.
pub fn format_currency(amount: Decimal) -> String {
    format!("R$ {}", format_amount(amount))
}
