//! Parsing of submitted values.
//!
//! Forms and JSON bodies share these rules: amounts are non-negative
//! decimals up to [`MAX_AMOUNT`] and dates are `YYYY-MM-DD`. Failures are
//! [`Error::BadRequest`] with a message fit to show on the page.

use caixa_core::{ClientName, CounterpartyKind};
use caixa_core::coerce::parse_amount;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{Error, Result};

/// Warning for an empty client name.
pub const EMPTY_NAME_WARNING: &str = "Por favor, preencha o campo antes de continuar.";

/// Largest amount a form or JSON body may submit.
// 1_000_000_000_000 (scale 0); `Decimal::new` is not const.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Client name exactly as typed; only the empty string is rejected.
pub fn client_name(text: &str) -> Result<ClientName> {
    ClientName::new(text).map_err(|_| Error::bad_request(EMPTY_NAME_WARNING))
}

/// Counterparty kind for a new row: `Cliente` or `Fornecedor`.
pub fn counterparty_kind(text: &str) -> Result<CounterpartyKind> {
    match CounterpartyKind::from(text.trim().to_string()) {
        CounterpartyKind::Other(other) => Err(Error::bad_request(format!(
            "Tipo: '{other}' não é válido; use Cliente ou Fornecedor."
        ))),
        kind => Ok(kind),
    }
}

/// A required non-negative amount.
pub fn amount(label: &str, text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::bad_request(format!("{label}: informe um valor.")));
    }
    let value = parse_amount(trimmed).map_err(|_| {
        Error::bad_request(format!("{label}: '{trimmed}' não é um número válido."))
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::bad_request(format!(
            "{label}: o valor não pode ser negativo."
        )));
    }
    if value > MAX_AMOUNT {
        return Err(Error::bad_request(format!(
            "{label}: o valor não pode passar de {MAX_AMOUNT}."
        )));
    }
    Ok(value)
}

/// A required ISO date.
pub fn date(label: &str, text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| Error::bad_request(format!("{label}: use o formato AAAA-MM-DD.")))
}

/// An optional ISO date; blank means none.
pub fn optional_date(label: &str, text: Option<&str>) -> Result<Option<NaiveDate>> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => date(label, text).map(Some),
    }
}

/// JSON amount given either as a number or as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    /// `12.5`
    Number(serde_json::Number),
    /// `"12.50"`
    Text(String),
}

impl AmountField {
    /// Parses with the same rules as [`amount`].
    pub fn parse(&self, label: &str) -> Result<Decimal> {
        match self {
            AmountField::Number(number) => amount(label, &number.to_string()),
            AmountField::Text(text) => amount(label, text),
        }
    }
}
