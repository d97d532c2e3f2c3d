//! Typed records for the four worksheets.
//!
//! Each record knows how to render itself as `(column, cell)` pairs and how to
//! read itself back from a [`Row`], coercing cells with defaults: missing or
//! unparseable amounts become zero, missing or unparseable dates become
//! `None`, missing text becomes the empty string.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coerce::{amount_or_zero, date_or_none, format_amount};
use crate::sheet::columns::*;
use crate::table::Row;
use crate::{Error, Result};

/// A row type stored in one of the worksheets.
pub trait Record: Sized {
    /// Cells of this record keyed by column, in schema order.
    fn cells(&self) -> Vec<(&'static str, String)>;

    /// Reads a record from a row, coercing with defaults.
    fn from_row(row: &Row<'_>) -> Self;

    /// Checks a record before it is written.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Whether a counterparty buys from or sells to the business.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CounterpartyKind {
    /// `Cliente`
    Client,
    /// `Fornecedor`
    Supplier,
    /// Any other text found in the worksheet
    Other(String),
}

impl CounterpartyKind {
    /// Cell text for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            CounterpartyKind::Client => "Cliente",
            CounterpartyKind::Supplier => "Fornecedor",
            CounterpartyKind::Other(other) => other,
        }
    }
}

impl From<String> for CounterpartyKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Cliente" => CounterpartyKind::Client,
            "Fornecedor" => CounterpartyKind::Supplier,
            _ => CounterpartyKind::Other(s),
        }
    }
}

impl From<CounterpartyKind> for String {
    fn from(kind: CounterpartyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CounterpartyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row of `Clientes e Fornecedores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Nome
    pub name: String,
    /// Tipo
    pub kind: CounterpartyKind,
    /// Contato
    pub contact: String,
}

impl Record for Counterparty {
    fn cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (NOME, self.name.clone()),
            (TIPO, self.kind.to_string()),
            (CONTATO, self.contact.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> Self {
        Self {
            name: row.text(NOME).to_string(),
            kind: CounterpartyKind::from(row.text(TIPO).to_string()),
            contact: row.text(CONTATO).to_string(),
        }
    }
}

/// Row of `Metas do Ano`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyTarget {
    /// Meta Receita
    pub income_target: Decimal,
    /// Meta Despesa
    pub expense_target: Decimal,
    /// Data
    pub date: Option<NaiveDate>,
}

impl Record for YearlyTarget {
    fn cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (META_RECEITA, format_amount(self.income_target)),
            (META_DESPESA, format_amount(self.expense_target)),
            (DATA, format_date(self.date)),
        ]
    }

    fn from_row(row: &Row<'_>) -> Self {
        Self {
            income_target: amount_or_zero(row.text(META_RECEITA)),
            expense_target: amount_or_zero(row.text(META_DESPESA)),
            date: date_or_none(row.text(DATA)),
        }
    }

    /// Rejects negative targets.
    fn validate(&self) -> Result<()> {
        non_negative(META_RECEITA, self.income_target)?;
        non_negative(META_DESPESA, self.expense_target)
    }
}

/// Row of `Receitas` or `Despesas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Valor
    pub amount: Decimal,
    /// Data
    pub date: Option<NaiveDate>,
    /// Descrição
    pub description: String,
}

impl Record for Transaction {
    fn cells(&self) -> Vec<(&'static str, String)> {
        vec![
            (VALOR, format_amount(self.amount)),
            (DATA, format_date(self.date)),
            (DESCRICAO, self.description.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> Self {
        Self {
            amount: amount_or_zero(row.text(VALOR)),
            date: date_or_none(row.text(DATA)),
            description: row.text(DESCRICAO).to_string(),
        }
    }

    /// Rejects negative amounts.
    fn validate(&self) -> Result<()> {
        non_negative(VALOR, self.amount)
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn non_negative(field: &str, value: Decimal) -> Result<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::validation_field(field, "must not be negative"));
    }
    Ok(())
}
