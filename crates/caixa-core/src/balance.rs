//! Balance view: totals, balance and the income/expense time series.
//!
//! Everything is recomputed from the full `Receitas` and `Despesas` tables on
//! each call. Problems with the data never fail the computation; they are
//! collected as [`Warning`]s and the affected values degrade to zero or to
//! the null date bucket.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::coerce::{amount_or_zero, format_currency, parse_amount, parse_date};
use crate::sheet::Sheet;
use crate::sheet::columns::{DATA, VALOR};
use crate::table::Table;

/// A non-fatal problem found while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A column the computation needs is absent.
    MissingColumn {
        /// Affected worksheet
        sheet: Sheet,
        /// Missing column
        column: String,
    },
    /// A `Valor` cell did not parse and was counted as zero.
    UnparseableAmount {
        /// Affected worksheet
        sheet: Sheet,
        /// Zero-based data row
        row: usize,
        /// Raw cell text
        value: String,
    },
    /// A sum exceeded the representable range and was capped.
    Overflow {
        /// Worksheet whose amounts overflowed
        sheet: Sheet,
    },
    /// A date cell did not parse and was grouped under the null bucket.
    UnparseableDate {
        /// Affected worksheet
        sheet: Sheet,
        /// Zero-based data row
        row: usize,
        /// Raw cell text
        value: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingColumn { sheet, column } => {
                write!(f, "Coluna '{column}' não encontrada na planilha de {sheet}.")
            }
            Warning::UnparseableAmount { sheet, row, value } => write!(
                f,
                "Valor inválido '{value}' na linha {} de {sheet}; contado como zero.",
                row + 1
            ),
            Warning::Overflow { sheet } => write!(
                f,
                "Soma dos valores de {sheet} excede o limite representável; total limitado."
            ),
            Warning::UnparseableDate { sheet, row, value } => write!(
                f,
                "Data inválida '{value}' na linha {} de {sheet}; agrupada sem data.",
                row + 1
            ),
        }
    }
}

impl Warning {
    /// Whether this reports `column` missing from a worksheet.
    pub fn is_missing_column(&self, column: &str) -> bool {
        matches!(self, Warning::MissingColumn { column: missing, .. } if missing == column)
    }
}

/// Sum of `Valor` for one date; `date` is `None` for the null bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket date
    pub date: Option<NaiveDate>,
    /// Summed amount
    pub total: Decimal,
}

/// Income and expense buckets, each sorted by date with the null bucket first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Receitas per date
    pub income: Vec<Bucket>,
    /// Despesas per date
    pub expense: Vec<Bucket>,
}

impl TimeSeries {
    /// Union of both series' dates, null bucket first.
    pub fn dates(&self) -> Vec<Option<NaiveDate>> {
        let mut dates: Vec<Option<NaiveDate>> = self
            .income
            .iter()
            .chain(self.expense.iter())
            .map(|bucket| bucket.date)
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Largest bucket total in either series.
    pub fn max_total(&self) -> Decimal {
        self.income
            .iter()
            .chain(self.expense.iter())
            .map(|bucket| bucket.total)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Computed balance view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Total de Receitas Lançadas
    pub total_income: Decimal,
    /// Total de Despesas Lançadas
    pub total_expense: Decimal,
    /// Saldo
    pub balance: Decimal,
    /// Chart data; `None` when either table lacks a `Data` column
    pub series: Option<TimeSeries>,
    /// Everything that degraded along the way
    pub warnings: Vec<Warning>,
}

impl BalanceReport {
    /// Computes the balance view from the income and expense tables.
    pub fn compute(income: &Table, expenses: &Table) -> Self {
        let mut warnings = Vec::new();

        let total_income = total(income, Sheet::Income, &mut warnings);
        let total_expense = total(expenses, Sheet::Expenses, &mut warnings);

        let series = if income.has_column(DATA) && expenses.has_column(DATA) {
            Some(TimeSeries {
                income: group_by_date(income, Sheet::Income, &mut warnings),
                expense: group_by_date(expenses, Sheet::Expenses, &mut warnings),
            })
        } else {
            for (table, sheet) in [(income, Sheet::Income), (expenses, Sheet::Expenses)] {
                if !table.has_column(DATA) {
                    warnings.push(Warning::MissingColumn {
                        sheet,
                        column: DATA.to_string(),
                    });
                }
            }
            None
        };

        let balance = total_income.checked_sub(total_expense).unwrap_or_else(|| {
            warnings.push(Warning::Overflow {
                sheet: Sheet::Expenses,
            });
            total_income.saturating_sub(total_expense)
        });

        Self {
            total_income,
            total_expense,
            balance,
            series,
            warnings,
        }
    }

    /// The three headline metrics as `(label, formatted value)`.
    pub fn metrics(&self) -> [(&'static str, String); 3] {
        [
            ("Total de Receitas Lançadas", format_currency(self.total_income)),
            ("Total de Despesas Lançadas", format_currency(self.total_expense)),
            ("Saldo", format_currency(self.balance)),
        ]
    }
}

/// Adds `amount` to `sum`, saturating and warning once per worksheet on
/// overflow.
fn accumulate(sum: &mut Decimal, amount: Decimal, sheet: Sheet, warnings: &mut Vec<Warning>) {
    let current = *sum;
    *sum = current.checked_add(amount).unwrap_or_else(|| {
        let overflow = Warning::Overflow { sheet };
        if !warnings.contains(&overflow) {
            warnings.push(overflow);
        }
        current.saturating_add(amount)
    });
}

/// Sums the `Valor` column.
///
/// Missing column ⇒ zero plus a warning. Unparseable cells count as zero and
/// are each reported.
pub fn total(table: &Table, sheet: Sheet, warnings: &mut Vec<Warning>) -> Decimal {
    match table.column(VALOR) {
        Some(values) => {
            let mut sum = Decimal::ZERO;
            for (row, cell) in values.enumerate() {
                let amount = parse_amount(cell).unwrap_or_else(|err| {
                    warnings.push(Warning::UnparseableAmount {
                        sheet,
                        row,
                        value: err.value,
                    });
                    Decimal::ZERO
                });
                accumulate(&mut sum, amount, sheet, warnings);
            }
            sum
        }
        None => {
            warnings.push(Warning::MissingColumn {
                sheet,
                column: VALOR.to_string(),
            });
            Decimal::ZERO
        }
    }
}

/// Sums `Valor` per parsed `Data`.
///
/// Blank and unparseable dates share the null bucket; unparseable ones also
/// produce a warning. A missing `Valor` column counts every row as zero.
pub fn group_by_date(table: &Table, sheet: Sheet, warnings: &mut Vec<Warning>) -> Vec<Bucket> {
    let mut buckets: BTreeMap<Option<NaiveDate>, Decimal> = BTreeMap::new();

    for row in table.iter() {
        let date = match parse_date(row.text(DATA)) {
            Ok(date) => date,
            Err(err) => {
                warnings.push(Warning::UnparseableDate {
                    sheet,
                    row: row.index(),
                    value: err.value,
                });
                None
            }
        };
        let bucket = buckets.entry(date).or_insert(Decimal::ZERO);
        accumulate(bucket, amount_or_zero(row.text(VALOR)), sheet, warnings);
    }

    buckets
        .into_iter()
        .map(|(date, total)| Bucket { date, total })
        .collect()
}
