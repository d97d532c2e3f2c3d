//! The four worksheets every client spreadsheet carries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column headers as they appear in the worksheets.
pub mod columns {
    /// Counterparty name.
    pub const NOME: &str = "Nome";
    /// Counterparty kind (`Cliente` or `Fornecedor`).
    pub const TIPO: &str = "Tipo";
    /// Counterparty contact.
    pub const CONTATO: &str = "Contato";
    /// Yearly income target.
    pub const META_RECEITA: &str = "Meta Receita";
    /// Yearly expense target.
    pub const META_DESPESA: &str = "Meta Despesa";
    /// Date of a target or transaction.
    pub const DATA: &str = "Data";
    /// Transaction amount.
    pub const VALOR: &str = "Valor";
    /// Transaction description.
    pub const DESCRICAO: &str = "Descrição";
}

use columns::*;

/// One of the fixed record tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sheet {
    /// Clientes e Fornecedores
    Counterparties,
    /// Metas do Ano
    YearlyTargets,
    /// Receitas
    Income,
    /// Despesas
    Expenses,
}

impl Sheet {
    /// All sheets, in provisioning order.
    pub const ALL: [Sheet; 4] = [
        Sheet::Counterparties,
        Sheet::YearlyTargets,
        Sheet::Income,
        Sheet::Expenses,
    ];

    /// Worksheet title inside the spreadsheet.
    pub fn title(self) -> &'static str {
        match self {
            Sheet::Counterparties => "Clientes e Fornecedores",
            Sheet::YearlyTargets => "Metas do Ano",
            Sheet::Income => "Receitas",
            Sheet::Expenses => "Despesas",
        }
    }

    /// Expected header row.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Sheet::Counterparties => &[NOME, TIPO, CONTATO],
            Sheet::YearlyTargets => &[META_RECEITA, META_DESPESA, DATA],
            Sheet::Income | Sheet::Expenses => &[VALOR, DATA, DESCRICAO],
        }
    }

    /// Column whose value selects the rows removed by a delete.
    pub fn key_column(self) -> &'static str {
        match self {
            Sheet::Counterparties => NOME,
            Sheet::YearlyTargets => DATA,
            Sheet::Income | Sheet::Expenses => DESCRICAO,
        }
    }

    /// URL path segment used by the HTTP API.
    pub fn slug(self) -> &'static str {
        match self {
            Sheet::Counterparties => "counterparties",
            Sheet::YearlyTargets => "targets",
            Sheet::Income => "income",
            Sheet::Expenses => "expenses",
        }
    }

    /// Inverse of [`Sheet::slug`].
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sheet| sheet.slug() == slug)
    }

    /// Inverse of [`Sheet::title`].
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sheet| sheet.title() == title)
    }
}

impl fmt::Display for Sheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
