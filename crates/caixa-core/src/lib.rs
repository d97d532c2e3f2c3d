//! Caixa Core: identifiers, worksheet tables, typed records and the balance
//! computation shared by the store and the HTTP layer.
//!
//! This crate performs no I/O. It has no internal Caixa dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`ids`]: Client, spreadsheet, folder and worksheet identifiers
//! - [`sheet`]: The four fixed worksheets and their columns
//! - [`table`]: Header-plus-rows view of a worksheet
//! - [`records`]: Typed rows with coerce-with-default parsing
//! - [`coerce`]: Cell to amount/date coercion and currency formatting
//! - [`balance`]: Totals, balance and the date-grouped series

#![forbid(unsafe_code)]

pub mod balance;
pub mod coerce;
pub mod error;
pub mod ids;
pub mod records;
pub mod sheet;
pub mod table;

mod proptests;

// Re-export key types at crate root for convenience
pub use balance::{BalanceReport, Bucket, TimeSeries, Warning};
pub use error::{Error, Result};
pub use ids::{ClientName, ContainerId, FolderId, WorksheetId};
pub use records::{Counterparty, CounterpartyKind, Record, Transaction, YearlyTarget};
pub use sheet::Sheet;
pub use table::{Row, Table};
