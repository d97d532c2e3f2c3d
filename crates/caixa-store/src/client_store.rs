//! Per-client handle and worksheet access.
//!
//! Every mutation is a full read-modify-write of one worksheet. Nothing
//! guards against another writer changing the worksheet in between.

use std::marker::PhantomData;
use std::sync::Arc;

use caixa_core::{
    BalanceReport, ClientName, ContainerId, Counterparty, Record, Sheet, Table, Transaction,
    YearlyTarget,
};

use crate::Result;
use crate::backend::StoreBackend;

/// A resolved client spreadsheet.
///
/// Cheap to clone; every clone talks to the same spreadsheet.
#[derive(Clone)]
pub struct ClientStore {
    name: ClientName,
    container: ContainerId,
    backend: Arc<dyn StoreBackend>,
}

impl std::fmt::Debug for ClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientStore")
            .field("name", &self.name)
            .field("container", &self.container)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ClientStore {
    /// Wraps an existing spreadsheet.
    pub fn new(name: ClientName, container: ContainerId, backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            name,
            container,
            backend,
        }
    }

    /// Client this store belongs to.
    pub fn name(&self) -> &ClientName {
        &self.name
    }

    /// Backend id of the spreadsheet.
    pub fn container_id(&self) -> &ContainerId {
        &self.container
    }

    /// Untyped access to one worksheet.
    pub fn table(&self, sheet: Sheet) -> RecordTable<'_> {
        RecordTable { store: self, sheet }
    }

    /// `Clientes e Fornecedores`
    pub fn counterparties(&self) -> TypedTable<'_, Counterparty> {
        TypedTable::new(self.table(Sheet::Counterparties))
    }

    /// `Metas do Ano`
    pub fn targets(&self) -> TypedTable<'_, YearlyTarget> {
        TypedTable::new(self.table(Sheet::YearlyTargets))
    }

    /// `Receitas`
    pub fn income(&self) -> TypedTable<'_, Transaction> {
        TypedTable::new(self.table(Sheet::Income))
    }

    /// `Despesas`
    pub fn expenses(&self) -> TypedTable<'_, Transaction> {
        TypedTable::new(self.table(Sheet::Expenses))
    }

    /// Recomputes the balance view from the current income and expenses.
    pub async fn balance(&self) -> Result<BalanceReport> {
        let income_table = self.table(Sheet::Income);
        let expense_table = self.table(Sheet::Expenses);
        let (income, expenses) =
            tokio::try_join!(income_table.read_all(), expense_table.read_all())?;
        let report = BalanceReport::compute(&income, &expenses);
        for warning in &report.warnings {
            tracing::debug!(client = %self.name, %warning, "balance degraded");
        }
        Ok(report)
    }
}

/// One worksheet of a client store, read and written as a whole.
#[derive(Debug, Clone, Copy)]
pub struct RecordTable<'a> {
    store: &'a ClientStore,
    sheet: Sheet,
}

impl RecordTable<'_> {
    /// Worksheet this table reads and writes.
    pub fn sheet(&self) -> Sheet {
        self.sheet
    }

    /// Reads the worksheet. An empty worksheet yields an empty table.
    pub async fn read_all(&self) -> Result<Table> {
        let grid = self
            .store
            .backend
            .read_values(&self.store.container, self.sheet.title())
            .await?;
        Ok(Table::from_grid(grid))
    }

    /// Replaces the worksheet with `table`.
    pub async fn write_all(&self, table: &Table) -> Result<()> {
        self.store
            .backend
            .write_values(&self.store.container, self.sheet.title(), &table.to_grid())
            .await
    }

    /// Adds one row given as `(column, cell)` pairs.
    ///
    /// An empty worksheet gets the schema header first. Columns the current
    /// header lacks are added at the end.
    pub async fn append<'c, I>(&self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'c str, String)>,
    {
        let mut table = self.read_all().await?;
        if table.columns().is_empty() {
            table = Table::new(self.sheet.columns().iter().copied());
        }
        table.append(cells);
        self.write_all(&table).await?;
        tracing::debug!(
            client = %self.store.name,
            sheet = %self.sheet,
            rows = table.len(),
            "row appended"
        );
        Ok(())
    }

    /// Removes every row whose `column` equals `value`.
    ///
    /// Returns how many rows were removed. Nothing is written when the
    /// column is absent or no row matches.
    pub async fn delete_where(&self, column: &str, value: &str) -> Result<usize> {
        let mut table = self.read_all().await?;
        let removed = table.remove_where(column, value);
        if removed > 0 {
            self.write_all(&table).await?;
        }
        tracing::debug!(
            client = %self.store.name,
            sheet = %self.sheet,
            column,
            removed,
            "rows deleted"
        );
        Ok(removed)
    }

    /// [`delete_where`](Self::delete_where) on the worksheet's key column.
    pub async fn delete_by_key(&self, value: &str) -> Result<usize> {
        self.delete_where(self.sheet.key_column(), value).await
    }

    /// Distinct key column values, offered as delete choices.
    pub async fn key_values(&self) -> Result<Vec<String>> {
        Ok(self.read_all().await?.distinct(self.sheet.key_column()))
    }
}

/// A [`RecordTable`] read and written as records of type `R`.
#[derive(Debug)]
pub struct TypedTable<'a, R> {
    table: RecordTable<'a>,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record> TypedTable<'a, R> {
    fn new(table: RecordTable<'a>) -> Self {
        Self {
            table,
            _record: PhantomData,
        }
    }

    /// The untyped worksheet.
    pub fn raw(&self) -> RecordTable<'a> {
        self.table
    }

    /// Every row as a record, coercing bad cells to defaults.
    pub async fn list(&self) -> Result<Vec<R>> {
        let table = self.table.read_all().await?;
        Ok(table.iter().map(|row| R::from_row(&row)).collect())
    }

    /// Validates and appends a record.
    pub async fn add(&self, record: &R) -> Result<()> {
        record.validate()?;
        self.table.append(record.cells()).await
    }

    /// Removes every record whose key column equals `value`.
    pub async fn delete_by_key(&self, value: &str) -> Result<usize> {
        self.table.delete_by_key(value).await
    }
}
