//! In-memory view of a worksheet: a header row plus data rows of text cells.

use serde::{Deserialize, Serialize};

/// A worksheet read as a table.
///
/// The first row of the worksheet is the header. Data rows are padded with
/// blank cells to the header width and cells beyond it are dropped, so every
/// row has exactly `columns().len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from a raw cell grid whose first row is the header.
    pub fn from_grid(grid: Vec<Vec<String>>) -> Self {
        let mut grid = grid.into_iter();
        let Some(columns) = grid.next() else {
            return Self::default();
        };
        let width = columns.len();
        let rows = grid
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Renders the table back into a cell grid, header first.
    ///
    /// A table without columns renders as an empty grid.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        if self.columns.is_empty() {
            return Vec::new();
        }
        std::iter::once(self.columns.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// Header cells.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// True if the header contains `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cells of one column, top to bottom. `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index].as_str()))
    }

    /// Distinct values of a column in first-seen order.
    pub fn distinct(&self, name: &str) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        if let Some(values) = self.column(name) {
            for value in values {
                if !seen.iter().any(|v| v == value) {
                    seen.push(value.to_string());
                }
            }
        }
        seen
    }

    /// Row views for typed access.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| Row { table: self, index })
    }

    /// Appends one record given as `(column, cell)` pairs.
    ///
    /// Columns missing from the header are added at the end and existing
    /// rows get a blank cell for them. Header columns the record does not
    /// mention are left blank in the new row.
    pub fn append<'a, I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let cells: Vec<(&str, String)> = cells.into_iter().collect();

        for (column, _) in &cells {
            if !self.has_column(column) {
                self.columns.push((*column).to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }

        let mut row = vec![String::new(); self.columns.len()];
        for (column, value) in cells {
            if let Some(index) = self.column_index(column) {
                row[index] = value;
            }
        }
        self.rows.push(row);
    }

    /// Removes every row whose `column` cell equals `value`.
    ///
    /// Returns how many rows were removed. An absent column removes nothing.
    pub fn remove_where(&mut self, column: &str, value: &str) -> usize {
        let Some(index) = self.column_index(column) else {
            return 0;
        };
        let before = self.rows.len();
        self.rows.retain(|row| row[index] != value);
        before - self.rows.len()
    }
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> Row<'a> {
    /// Zero-based position among the data rows.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell text under `column`, or `None` if the column is absent.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = self.table.column_index(column)?;
        Some(self.table.rows[self.index][position].as_str())
    }

    /// Cell text under `column`, blank if the column is absent.
    pub fn text(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }
}
