//! The column and table values every engine operation consumes and produces.
//!
//! Both are immutable once built. A [`Table`] holds its columns behind `Arc`,
//! so transformations that keep a column unchanged share it with their input
//! instead of copying the cells.

use super::types::{Cell, LogicalType};
use crate::error::{EngineError, Result};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    logical_type: LogicalType,
    cells: Vec<Cell>,
}

impl Column {
    /// Builds a column, checking every non-missing cell carries `logical_type`.
    pub fn new(
        name: impl Into<String>,
        logical_type: LogicalType,
        cells: Vec<Cell>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some((row, cell)) = cells
            .iter()
            .enumerate()
            .find(|(_, c)| c.logical_type().is_some_and(|t| t != logical_type))
        {
            return Err(EngineError::InvalidTable(format!(
                "column '{name}' is {logical_type} but row {row} holds a {} cell",
                cell.type_name()
            )));
        }
        Ok(Self {
            name,
            logical_type,
            cells,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize) -> Option<&Cell> {
        self.cells.get(row)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_missing()).count()
    }

    pub fn is_numeric(&self) -> bool {
        self.logical_type.is_numeric()
    }

    /// Non-missing numeric values in row order. Empty for non-numeric columns.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }

    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: self.logical_type,
            cells: self.cells.clone(),
        }
    }

    /// Picks the cells at `rows`, in that order.
    pub fn take(&self, rows: &[usize]) -> Self {
        let cells = rows
            .iter()
            .map(|&r| self.cells.get(r).cloned().unwrap_or(Cell::Missing))
            .collect();
        Self {
            name: self.name.clone(),
            logical_type: self.logical_type,
            cells,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<Arc<Column>>,
    row_count: usize,
}

impl Table {
    /// Builds a table, checking equal column lengths and unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        Self::from_shared(columns.into_iter().map(Arc::new).collect())
    }

    pub(crate) fn from_shared(columns: Vec<Arc<Column>>) -> Result<Self> {
        let row_count = columns.first().map_or(0, |c| c.len());
        let mut seen: HashSet<&str> = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.len() != row_count {
                return Err(EngineError::InvalidTable(format!(
                    "column '{}' has {} cells, expected {row_count}",
                    column.name(),
                    column.len()
                )));
            }
            if !seen.insert(column.name()) {
                return Err(EngineError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    column.name()
                )));
            }
        }
        drop(seen);
        Ok(Self { columns, row_count })
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(AsRef::as_ref)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name().to_owned()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .map(AsRef::as_ref)
    }

    /// Like [`Table::column`] but fails with `ColumnNotFound`.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| EngineError::ColumnNotFound(name.to_owned()))
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index).map(AsRef::as_ref)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.columns.get(column)?.get(row)
    }

    pub fn row(&self, row: usize) -> Vec<&Cell> {
        self.columns.iter().filter_map(|c| c.get(row)).collect()
    }

    /// New table holding only `rows`, in the given order.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| Arc::new(c.take(rows))).collect(),
            row_count: rows.len(),
        }
    }

    /// New table with the named columns, in the given order. Columns are shared.
    pub fn select(&self, names: &[String]) -> Result<Self> {
        let columns = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .find(|c| c.name() == name)
                    .cloned()
                    .ok_or_else(|| EngineError::ColumnNotFound(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_shared(columns)
    }

    /// New table where `column` replaces the same-named column in place, or is appended.
    pub fn with_column(&self, column: Column) -> Result<Self> {
        let mut columns = self.columns.clone();
        match self.column_index(column.name()) {
            Some(index) => {
                if let Some(slot) = columns.get_mut(index) {
                    *slot = Arc::new(column);
                }
            }
            None => columns.push(Arc::new(column)),
        }
        if self.columns.is_empty() {
            return Self::from_shared(columns);
        }
        let table = Self::from_shared(columns)?;
        if table.row_count != self.row_count {
            return Err(EngineError::InvalidTable(format!(
                "new column has {} cells, table has {} rows",
                table.row_count, self.row_count
            )));
        }
        Ok(table)
    }
}
