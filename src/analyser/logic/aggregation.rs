use super::table::{Column, Table};
use super::types::{Cell, CellKey, LogicalType};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Mean,
    Count,
    Max,
    Min,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    fn requires_numeric(self) -> bool {
        !matches!(self, Self::Count)
    }

    fn output_type(self, input: LogicalType) -> LogicalType {
        match self {
            Self::Sum | Self::Mean => LogicalType::Float,
            Self::Count => LogicalType::Integer,
            Self::Max | Self::Min => input,
        }
    }

    fn reduce(self, cells: &[&Cell]) -> Cell {
        let present: Vec<&Cell> = cells.iter().copied().filter(|c| !c.is_missing()).collect();
        match self {
            Self::Count => Cell::Integer(present.len() as i64),
            Self::Sum => Cell::Float(present.iter().filter_map(|c| c.as_f64()).sum()),
            Self::Mean => {
                let values: Vec<f64> = present.iter().filter_map(|c| c.as_f64()).collect();
                if values.is_empty() {
                    Cell::Missing
                } else {
                    Cell::Float(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Self::Max => extreme(&present, Ordering::Greater),
            Self::Min => extreme(&present, Ordering::Less),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregateOp {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            "count" => Ok(Self::Count),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            _ => Err(EngineError::UnsupportedAggregation {
                column: String::new(),
                operation: s.to_owned(),
            }),
        }
    }
}

/// First cell that is strictly `wanted` against every earlier candidate.
fn extreme(cells: &[&Cell], wanted: Ordering) -> Cell {
    let mut best: Option<&Cell> = None;
    for &cell in cells {
        let replace = match best {
            None => true,
            Some(current) => numeric_order(cell, current) == Some(wanted),
        };
        if replace {
            best = Some(cell);
        }
    }
    best.cloned().unwrap_or(Cell::Missing)
}

fn numeric_order(a: &Cell, b: &Cell) -> Option<Ordering> {
    match (a, b) {
        (Cell::Integer(x), Cell::Integer(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Groups rows by exact equality of `key_column` and reduces every other
/// column with `operation`. Groups appear in first-encountered key order.
pub fn group_by(table: &Table, key_column: &str, operation: AggregateOp) -> Result<Table> {
    let key = table.require_column(key_column)?;

    if operation.requires_numeric()
        && let Some(bad) = table
            .columns()
            .find(|c| c.name() != key_column && !c.is_numeric())
    {
        return Err(EngineError::UnsupportedAggregation {
            column: bad.name().to_owned(),
            operation: operation.to_string(),
        });
    }

    let mut first_rows: Vec<usize> = Vec::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut slots: HashMap<CellKey, usize> = HashMap::new();
    for (row, cell) in key.cells().iter().enumerate() {
        let slot = *slots.entry(cell.key()).or_insert_with(|| {
            first_rows.push(row);
            members.push(Vec::new());
            members.len() - 1
        });
        if let Some(rows) = members.get_mut(slot) {
            rows.push(row);
        }
    }

    let mut columns = vec![key.take(&first_rows)];
    for column in table.columns().filter(|c| c.name() != key_column) {
        let cells = members
            .iter()
            .map(|rows| {
                let group: Vec<&Cell> = rows.iter().filter_map(|&r| column.get(r)).collect();
                operation.reduce(&group)
            })
            .collect();
        columns.push(Column::new(
            column.name(),
            operation.output_type(column.logical_type()),
            cells,
        )?);
    }

    Table::new(columns)
}
