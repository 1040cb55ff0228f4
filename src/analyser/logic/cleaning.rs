use super::inference::TokenRules;
use super::profiling;
use super::table::{Column, Table};
use super::types::{Cell, LogicalType};
use crate::config::InferenceSettings;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MissingStrategy {
    /// Remove every row holding at least one missing cell
    Drop,
    Fill(FillValue),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FillValue {
    /// Raw text, coerced per column with the loader's token rules
    Literal(String),
    Statistic(FillStatistic),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStatistic {
    Mean,
    Median,
    Mode,
}

impl fmt::Display for FillStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        };
        write!(f, "{name}")
    }
}

impl FromStr for FillStatistic {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            _ => Err(EngineError::Other(format!("Unknown fill statistic: '{s}'"))),
        }
    }
}

pub fn handle_missing(table: &Table, strategy: &MissingStrategy) -> Result<Table> {
    handle_missing_with(table, strategy, &InferenceSettings::default())
}

pub fn handle_missing_with(
    table: &Table,
    strategy: &MissingStrategy,
    settings: &InferenceSettings,
) -> Result<Table> {
    match strategy {
        MissingStrategy::Drop => Ok(drop_incomplete_rows(table)),
        MissingStrategy::Fill(value) => {
            let mut filled = table.clone();
            for column in table.columns().filter(|c| c.missing_count() > 0) {
                let replacement = match value {
                    FillValue::Literal(text) => {
                        Some(fill_literal(column, text, &TokenRules::new(settings))?)
                    }
                    FillValue::Statistic(stat) => fill_statistic(column, *stat)?,
                };
                if let Some(replacement) = replacement {
                    filled = filled.with_column(replacement)?;
                }
            }
            Ok(filled)
        }
    }
}

pub fn drop_incomplete_rows(table: &Table) -> Table {
    let keep: Vec<usize> = (0..table.row_count())
        .filter(|&row| table.row(row).iter().all(|c| !c.is_missing()))
        .collect();
    table.take_rows(&keep)
}

fn fill_literal(column: &Column, text: &str, rules: &TokenRules<'_>) -> Result<Column> {
    let mismatch = || EngineError::FillTypeMismatch {
        column: column.name().to_owned(),
        value: text.to_owned(),
    };
    let value = match rules.coerce(text, column.logical_type()) {
        Some(Cell::Missing) | None => return Err(mismatch()),
        Some(cell) => cell,
    };
    Column::new(
        column.name(),
        column.logical_type(),
        replace_missing(column.cells(), &value),
    )
}

/// `None` when the statistic leaves the column unchanged.
fn fill_statistic(column: &Column, stat: FillStatistic) -> Result<Option<Column>> {
    let value = match stat {
        FillStatistic::Mean | FillStatistic::Median => {
            if !column.is_numeric() {
                return Ok(None);
            }
            let values = column.numeric_values();
            if values.is_empty() {
                return Ok(None);
            }
            let filled = match stat {
                FillStatistic::Mean => profiling::mean(&values),
                _ => match profiling::median(&values) {
                    Some(m) => m,
                    None => return Ok(None),
                },
            };
            Cell::Float(filled)
        }
        FillStatistic::Mode => match profiling::mode(column.cells()) {
            Some(cell) => cell,
            None => return Ok(None),
        },
    };

    if matches!(value, Cell::Float(_)) && column.logical_type() == LogicalType::Integer {
        let promoted: Vec<Cell> = column
            .cells()
            .iter()
            .map(|c| match c {
                Cell::Integer(v) => Cell::Float(*v as f64),
                other => other.clone(),
            })
            .collect();
        return Column::new(
            column.name(),
            LogicalType::Float,
            replace_missing(&promoted, &value),
        )
        .map(Some);
    }

    Column::new(
        column.name(),
        column.logical_type(),
        replace_missing(column.cells(), &value),
    )
    .map(Some)
}

fn replace_missing(cells: &[Cell], value: &Cell) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| if c.is_missing() { value.clone() } else { c.clone() })
        .collect()
}
