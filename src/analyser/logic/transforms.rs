use super::inference::TokenRules;
use super::table::{Column, Table};
use super::types::{Cell, LogicalType};
use crate::analyser::expr::{self, Binder};
use crate::config::InferenceSettings;
use crate::error::{EngineError, Result};
use std::cmp::Ordering;

/// Keeps the rows where `expression` is truthy. A comparison or arithmetic step
/// that meets a Missing cell drops its row, as does a Missing result.
pub fn filter(table: &Table, expression: &str) -> Result<Table> {
    filter_with(table, expression, &InferenceSettings::default())
}

pub fn filter_with(table: &Table, expression: &str, settings: &InferenceSettings) -> Result<Table> {
    let parsed = expr::parse(expression)?;
    let bound = Binder::new(table, TokenRules::new(settings)).bind(&parsed)?;

    let mut keep = Vec::new();
    for row in 0..table.row_count() {
        if expr::row_matches(&bound, table, row)? {
            keep.push(row);
        }
    }
    Ok(table.take_rows(&keep))
}

/// Computes `target_column` per row from `expression`, replacing the column in
/// place when it exists and appending it otherwise.
pub fn apply_formula(table: &Table, target_column: &str, expression: &str) -> Result<Table> {
    apply_formula_with(
        table,
        target_column,
        expression,
        &InferenceSettings::default(),
    )
}

pub fn apply_formula_with(
    table: &Table,
    target_column: &str,
    expression: &str,
    settings: &InferenceSettings,
) -> Result<Table> {
    let parsed = expr::parse(expression)?;
    let bound = Binder::new(table, TokenRules::new(settings))
        .with_implicit_target(target_column)
        .bind(&parsed)?;

    let cells = (0..table.row_count())
        .map(|row| {
            expr::evaluate(&bound, table, row).map_err(|cause| {
                EngineError::FormulaEvaluationError {
                    row,
                    cause: Box::new(cause),
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (logical_type, cells) = unify_results(cells)?;
    table.with_column(Column::new(target_column, logical_type, cells)?)
}

/// Settles the column type of formula results, widening Integer to Float when mixed.
fn unify_results(cells: Vec<Cell>) -> Result<(LogicalType, Vec<Cell>)> {
    let mut result_type: Option<LogicalType> = None;
    for (row, cell) in cells.iter().enumerate() {
        let Some(cell_type) = cell.logical_type() else {
            continue;
        };
        let cell_type = match cell_type {
            LogicalType::Categorical => LogicalType::String,
            other => other,
        };
        result_type = match result_type {
            None => Some(cell_type),
            Some(current) if current == cell_type => Some(current),
            Some(current) if current.is_numeric() && cell_type.is_numeric() => {
                Some(LogicalType::Float)
            }
            Some(current) => {
                return Err(EngineError::FormulaEvaluationError {
                    row,
                    cause: Box::new(EngineError::type_mismatch(
                        "formula result",
                        current.as_str(),
                        cell_type.as_str(),
                    )),
                });
            }
        };
    }

    let logical_type = result_type.unwrap_or(LogicalType::Float);
    let cells = cells
        .into_iter()
        .map(|cell| match (logical_type, cell) {
            (LogicalType::Float, Cell::Integer(v)) => Cell::Float(v as f64),
            (_, Cell::Categorical(s)) => Cell::String(s),
            (_, other) => other,
        })
        .collect();
    Ok((logical_type, cells))
}

/// Stable sort by one column. Missing cells sort last in both directions.
pub fn sort_by(table: &Table, column: &str, ascending: bool) -> Result<Table> {
    let key = table.require_column(column)?;
    let mut rows: Vec<usize> = (0..table.row_count()).collect();
    rows.sort_by(|&a, &b| {
        let (Some(x), Some(y)) = (key.get(a), key.get(b)) else {
            return Ordering::Equal;
        };
        match (x.is_missing(), y.is_missing()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ordering = sort_order(x, y);
                if ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            }
        }
    });
    Ok(table.take_rows(&rows))
}

/// Total order for cells of one column.
fn sort_order(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Integer(x), Cell::Integer(y)) => x.cmp(y),
        (Cell::Float(x), Cell::Float(y)) => x.total_cmp(y),
        (Cell::Boolean(x), Cell::Boolean(y)) => x.cmp(y),
        (Cell::DateTime(x), Cell::DateTime(y)) => x.cmp(y),
        _ => match (a.as_text(), b.as_text()) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}
