use super::profiling;
use super::table::{Column, Table};
use super::types::{Cell, ColumnSummary, CorrelationMatrix, DatasetInfo};
use crate::config::SummarySettings;
use crate::error::{EngineError, Result};
use std::collections::BTreeMap;

/// Summarises every column, in column order, with default settings.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    describe_with(table, &SummarySettings::default())
}

pub fn describe_with(table: &Table, settings: &SummarySettings) -> Vec<ColumnSummary> {
    table
        .columns()
        .map(|col| profiling::summarise_column(col, settings.top_values))
        .collect()
}

pub fn describe_column(table: &Table, name: &str) -> Result<ColumnSummary> {
    describe_column_with(table, name, &SummarySettings::default())
}

pub fn describe_column_with(
    table: &Table,
    name: &str,
    settings: &SummarySettings,
) -> Result<ColumnSummary> {
    let column = table.require_column(name)?;
    Ok(profiling::summarise_column(column, settings.top_values))
}

/// Pairwise Pearson correlations between all numeric columns.
pub fn correlations(table: &Table) -> Result<CorrelationMatrix> {
    let numeric: Vec<&Column> = table.columns().filter(|c| c.is_numeric()).collect();
    if numeric.is_empty() {
        return Err(EngineError::NoNumericColumns);
    }

    let n = numeric.len();
    let mut data = vec![vec![f64::NAN; n]; n];
    for (i, a) in numeric.iter().enumerate() {
        for (j, b) in numeric.iter().enumerate().skip(i) {
            let r = if i == j {
                1.0
            } else {
                profiling::pearson(a.cells(), b.cells())
            };
            if let Some(slot) = data.get_mut(i).and_then(|row| row.get_mut(j)) {
                *slot = r;
            }
            if let Some(slot) = data.get_mut(j).and_then(|row| row.get_mut(i)) {
                *slot = r;
            }
        }
    }

    Ok(CorrelationMatrix {
        columns: numeric.iter().map(|c| c.name().to_owned()).collect(),
        data,
    })
}

pub fn missing_counts(table: &Table) -> Vec<(String, usize)> {
    table
        .columns()
        .map(|c| (c.name().to_owned(), c.missing_count()))
        .collect()
}

pub fn dataset_info(table: &Table) -> DatasetInfo {
    let mut type_counts = BTreeMap::new();
    let mut approximate_bytes = 0;
    for column in table.columns() {
        *type_counts.entry(column.logical_type()).or_insert(0) += 1;
        approximate_bytes += column.name().len();
        approximate_bytes += column.cells().iter().map(cell_footprint).sum::<usize>();
    }

    DatasetInfo {
        columns: table.column_count(),
        rows: table.row_count(),
        type_counts,
        approximate_bytes,
    }
}

fn cell_footprint(cell: &Cell) -> usize {
    let heap = match cell {
        Cell::String(s) | Cell::Categorical(s) => s.len(),
        _ => 0,
    };
    size_of::<Cell>() + heap
}
