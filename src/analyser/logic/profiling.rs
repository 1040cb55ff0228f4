//! Statistical profiling for single columns.
//!
//! Each column type gets its own summary shape: numeric columns get moments
//! and order statistics, date-time columns their range, and everything else a
//! frequency table. Undefined statistics are `None`, never a panic or a
//! fallback value.

use super::table::Column;
use super::types::{
    Cell, CellKey, ColumnStats, ColumnSummary, LogicalType, NumericStats, TemporalStats, TextStats,
};
use std::collections::{HashMap, HashSet};

pub fn summarise_column(column: &Column, top_n: usize) -> ColumnSummary {
    let total = column.len();
    let missing = column.missing_count();
    let count = total - missing;
    let distinct = column
        .cells()
        .iter()
        .filter(|c| !c.is_missing())
        .map(Cell::key)
        .collect::<HashSet<_>>()
        .len();
    let missing_pct = if total == 0 {
        0.0
    } else {
        (missing as f64 / total as f64) * 100.0
    };

    let stats = match column.logical_type() {
        LogicalType::Integer | LogicalType::Float => {
            ColumnStats::Numeric(analyse_numeric(&column.numeric_values()))
        }
        LogicalType::DateTime => ColumnStats::Temporal(analyse_temporal(column.cells())),
        LogicalType::String | LogicalType::Categorical | LogicalType::Boolean => {
            ColumnStats::Text(TextStats {
                top_values: top_values(column.cells(), top_n),
            })
        }
    };

    ColumnSummary {
        name: column.name().to_owned(),
        logical_type: column.logical_type(),
        count,
        distinct,
        missing,
        missing_pct,
        stats,
    }
}

pub fn analyse_numeric(values: &[f64]) -> NumericStats {
    if values.is_empty() {
        return NumericStats::default();
    }

    let mean = mean(values);
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    NumericStats {
        mean: Some(mean),
        median: median_of_sorted(&sorted),
        std_dev: sample_std_dev(values, mean),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
    }
}

pub fn analyse_temporal(cells: &[Cell]) -> TemporalStats {
    let mut min = None;
    let mut max = None;
    for cell in cells {
        if let Cell::DateTime(dt) = cell {
            if min.is_none_or(|m| *dt < m) {
                min = Some(*dt);
            }
            if max.is_none_or(|m| *dt > m) {
                max = Some(*dt);
            }
        }
    }
    TemporalStats { min, max }
}

/// The `n` most frequent non-missing values. Ties keep first-seen order.
pub fn top_values(cells: &[Cell], n: usize) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<CellKey, usize> = HashMap::new();

    for cell in cells.iter().filter(|c| !c.is_missing()) {
        match index.get(&cell.key()) {
            Some(&slot) => {
                if let Some(entry) = order.get_mut(slot) {
                    entry.1 += 1;
                }
            }
            None => {
                index.insert(cell.key(), order.len());
                order.push((cell.to_string(), 1));
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.truncate(n);
    order
}

/// First value with the highest frequency, ties resolved by first occurrence.
pub fn mode(cells: &[Cell]) -> Option<Cell> {
    let mut counts: HashMap<CellKey, usize> = HashMap::new();
    for cell in cells.iter().filter(|c| !c.is_missing()) {
        *counts.entry(cell.key()).or_insert(0) += 1;
    }
    let best = counts.values().copied().max()?;
    cells
        .iter()
        .find(|c| !c.is_missing() && counts.get(&c.key()) == Some(&best))
        .cloned()
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let len = sorted.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    if len % 2 == 0 {
        Some(f64::midpoint(*sorted.get(mid - 1)?, *sorted.get(mid)?))
    } else {
        sorted.get(mid).copied()
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    median_of_sorted(&sorted)
}

/// Sample standard deviation (N-1 denominator). `None` below two values.
pub fn sample_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation over pairwise-complete observations.
/// NaN when fewer than two pairs or either side has zero variance.
pub fn pearson(a: &[Cell], b: &[Cell]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}
