//! Column-selection specs such as `"name,price"`, `"1,3-4"` or `"2-5"`.
//!
//! A spec is read as names only when every token names an existing column;
//! otherwise every token must be a 1-based index or inclusive range. Mixing
//! the two forms is therefore rejected rather than guessed at.

use super::table::Table;
use crate::error::{EngineError, Result};

/// Resolves `spec` to column names, deduplicated and in table column order.
pub fn parse_selection(table: &Table, spec: &str) -> Result<Vec<String>> {
    let tokens: Vec<&str> = spec.split(',').map(str::trim).collect();

    let all_names = tokens
        .iter()
        .all(|t| !t.is_empty() && table.column_index(t).is_some());

    let mut picked = vec![false; table.column_count()];
    if all_names {
        for token in &tokens {
            if let Some(slot) = table.column_index(token).and_then(|i| picked.get_mut(i)) {
                *slot = true;
            }
        }
    } else {
        for token in &tokens {
            let (start, end) = parse_positional(token)?;
            for position in [start, end] {
                check_bounds(token, position, table.column_count())?;
            }
            for slot in picked.iter_mut().take(end).skip(start - 1) {
                *slot = true;
            }
        }
    }

    Ok(table
        .columns()
        .zip(picked)
        .filter(|(_, keep)| *keep)
        .map(|(c, _)| c.name().to_owned())
        .collect())
}

/// Projects `names` in the given order.
pub fn select(table: &Table, names: &[String]) -> Result<Table> {
    table.select(names)
}

/// Parses `n` or `a-b` into an inclusive 1-based range.
fn parse_positional(token: &str) -> Result<(usize, usize)> {
    let invalid = || EngineError::InvalidSelectionToken(token.to_owned());

    if token.is_empty() {
        return Err(invalid());
    }

    match token.split_once('-') {
        Some((start, end)) => {
            let start = parse_index(start.trim()).ok_or_else(invalid)?;
            let end = parse_index(end.trim()).ok_or_else(invalid)?;
            if start > end {
                return Err(invalid());
            }
            Ok((start, end))
        }
        None => {
            let index = parse_index(token).ok_or_else(invalid)?;
            Ok((index, index))
        }
    }
}

fn parse_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // digits that overflow are still an index, just one past any table
    Some(text.parse().unwrap_or(usize::MAX))
}

fn check_bounds(token: &str, index: usize, column_count: usize) -> Result<()> {
    if index == 0 || index > column_count {
        return Err(EngineError::SelectionOutOfRange {
            token: token.to_owned(),
            index,
            column_count,
        });
    }
    Ok(())
}
