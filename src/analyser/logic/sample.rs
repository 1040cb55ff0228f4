use super::table::{Column, Table};
use super::types::{Cell, LogicalType};
use crate::error::{EngineError, Result};
use chrono::{Days, NaiveDate};

const CATEGORIES: [&str; 3] = ["A", "B", "C"];

/// A deterministic four-column demo table: `date` (daily from 2023-01-01),
/// `value`, `category` (A/B/C) and `active`.
pub fn example_dataset(rows: usize) -> Result<Table> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| EngineError::Other("invalid example start date".to_owned()))?;

    let mut dates = Vec::with_capacity(rows);
    let mut values = Vec::with_capacity(rows);
    let mut categories = Vec::with_capacity(rows);
    let mut active = Vec::with_capacity(rows);

    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    for i in 0..rows {
        let date = start
            .checked_add_days(Days::new(i as u64))
            .ok_or_else(|| EngineError::Other(format!("example row {i} overflows the calendar")))?;
        dates.push(Cell::DateTime(date));

        // xorshift keeps the values stable across runs and platforms
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let noise = (state % 2000) as f64 / 100.0 - 10.0;
        let value = 100.0 + (i as f64 * 0.5) + noise;
        values.push(Cell::Float((value * 100.0).round() / 100.0));

        let category = CATEGORIES.get(i % CATEGORIES.len()).copied().unwrap_or("A");
        categories.push(Cell::Categorical(category.to_owned()));
        active.push(Cell::Boolean(state % 3 != 0));
    }

    Table::new(vec![
        Column::new("date", LogicalType::DateTime, dates)?,
        Column::new("value", LogicalType::Float, values)?,
        Column::new("category", LogicalType::Categorical, categories)?,
        Column::new("active", LogicalType::Boolean, active)?,
    ])
}
