#![expect(
    clippy::unwrap_used,
    clippy::panic,
    clippy::expect_used,
    clippy::indexing_slicing
)]
use super::*;
use anyhow::Result;

mod analysis;
mod cleaning;
mod selection;

pub(super) const SALES_CSV: &str = "\
region,product,price,qty,sold_on,promo
north,bolt,120,3,2023-01-05,true
south,nut,80,10,2023-01-06,false
north,screw,,5,2023-01-07 09:30:00,true
east,bolt,150.5,,2023-01-08,false
south,washer,95,7,,true
north,nut,101,2,2023-01-10,NA
";

pub(super) fn sales() -> Table {
    load(SALES_CSV.as_bytes(), DataFormat::Delimited).expect("fixture loads")
}

pub(super) fn column_cells(table: &Table, name: &str) -> Vec<Cell> {
    table.column(name).expect("column exists").cells().to_vec()
}

pub(super) fn ints(name: &str, values: &[Option<i64>]) -> Column {
    Column::new(
        name,
        LogicalType::Integer,
        values
            .iter()
            .map(|v| v.map_or(Cell::Missing, Cell::Integer))
            .collect(),
    )
    .expect("valid column")
}

#[test]
fn test_fixture_types_are_inferred() {
    let table = sales();
    let types: Vec<LogicalType> = table.columns().map(Column::logical_type).collect();
    assert_eq!(
        types,
        vec![
            LogicalType::Categorical,
            LogicalType::String,
            LogicalType::Float,
            LogicalType::Integer,
            LogicalType::DateTime,
            LogicalType::Boolean,
        ]
    );
    assert_eq!(table.row_count(), 6);
}

#[test]
fn test_table_is_shareable_across_threads() -> Result<()> {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    let table = sales();
    assert_send_sync(&table);

    let handle = {
        let table = table.clone();
        std::thread::spawn(move || describe(&table).len())
    };
    assert_eq!(handle.join().expect("thread finished"), 6);
    Ok(())
}

#[test]
fn test_operations_leave_input_untouched() -> Result<()> {
    let table = sales();
    let before = table.clone();

    filter(&table, "price > 100")?;
    apply_formula(&table, "price", "x * 2")?;
    handle_missing(&table, &MissingStrategy::Drop)?;
    sort_by(&table, "price", false)?;

    assert_eq!(table, before);
    Ok(())
}

#[test]
fn test_example_dataset_shape() -> Result<()> {
    let table = example_dataset(9)?;
    assert_eq!(table.column_names(), vec!["date", "value", "category", "active"]);
    assert_eq!(table.row_count(), 9);
    assert_eq!(table.column("category").unwrap().logical_type(), LogicalType::Categorical);
    // deterministic across calls
    assert_eq!(example_dataset(9)?, table);

    let first = table.cell(0, 0).unwrap();
    assert_eq!(first.to_string(), "2023-01-01");
    assert_eq!(table.cell(8, 0).unwrap().to_string(), "2023-01-09");
    Ok(())
}
