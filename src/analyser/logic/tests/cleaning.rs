use super::{column_cells, ints, sales};
use crate::analyser::logic::*;
use crate::error::EngineError;
use anyhow::Result;

fn fill(value: &str) -> MissingStrategy {
    MissingStrategy::Fill(FillValue::Literal(value.to_owned()))
}

fn stat(statistic: FillStatistic) -> MissingStrategy {
    MissingStrategy::Fill(FillValue::Statistic(statistic))
}

#[test]
fn test_drop_removes_incomplete_rows() -> Result<()> {
    let cleaned = handle_missing(&sales(), &MissingStrategy::Drop)?;
    assert_eq!(cleaned.row_count(), 2);
    assert_eq!(
        column_cells(&cleaned, "product"),
        vec![
            Cell::String("bolt".to_owned()),
            Cell::String("nut".to_owned())
        ]
    );
    assert!(missing_counts(&cleaned).iter().all(|(_, n)| *n == 0));
    Ok(())
}

#[test]
fn test_literal_fill_coerces_per_column() -> Result<()> {
    let table = Table::new(vec![
        ints("a", &[Some(1), None]),
        ints("b", &[None, Some(2)]),
    ])?;
    let filled = handle_missing(&table, &fill("0"))?;
    assert_eq!(column_cells(&filled, "a"), vec![Cell::Integer(1), Cell::Integer(0)]);
    assert_eq!(column_cells(&filled, "b"), vec![Cell::Integer(0), Cell::Integer(2)]);
    Ok(())
}

#[test]
fn test_literal_fill_type_mismatch() {
    // "n/a" is not a valid price, and price holds a missing cell
    match handle_missing(&sales(), &fill("n/a")) {
        Err(EngineError::FillTypeMismatch { column, value }) => {
            assert_eq!(column, "price");
            assert_eq!(value, "n/a");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_literal_fill_skips_complete_columns() -> Result<()> {
    let table = Table::new(vec![
        ints("complete", &[Some(1), Some(2)]),
        Column::new(
            "label",
            LogicalType::String,
            vec![Cell::String("a".to_owned()), Cell::Missing],
        )?,
    ])?;
    // "unknown" cannot be an Integer, but the Integer column has nothing to fill
    let filled = handle_missing(&table, &fill("unknown"))?;
    assert_eq!(
        column_cells(&filled, "label")[1],
        Cell::String("unknown".to_owned())
    );
    Ok(())
}

#[test]
fn test_mean_fill_promotes_integers() -> Result<()> {
    let table = Table::new(vec![ints("n", &[Some(1), None, Some(4)])])?;
    let filled = handle_missing(&table, &stat(FillStatistic::Mean))?;
    let column = filled.column("n").unwrap();
    assert_eq!(column.logical_type(), LogicalType::Float);
    assert_eq!(
        column.cells(),
        &[Cell::Float(1.0), Cell::Float(2.5), Cell::Float(4.0)]
    );
    Ok(())
}

#[test]
fn test_median_fill_leaves_non_numeric_missing() -> Result<()> {
    let filled = handle_missing(&sales(), &stat(FillStatistic::Median))?;
    assert_eq!(column_cells(&filled, "price")[2], Cell::Float(101.0));
    assert_eq!(column_cells(&filled, "qty")[3], Cell::Float(5.0));
    // date and boolean columns keep their gaps
    assert!(column_cells(&filled, "sold_on")[4].is_missing());
    assert!(column_cells(&filled, "promo")[5].is_missing());
    Ok(())
}

#[test]
fn test_mode_fill_any_column() -> Result<()> {
    let filled = handle_missing(&sales(), &stat(FillStatistic::Mode))?;
    // promo: true appears three times
    assert_eq!(column_cells(&filled, "promo")[5], Cell::Boolean(true));
    // qty has no repeats, so the first value wins
    assert_eq!(column_cells(&filled, "qty")[3], Cell::Integer(3));
    assert_eq!(
        filled.column("qty").unwrap().logical_type(),
        LogicalType::Integer
    );
    Ok(())
}

#[test]
fn test_statistic_fill_keeps_all_missing_column() -> Result<()> {
    let table = Table::new(vec![ints("gone", &[None, None])])?;
    for statistic in [FillStatistic::Mean, FillStatistic::Median, FillStatistic::Mode] {
        let filled = handle_missing(&table, &stat(statistic))?;
        assert_eq!(filled, table);
    }
    Ok(())
}
