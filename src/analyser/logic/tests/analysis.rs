use super::{ints, sales};
use crate::analyser::logic::*;
use crate::error::EngineError;
use anyhow::Result;

#[test]
fn test_describe_numeric_column() -> Result<()> {
    let summary = describe_column(&sales(), "price")?;
    assert_eq!(summary.logical_type, LogicalType::Float);
    assert_eq!(summary.count, 5);
    assert_eq!(summary.missing, 1);
    assert!((summary.missing_pct - 100.0 / 6.0).abs() < 1e-9);
    assert_eq!(summary.distinct, 5);

    let ColumnStats::Numeric(stats) = summary.stats else {
        panic!("expected numeric stats");
    };
    assert_eq!(stats.min, Some(80.0));
    assert_eq!(stats.max, Some(150.5));
    assert_eq!(stats.median, Some(101.0));
    assert!((stats.mean.unwrap() - 109.3).abs() < 1e-9);
    assert!(stats.std_dev.is_some());
    Ok(())
}

#[test]
fn test_describe_all_missing_column() -> Result<()> {
    let table = Table::new(vec![ints("empty", &[None, None, None])])?;
    let summary = describe_column(&table, "empty")?;
    assert_eq!(summary.count, 0);
    assert_eq!(summary.distinct, 0);
    assert!((summary.missing_pct - 100.0).abs() < f64::EPSILON);
    assert_eq!(summary.stats, ColumnStats::Numeric(NumericStats::default()));
    Ok(())
}

#[test]
fn test_describe_all_missing_tokens_is_string() -> Result<()> {
    let table = load(b"a,b\n,1\nNA,2\n", DataFormat::Delimited)?;
    let summary = describe_column(&table, "a")?;
    assert_eq!(summary.logical_type, LogicalType::String);
    assert_eq!(summary.missing, 2);
    assert_eq!(summary.stats, ColumnStats::Text(TextStats::default()));
    Ok(())
}

#[test]
fn test_describe_text_and_dates() -> Result<()> {
    let summaries = describe(&sales());
    assert_eq!(summaries.len(), 6);

    let region = &summaries[0];
    match &region.stats {
        ColumnStats::Text(text) => {
            assert_eq!(text.top_values[0], ("north".to_owned(), 3));
            assert_eq!(text.top_values[1], ("south".to_owned(), 2));
            assert_eq!(text.top_values[2], ("east".to_owned(), 1));
        }
        other => panic!("unexpected stats {other:?}"),
    }

    let sold_on = &summaries[4];
    match &sold_on.stats {
        ColumnStats::Temporal(range) => {
            assert_eq!(range.min.unwrap().to_string(), "2023-01-05 00:00:00");
            assert_eq!(range.max.unwrap().to_string(), "2023-01-10 00:00:00");
        }
        other => panic!("unexpected stats {other:?}"),
    }

    let promo = &summaries[5];
    assert!(matches!(promo.stats, ColumnStats::Text(_)));
    assert_eq!(promo.missing, 1);
    Ok(())
}

#[test]
fn test_describe_zero_row_table() -> Result<()> {
    let table = Table::new(vec![ints("a", &[])])?;
    let summary = describe_column(&table, "a")?;
    assert_eq!(summary.missing_pct, 0.0);
    assert_eq!(summary.count, 0);
    Ok(())
}

#[test]
fn test_describe_unknown_column() {
    assert!(matches!(
        describe_column(&sales(), "nope"),
        Err(EngineError::ColumnNotFound(name)) if name == "nope"
    ));
}

#[test]
fn test_top_values_respect_settings() -> Result<()> {
    let settings = crate::config::SummarySettings { top_values: 1 };
    let summary = describe_column_with(&sales(), "product", &settings)?;
    let ColumnStats::Text(text) = summary.stats else {
        panic!("expected text stats");
    };
    // bolt and nut both appear twice; bolt is seen first
    assert_eq!(text.top_values, vec![("bolt".to_owned(), 2)]);
    Ok(())
}

#[test]
fn test_correlations() -> Result<()> {
    let matrix = correlations(&sales())?;
    assert_eq!(matrix.columns, vec!["price", "qty"]);
    assert_eq!(matrix.get("price", "price"), Some(1.0));
    assert_eq!(matrix.get("qty", "qty"), Some(1.0));

    let r = matrix.get("price", "qty").unwrap();
    assert_eq!(Some(r), matrix.get("qty", "price"));
    assert!((-1.0..=1.0).contains(&r));
    // more quantity at lower prices in the fixture
    assert!(r < 0.0);
    Ok(())
}

#[test]
fn test_correlation_undefined_cases() -> Result<()> {
    let table = Table::new(vec![
        ints("a", &[Some(1), Some(2), None]),
        ints("b", &[Some(5), None, Some(7)]),
        ints("c", &[Some(4), Some(4), Some(4)]),
    ])?;
    let matrix = correlations(&table)?;
    // one complete pair only
    assert!(matrix.get("a", "b").unwrap().is_nan());
    // zero variance
    assert!(matrix.get("a", "c").unwrap().is_nan());
    assert_eq!(matrix.get("c", "c"), Some(1.0));
    Ok(())
}

#[test]
fn test_correlations_need_numeric_columns() -> Result<()> {
    let table = load(b"a,b\nx,y\n", DataFormat::Delimited)?;
    assert!(matches!(
        correlations(&table),
        Err(EngineError::NoNumericColumns)
    ));
    Ok(())
}

#[test]
fn test_missing_counts_and_info() {
    let table = sales();
    assert_eq!(
        missing_counts(&table),
        vec![
            ("region".to_owned(), 0),
            ("product".to_owned(), 0),
            ("price".to_owned(), 1),
            ("qty".to_owned(), 1),
            ("sold_on".to_owned(), 1),
            ("promo".to_owned(), 1),
        ]
    );

    let info = dataset_info(&table);
    assert_eq!(info.rows, 6);
    assert_eq!(info.columns, 6);
    assert_eq!(info.type_counts.get(&LogicalType::Float), Some(&1));
    assert_eq!(info.type_counts.get(&LogicalType::Categorical), Some(&1));
    assert_eq!(info.type_counts.values().sum::<usize>(), 6);
    assert!(info.approximate_bytes > 0);
}
