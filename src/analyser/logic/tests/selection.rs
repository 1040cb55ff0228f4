use super::ints;
use crate::analyser::logic::*;
use crate::error::EngineError;
use anyhow::Result;

fn five_columns() -> Table {
    Table::new(
        ["a", "b", "c", "d", "e"]
            .iter()
            .map(|name| ints(name, &[Some(1)]))
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_positions_and_ranges() -> Result<()> {
    let table = five_columns();
    assert_eq!(parse_selection(&table, "1,3-4")?, vec!["a", "c", "d"]);
    assert_eq!(parse_selection(&table, " 2 - 3 ")?, vec!["b", "c"]);
    // overlaps collapse and results follow table order
    assert_eq!(parse_selection(&table, "4,1-2,2")?, vec!["a", "b", "d"]);
    Ok(())
}

#[test]
fn test_names_follow_table_order() -> Result<()> {
    let table = five_columns();
    assert_eq!(parse_selection(&table, "e, a")?, vec!["a", "e"]);
    assert_eq!(parse_selection(&table, "b,b")?, vec!["b"]);
    Ok(())
}

#[test]
fn test_existing_names_win_over_positions() -> Result<()> {
    let table = Table::new(vec![
        ints("3", &[Some(1)]),
        ints("x", &[Some(2)]),
        ints("y", &[Some(3)]),
    ])?;
    assert_eq!(parse_selection(&table, "3")?, vec!["3"]);
    assert_eq!(parse_selection(&table, "1-2")?, vec!["3", "x"]);
    Ok(())
}

#[test]
fn test_invalid_tokens() {
    let table = five_columns();
    for spec in ["4-2", "1,,2", "", "a,2", "one", "-3", "2-"] {
        assert!(
            matches!(
                parse_selection(&table, spec),
                Err(EngineError::InvalidSelectionToken(_))
            ),
            "spec {spec:?} should be invalid"
        );
    }
}

#[test]
fn test_out_of_range() {
    let table = five_columns();
    match parse_selection(&table, "2-9") {
        Err(EngineError::SelectionOutOfRange {
            token,
            index,
            column_count,
        }) => {
            assert_eq!(token, "2-9");
            assert_eq!((index, column_count), (9, 5));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        parse_selection(&table, "0"),
        Err(EngineError::SelectionOutOfRange { index: 0, .. })
    ));
    for spec in ["99999999999999999999999", "2-99999999999999999999999"] {
        assert!(
            matches!(
                parse_selection(&table, spec),
                Err(EngineError::SelectionOutOfRange { column_count: 5, .. })
            ),
            "spec {spec:?} should be out of range"
        );
    }
}

#[test]
fn test_select_projects_columns() -> Result<()> {
    let table = five_columns();
    let names = parse_selection(&table, "2,5")?;
    let projected = select(&table, &names)?;
    assert_eq!(projected.column_names(), vec!["b", "e"]);
    assert_eq!(projected.row_count(), 1);
    Ok(())
}
