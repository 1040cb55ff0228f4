//! Integration tests for the file-level workflow
//!
//! These tests load the fixture files under `testdata/`, run analyses and
//! transformations through the public API, and write results to temporary
//! directories.

use anyhow::Result;
use brisket::analyser::logic::{
    self, Cell, FillStatistic, FillValue, LogicalType, MissingStrategy, Table,
};
use brisket::analyser::pipeline::TransformPipeline;
use brisket::config::{EngineSettings, InferenceSettings, load_settings, save_settings};
use brisket::error::EngineError;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

fn load_fixture(name: &str) -> Result<Table> {
    Ok(logic::load_path(
        &fixture(name),
        &InferenceSettings::default(),
    )?)
}

#[test]
fn test_describe_clean_csv() -> Result<()> {
    let table = load_fixture("clean.csv")?;
    assert_eq!(table.row_count(), 10, "Should have 10 rows");
    assert_eq!(table.column_count(), 6, "Should have 6 columns");

    let summaries = logic::describe(&table);
    assert_eq!(summaries.len(), 6, "Should have 6 column summaries");
    assert!(summaries.iter().all(|s| s.missing == 0));

    let types: Vec<(String, LogicalType)> = summaries
        .iter()
        .map(|s| (s.name.clone(), s.logical_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("id".to_owned(), LogicalType::Integer),
            ("name".to_owned(), LogicalType::String),
            ("age".to_owned(), LogicalType::Integer),
            ("email".to_owned(), LogicalType::String),
            ("salary".to_owned(), LogicalType::Float),
            ("department".to_owned(), LogicalType::Categorical),
        ]
    );

    let matrix = logic::correlations(&table)?;
    assert_eq!(matrix.columns, vec!["id", "age", "salary"]);
    // older staff earn more in the fixture
    assert!(matrix.get("age", "salary").unwrap_or_default() > 0.9);
    Ok(())
}

#[test]
fn test_missing_values_csv() -> Result<()> {
    let table = load_fixture("missing_values.csv")?;
    assert_eq!(table.row_count(), 10);

    let total: usize = logic::missing_counts(&table).iter().map(|(_, n)| n).sum();
    assert_eq!(total, 8, "Should detect every missing token");

    let dropped = logic::handle_missing(&table, &MissingStrategy::Drop)?;
    assert_eq!(dropped.row_count(), 2);

    let filled = logic::handle_missing(
        &table,
        &MissingStrategy::Fill(FillValue::Statistic(FillStatistic::Mean)),
    )?;
    let age = filled.require_column("age")?;
    assert_eq!(age.logical_type(), LogicalType::Float);
    assert_eq!(age.missing_count(), 0);
    // text columns keep their gaps under a mean fill
    assert_eq!(filled.require_column("email")?.missing_count(), 2);
    Ok(())
}

#[test]
fn test_round_trip_through_files() -> Result<()> {
    let table = load_fixture("clean.csv")?;
    let dir = TempDir::new()?;

    for file_name in ["out.csv", "out.xlsx", "out.json"] {
        let path = dir.path().join(file_name);
        logic::save_path(&table, &path)?;
        let reloaded = logic::load_path(&path, &InferenceSettings::default())?;
        assert_eq!(reloaded, table, "round trip through {file_name}");
    }
    Ok(())
}

#[test]
fn test_unsupported_extension() -> Result<()> {
    let table = load_fixture("clean.csv")?;
    let dir = TempDir::new()?;
    assert!(logic::save_path(&table, &dir.path().join("out.parquet")).is_err());
    Ok(())
}

#[test]
fn test_settings_file_drives_inference() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");

    let mut settings = EngineSettings::default();
    settings.inference.missing_tokens = vec![String::new()];
    save_settings(&settings, &path)?;
    let settings = load_settings(&path)?;

    let table = logic::load_path(&fixture("missing_values.csv"), &settings.inference)?;
    // "N/A" is no longer missing, so age turns into text
    assert_eq!(
        table.require_column("age")?.logical_type(),
        LogicalType::String
    );
    assert_eq!(table.require_column("age")?.missing_count(), 1);
    Ok(())
}

#[test]
fn test_pipeline_from_json() -> Result<()> {
    let json = r#"{"transforms": [
        {"transform_type": "filter_rows", "parameters": {"expression": "salary > 50000"}},
        {"transform_type": "apply_formula", "parameters": {"target": "monthly", "expression": "round(salary / 12, 2)"}},
        {"transform_type": "select_columns", "parameters": {"selection": "name,department,monthly"}},
        {"transform_type": "sort", "parameters": {"column": "monthly", "ascending": false}}
    ]}"#;
    let pipeline = TransformPipeline::from_json(json)?;
    assert_eq!(pipeline.len(), 4);

    let table = load_fixture("clean.csv")?;
    let result = pipeline.apply(&table)?;
    assert_eq!(result.column_names(), vec!["name", "department", "monthly"]);
    assert_eq!(result.row_count(), 6);
    assert_eq!(
        result.cell(0, 0),
        Some(&Cell::String("Finley Ross".to_owned()))
    );
    match result.cell(0, 2) {
        Some(Cell::Float(monthly)) => assert!((monthly - 6916.67).abs() < 1e-9),
        other => panic!("unexpected monthly value {other:?}"),
    }

    // the pipeline survives a save and reload
    let restored = TransformPipeline::from_json(&pipeline.to_json()?)?;
    assert_eq!(restored.apply(&table)?, result);
    // the input table is untouched
    assert_eq!(table, load_fixture("clean.csv")?);
    Ok(())
}

#[test]
fn test_pipeline_failure_names_the_step() -> Result<()> {
    let json = r#"{"transforms": [
        {"transform_type": "drop_missing"},
        {"transform_type": "group_by", "parameters": {"key": "department", "operation": "sum"}}
    ]}"#;
    let pipeline = TransformPipeline::from_json(json)?;
    let table = load_fixture("missing_values.csv")?;

    match pipeline.apply(&table) {
        Err(EngineError::TransformFailed {
            step,
            transform,
            cause,
        }) => {
            assert_eq!(step, 1);
            assert_eq!(transform, "group_by");
            assert!(matches!(
                *cause,
                EngineError::UnsupportedAggregation { .. }
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}
