//! Transform trait and pipeline for serializable table transformations.
//!
//! A pipeline is stored as JSON: an ordered list of [`TransformSpec`]s, each a
//! transform type plus a parameter map. Every spec is instantiated before any
//! runs, so a bad pipeline is rejected without touching the table.
//!
//! ```
//! use brisket::analyser::pipeline::TransformPipeline;
//!
//! let json = r#"{"transforms": [
//!     {"transform_type": "filter_rows", "parameters": {"expression": "value > 100"}},
//!     {"transform_type": "sort", "parameters": {"column": "value", "ascending": false}}
//! ]}"#;
//! let pipeline = TransformPipeline::from_json(json).unwrap();
//! assert_eq!(pipeline.len(), 2);
//! ```

use crate::analyser::logic::aggregation::{AggregateOp, group_by};
use crate::analyser::logic::cleaning::{
    FillStatistic, FillValue, MissingStrategy, drop_incomplete_rows, handle_missing_with,
};
use crate::analyser::logic::selection::parse_selection;
use crate::analyser::logic::table::Table;
use crate::analyser::logic::transforms::{apply_formula_with, filter_with, sort_by};
use crate::config::InferenceSettings;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Parameters = BTreeMap<String, Value>;

/// A single deterministic table transformation.
pub trait Transform: Send + Sync {
    fn apply(&self, table: &Table, settings: &InferenceSettings) -> Result<Table>;

    fn name(&self) -> &'static str;

    /// Parameters in the shape `from_parameters` reads back
    fn parameters(&self) -> Parameters;

    fn description(&self) -> String;

    fn to_spec(&self) -> TransformSpec {
        TransformSpec {
            transform_type: self.name().to_owned(),
            parameters: self.parameters(),
        }
    }
}

/// A pipeline of transforms applied sequentially
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformPipeline {
    transforms: Vec<TransformSpec>,
}

/// Serializable specification of a transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub transform_type: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl TransformPipeline {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(transforms: Vec<TransformSpec>) -> Self {
        Self { transforms }
    }

    pub fn add(&mut self, spec: TransformSpec) {
        self.transforms.push(spec);
    }

    pub fn push<T: Transform>(&mut self, transform: &T) {
        self.transforms.push(transform.to_spec());
    }

    pub fn apply(&self, table: &Table) -> Result<Table> {
        self.apply_with(table, &InferenceSettings::default())
    }

    /// Runs every step in order. Fails on the first error without a partial result.
    pub fn apply_with(&self, table: &Table, settings: &InferenceSettings) -> Result<Table> {
        let steps = self
            .transforms
            .iter()
            .map(instantiate_transform)
            .collect::<Result<Vec<_>>>()?;

        let mut current = table.clone();
        for (step, transform) in steps.iter().enumerate() {
            current = transform.apply(&current, settings).map_err(|cause| {
                EngineError::TransformFailed {
                    step,
                    transform: transform.name().to_owned(),
                    cause: Box::new(cause),
                }
            })?;
        }
        Ok(current)
    }

    /// One line per step, for display
    pub fn describe(&self) -> Result<Vec<String>> {
        self.transforms
            .iter()
            .map(|spec| instantiate_transform(spec).map(|t| t.description()))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidTransform(format!("Malformed pipeline: {e}")))
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformSpec> {
        self.transforms.iter()
    }
}

/// Instantiate a concrete transform from a spec
pub fn instantiate_transform(spec: &TransformSpec) -> Result<Box<dyn Transform>> {
    let params = &spec.parameters;
    match spec.transform_type.as_str() {
        "filter_rows" => Ok(Box::new(FilterRowsTransform::from_parameters(params)?)),
        "select_columns" => Ok(Box::new(SelectColumnsTransform::from_parameters(params)?)),
        "sort" => Ok(Box::new(SortTransform::from_parameters(params)?)),
        "group_by" => Ok(Box::new(GroupByTransform::from_parameters(params)?)),
        "handle_missing" => Ok(Box::new(HandleMissingTransform::from_parameters(params)?)),
        "apply_formula" => Ok(Box::new(ApplyFormulaTransform::from_parameters(params)?)),
        "drop_missing" => Ok(Box::new(DropMissingTransform)),
        other => Err(EngineError::InvalidTransform(format!(
            "Unknown transform type: {other}"
        ))),
    }
}

fn required_str<'a>(params: &'a Parameters, transform: &str, key: &str) -> Result<&'a str> {
    params.get(key).and_then(Value::as_str).ok_or_else(|| {
        EngineError::InvalidTransform(format!("{transform}: missing string parameter '{key}'"))
    })
}

fn param(value: &str) -> Value {
    Value::String(value.to_owned())
}

// CONCRETE TRANSFORMS

/// Keep rows matching a filter expression
#[derive(Debug, Clone)]
pub struct FilterRowsTransform {
    expression: String,
}

impl FilterRowsTransform {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        Ok(Self::new(required_str(params, "filter_rows", "expression")?))
    }
}

impl Transform for FilterRowsTransform {
    fn apply(&self, table: &Table, settings: &InferenceSettings) -> Result<Table> {
        filter_with(table, &self.expression, settings)
    }

    fn name(&self) -> &'static str {
        "filter_rows"
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([("expression".to_owned(), param(&self.expression))])
    }

    fn description(&self) -> String {
        format!("Filter rows where: {}", self.expression)
    }
}

/// Keep the columns named by a selection spec such as `"1,3-4"`
#[derive(Debug, Clone)]
pub struct SelectColumnsTransform {
    selection: String,
}

impl SelectColumnsTransform {
    pub fn new(selection: impl Into<String>) -> Self {
        Self {
            selection: selection.into(),
        }
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        Ok(Self::new(required_str(params, "select_columns", "selection")?))
    }
}

impl Transform for SelectColumnsTransform {
    fn apply(&self, table: &Table, _settings: &InferenceSettings) -> Result<Table> {
        let names = parse_selection(table, &self.selection)?;
        table.select(&names)
    }

    fn name(&self) -> &'static str {
        "select_columns"
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([("selection".to_owned(), param(&self.selection))])
    }

    fn description(&self) -> String {
        format!("Select columns {}", self.selection)
    }
}

#[derive(Debug, Clone)]
pub struct SortTransform {
    column: String,
    ascending: bool,
}

impl SortTransform {
    pub fn new(column: impl Into<String>, ascending: bool) -> Self {
        Self {
            column: column.into(),
            ascending,
        }
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let column = required_str(params, "sort", "column")?;
        let ascending = match params.get("ascending") {
            None => true,
            Some(value) => value.as_bool().ok_or_else(|| {
                EngineError::InvalidTransform("sort: 'ascending' must be a boolean".to_owned())
            })?,
        };
        Ok(Self::new(column, ascending))
    }
}

impl Transform for SortTransform {
    fn apply(&self, table: &Table, _settings: &InferenceSettings) -> Result<Table> {
        sort_by(table, &self.column, self.ascending)
    }

    fn name(&self) -> &'static str {
        "sort"
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("column".to_owned(), param(&self.column)),
            ("ascending".to_owned(), Value::Bool(self.ascending)),
        ])
    }

    fn description(&self) -> String {
        let direction = if self.ascending {
            "ascending"
        } else {
            "descending"
        };
        format!("Sort by {} ({direction})", self.column)
    }
}

#[derive(Debug, Clone)]
pub struct GroupByTransform {
    key: String,
    operation: AggregateOp,
}

impl GroupByTransform {
    pub fn new(key: impl Into<String>, operation: AggregateOp) -> Self {
        Self {
            key: key.into(),
            operation,
        }
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let key = required_str(params, "group_by", "key")?;
        let operation = required_str(params, "group_by", "operation")?
            .parse::<AggregateOp>()
            .map_err(|e| EngineError::InvalidTransform(format!("group_by: {e}")))?;
        Ok(Self::new(key, operation))
    }
}

impl Transform for GroupByTransform {
    fn apply(&self, table: &Table, _settings: &InferenceSettings) -> Result<Table> {
        group_by(table, &self.key, self.operation)
    }

    fn name(&self) -> &'static str {
        "group_by"
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("key".to_owned(), param(&self.key)),
            ("operation".to_owned(), param(self.operation.as_str())),
        ])
    }

    fn description(&self) -> String {
        format!("Group by {} and take the {}", self.key, self.operation)
    }
}

/// Drop or fill missing cells. `strategy` is `drop`, `fill` (with `value`),
/// `mean`, `median` or `mode`.
#[derive(Debug, Clone)]
pub struct HandleMissingTransform {
    strategy: MissingStrategy,
}

impl HandleMissingTransform {
    pub fn new(strategy: MissingStrategy) -> Self {
        Self { strategy }
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let strategy = match required_str(params, "handle_missing", "strategy")? {
            "drop" => MissingStrategy::Drop,
            "fill" => MissingStrategy::Fill(FillValue::Literal(
                required_str(params, "handle_missing", "value")?.to_owned(),
            )),
            other => {
                let stat = other.parse::<FillStatistic>().map_err(|_| {
                    EngineError::InvalidTransform(format!(
                        "handle_missing: unknown strategy '{other}'"
                    ))
                })?;
                MissingStrategy::Fill(FillValue::Statistic(stat))
            }
        };
        Ok(Self { strategy })
    }
}

impl Transform for HandleMissingTransform {
    fn apply(&self, table: &Table, settings: &InferenceSettings) -> Result<Table> {
        handle_missing_with(table, &self.strategy, settings)
    }

    fn name(&self) -> &'static str {
        "handle_missing"
    }

    fn parameters(&self) -> Parameters {
        match &self.strategy {
            MissingStrategy::Drop => Parameters::from([("strategy".to_owned(), param("drop"))]),
            MissingStrategy::Fill(FillValue::Literal(value)) => Parameters::from([
                ("strategy".to_owned(), param("fill")),
                ("value".to_owned(), param(value)),
            ]),
            MissingStrategy::Fill(FillValue::Statistic(stat)) => {
                Parameters::from([("strategy".to_owned(), param(&stat.to_string()))])
            }
        }
    }

    fn description(&self) -> String {
        match &self.strategy {
            MissingStrategy::Drop => "Drop rows with missing values".to_owned(),
            MissingStrategy::Fill(FillValue::Literal(value)) => {
                format!("Fill missing values with '{value}'")
            }
            MissingStrategy::Fill(FillValue::Statistic(stat)) => {
                format!("Fill missing values with the column {stat}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplyFormulaTransform {
    target: String,
    expression: String,
}

impl ApplyFormulaTransform {
    pub fn new(target: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            expression: expression.into(),
        }
    }

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        Ok(Self::new(
            required_str(params, "apply_formula", "target")?,
            required_str(params, "apply_formula", "expression")?,
        ))
    }
}

impl Transform for ApplyFormulaTransform {
    fn apply(&self, table: &Table, settings: &InferenceSettings) -> Result<Table> {
        apply_formula_with(table, &self.target, &self.expression, settings)
    }

    fn name(&self) -> &'static str {
        "apply_formula"
    }

    fn parameters(&self) -> Parameters {
        Parameters::from([
            ("target".to_owned(), param(&self.target)),
            ("expression".to_owned(), param(&self.expression)),
        ])
    }

    fn description(&self) -> String {
        format!("Set {} = {}", self.target, self.expression)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DropMissingTransform;

impl Transform for DropMissingTransform {
    fn apply(&self, table: &Table, _settings: &InferenceSettings) -> Result<Table> {
        Ok(drop_incomplete_rows(table))
    }

    fn name(&self) -> &'static str {
        "drop_missing"
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn description(&self) -> String {
        "Drop rows with missing values".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::sample::example_dataset;

    #[test]
    fn test_empty_pipeline() -> Result<()> {
        let pipeline = TransformPipeline::empty();
        assert!(pipeline.is_empty());
        let table = example_dataset(4)?;
        assert_eq!(pipeline.apply(&table)?, table);
        Ok(())
    }

    #[test]
    fn test_pipeline_serialization() -> Result<()> {
        let mut pipeline = TransformPipeline::empty();
        pipeline.push(&FilterRowsTransform::new("value > 100"));
        pipeline.push(&SortTransform::new("value", false));
        pipeline.push(&HandleMissingTransform::new(MissingStrategy::Fill(
            FillValue::Statistic(FillStatistic::Median),
        )));

        let json = pipeline.to_json()?;
        let restored = TransformPipeline::from_json(&json)?;
        assert_eq!(restored, pipeline);
        assert_eq!(restored.describe()?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_unknown_transform_rejected() {
        let spec = TransformSpec {
            transform_type: "shell".to_owned(),
            parameters: Parameters::new(),
        };
        let pipeline = TransformPipeline::new(vec![spec]);
        let table = example_dataset(3).expect("example");
        assert!(matches!(
            pipeline.apply(&table),
            Err(EngineError::InvalidTransform(_))
        ));
    }

    #[test]
    fn test_missing_parameter_rejected() {
        let spec = TransformSpec {
            transform_type: "sort".to_owned(),
            parameters: Parameters::from([("ascending".to_owned(), Value::Bool(true))]),
        };
        assert!(matches!(
            instantiate_transform(&spec),
            Err(EngineError::InvalidTransform(_))
        ));
    }

    #[test]
    fn test_failing_step_is_reported() -> Result<()> {
        let mut pipeline = TransformPipeline::empty();
        pipeline.push(&SortTransform::new("value", true));
        pipeline.push(&GroupByTransform::new("category", AggregateOp::Sum));

        let table = example_dataset(6)?;
        match pipeline.apply(&table) {
            Err(EngineError::TransformFailed {
                step,
                transform,
                cause,
            }) => {
                assert_eq!(step, 1);
                assert_eq!(transform, "group_by");
                assert!(matches!(*cause, EngineError::UnsupportedAggregation { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }
}
