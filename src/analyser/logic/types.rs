use chrono::{NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Output format for date-time cells that carry a time of day.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Output format for date-time cells at midnight.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum LogicalType {
    Integer,
    Float,
    Boolean,
    String,
    DateTime,
    Categorical,
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Categorical => "Categorical",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Categorical)
    }
}

/// A single typed-or-missing value at a (row, column) position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    DateTime(NaiveDateTime),
    Categorical(String),
    Missing,
}

impl Cell {
    /// The logical type this cell carries, `None` for `Missing`.
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            Self::Integer(_) => Some(LogicalType::Integer),
            Self::Float(_) => Some(LogicalType::Float),
            Self::Boolean(_) => Some(LogicalType::Boolean),
            Self::String(_) => Some(LogicalType::String),
            Self::DateTime(_) => Some(LogicalType::DateTime),
            Self::Categorical(_) => Some(LogicalType::Categorical),
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Name used in type-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        self.logical_type().map_or("Missing", |t| t.as_str())
    }

    /// Hashable identity used for grouping and distinct counts.
    pub fn key(&self) -> CellKey {
        match self {
            Self::Integer(v) => CellKey::Integer(*v),
            Self::Float(v) => {
                // -0.0 and 0.0 group together, as do all NaNs
                let canonical = if *v == 0.0 {
                    0.0
                } else if v.is_nan() {
                    f64::NAN
                } else {
                    *v
                };
                CellKey::Float(canonical.to_bits())
            }
            Self::Boolean(b) => CellKey::Boolean(*b),
            Self::String(s) | Self::Categorical(s) => CellKey::Text(s.clone()),
            Self::DateTime(dt) => CellKey::DateTime(*dt),
            Self::Missing => CellKey::Missing,
        }
    }
}

/// Formats a float so it always reads back as a float (`2.0`, never `2`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    if value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0 {
        value.format(DATE_FORMAT).to_string()
    } else {
        value.format(DATETIME_FORMAT).to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{}", format_float(*v)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) | Self::Categorical(s) => write!(f, "{s}"),
            Self::DateTime(dt) => write!(f, "{}", format_datetime(dt)),
            Self::Missing => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellKey {
    Integer(i64),
    Float(u64),
    Boolean(bool),
    Text(String),
    DateTime(NaiveDateTime),
    Missing,
}

// SUMMARIES

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub logical_type: LogicalType,
    /// Non-missing cells
    pub count: usize,
    pub distinct: usize,
    pub missing: usize,
    pub missing_pct: f64,
    pub stats: ColumnStats,
}

#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub enum ColumnStats {
    Numeric(NumericStats),
    Temporal(TemporalStats),
    Text(TextStats),
}

#[derive(Clone, Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation; `None` below two values
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct TemporalStats {
    pub min: Option<NaiveDateTime>,
    pub max: Option<NaiveDateTime>,
}

#[derive(Clone, Deserialize, Serialize, Debug, Default, PartialEq)]
pub struct TextStats {
    /// Most frequent values, ties in first-seen order
    pub top_values: Vec<(String, usize)>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.data.get(i)?.get(j).copied()
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DatasetInfo {
    pub columns: usize,
    pub rows: usize,
    pub type_counts: BTreeMap<LogicalType, usize>,
    /// Rough in-memory footprint of the cells
    pub approximate_bytes: usize,
}
