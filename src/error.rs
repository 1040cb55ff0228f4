//! Centralized error handling for the brisket engine.
//!
//! Every public engine operation either returns a fully valid value or fails
//! with one [`EngineError`]. Variants carry structured context (column name,
//! row number, offending token) so callers can build their own messages
//! without re-deriving anything.
//!
//! ```
//! use brisket::error::EngineError;
//!
//! fn describe(err: &EngineError) -> String {
//!     match err {
//!         EngineError::ColumnNotFound(name) => format!("no column named {name}"),
//!         EngineError::MalformedRow { row, .. } => format!("check row {row}"),
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! The `ResultExt` trait adds `.context()` to any `Result` whose error converts
//! into [`EngineError`]:
//!
//! ```no_run
//! use brisket::error::ResultExt as _;
//!
//! fn read_source() -> brisket::error::Result<Vec<u8>> {
//!     std::fs::read("data.csv").context("Failed to read dataset")
//! }
//! ```

use std::fmt;

/// Main error type for engine operations.
#[derive(Debug)]
pub enum EngineError {
    /// Source had no bytes, no data rows, or could not be decoded at all.
    EmptyOrMalformedInput(String),

    /// A data row whose cell count differs from the header (1-based row number).
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    ColumnNotFound(String),

    NoNumericColumns,

    SelectionOutOfRange {
        token: String,
        index: usize,
        column_count: usize,
    },

    InvalidSelectionToken(String),

    /// Expression text failed to lex, parse or bind. `position` is a byte offset.
    InvalidExpression {
        message: String,
        position: usize,
        fragment: String,
    },

    UnknownColumn(String),

    TypeMismatch {
        operation: String,
        left: String,
        right: String,
    },

    UnsupportedAggregation {
        column: String,
        operation: String,
    },

    FillTypeMismatch {
        column: String,
        value: String,
    },

    /// A formula failed on one row (0-based). No partial column is produced.
    FormulaEvaluationError {
        row: usize,
        cause: Box<EngineError>,
    },

    DivisionByZero,

    NumericOverflow,

    /// A column or table violated a structural invariant during construction.
    InvalidTable(String),

    InvalidTransform(String),

    TransformFailed {
        step: usize,
        transform: String,
        cause: Box<EngineError>,
    },

    /// I/O errors from the path-based helpers
    Io(std::io::Error),

    /// Encoder failures while saving
    Serialization(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyOrMalformedInput(msg) => write!(f, "Empty or malformed input: {msg}"),
            Self::MalformedRow {
                row,
                expected,
                found,
            } => write!(
                f,
                "Malformed row {row}: expected {expected} cells, found {found}"
            ),
            Self::ColumnNotFound(name) => write!(f, "Column not found: '{name}'"),
            Self::NoNumericColumns => write!(f, "No numeric columns to correlate"),
            Self::SelectionOutOfRange {
                token,
                index,
                column_count,
            } => write!(
                f,
                "Selection '{token}' is out of range: {index} not in 1..={column_count}"
            ),
            Self::InvalidSelectionToken(token) => {
                write!(f, "Invalid selection token: '{token}'")
            }
            Self::InvalidExpression {
                message,
                position,
                fragment,
            } => write!(
                f,
                "Invalid expression at position {position} near '{fragment}': {message}"
            ),
            Self::UnknownColumn(name) => write!(f, "Unknown column in expression: '{name}'"),
            Self::TypeMismatch {
                operation,
                left,
                right,
            } => write!(f, "Type mismatch: cannot apply '{operation}' to {left} and {right}"),
            Self::UnsupportedAggregation { column, operation } => write!(
                f,
                "Unsupported aggregation '{operation}' for column '{column}'"
            ),
            Self::FillTypeMismatch { column, value } => write!(
                f,
                "Fill value '{value}' does not match the type of column '{column}'"
            ),
            Self::FormulaEvaluationError { row, cause } => {
                write!(f, "Formula failed at row {row}: {cause}")
            }
            Self::DivisionByZero => write!(f, "Division by zero"),
            Self::NumericOverflow => write!(f, "Integer overflow"),
            Self::InvalidTable(msg) => write!(f, "Invalid table: {msg}"),
            Self::InvalidTransform(msg) => write!(f, "Invalid transform: {msg}"),
            Self::TransformFailed {
                step,
                transform,
                cause,
            } => write!(f, "Transform {step} ({transform}) failed: {cause}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::FormulaEvaluationError { cause, .. } | Self::TransformFailed { cause, .. } => {
                Some(cause.as_ref())
            }
            _ => None,
        }
    }
}

impl EngineError {
    pub(crate) fn type_mismatch(
        operation: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            left: left.into(),
            right: right.into(),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        Self::EmptyOrMalformedInput(err.to_string())
    }
}

impl From<calamine::XlsxError> for EngineError {
    fn from(err: calamine::XlsxError) -> Self {
        Self::EmptyOrMalformedInput(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for EngineError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<EngineError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: EngineError = e.into();
            EngineError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: EngineError = e.into();
            EngineError::Other(format!("{}: {}", f(), err))
        })
    }
}
