//! Per-column type inference over raw text tokens.
//!
//! A column takes the first type in the priority order Integer, Float,
//! DateTime, Boolean that accepts *every* non-missing token; otherwise it is
//! Categorical when its cardinality is small, else String.

use super::table::Column;
use super::types::{Cell, LogicalType};
use crate::config::InferenceSettings;
use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

/// Token rules bound to a settings value.
#[derive(Clone, Copy)]
pub struct TokenRules<'a> {
    settings: &'a InferenceSettings,
}

impl<'a> TokenRules<'a> {
    pub fn new(settings: &'a InferenceSettings) -> Self {
        Self { settings }
    }

    pub fn is_missing(&self, token: &str) -> bool {
        let trimmed = token.trim();
        self.settings.missing_tokens.iter().any(|m| m == trimmed)
    }

    pub fn parse_integer(&self, token: &str) -> Option<i64> {
        token.trim().parse::<i64>().ok()
    }

    pub fn parse_float(&self, token: &str) -> Option<f64> {
        let trimmed = token.trim();
        // rejects "inf" / "infinity", which Rust's parser would accept
        if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        // "1e999" overflows to infinity, which no writer can spell back
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn parse_boolean(&self, token: &str) -> Option<bool> {
        let trimmed = token.trim();
        if self.settings.true_tokens.iter().any(|t| t == trimmed) {
            Some(true)
        } else if self.settings.false_tokens.iter().any(|t| t == trimmed) {
            Some(false)
        } else {
            None
        }
    }

    pub fn parse_datetime(&self, token: &str) -> Option<NaiveDateTime> {
        let trimmed = token.trim();
        self.settings.datetime_formats.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(trimmed, format)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(trimmed, format)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        })
    }

    /// Converts one token into a cell of `logical_type`. Missing tokens become
    /// `Some(Cell::Missing)`; tokens the type rejects become `None`.
    pub fn coerce(&self, token: &str, logical_type: LogicalType) -> Option<Cell> {
        if self.is_missing(token) {
            return Some(Cell::Missing);
        }
        match logical_type {
            LogicalType::Integer => self.parse_integer(token).map(Cell::Integer),
            LogicalType::Float => self.parse_float(token).map(Cell::Float),
            LogicalType::Boolean => self.parse_boolean(token).map(Cell::Boolean),
            LogicalType::DateTime => self.parse_datetime(token).map(Cell::DateTime),
            LogicalType::String => Some(Cell::String(token.to_owned())),
            LogicalType::Categorical => Some(Cell::Categorical(token.to_owned())),
        }
    }

    pub fn infer<S: AsRef<str>>(&self, tokens: &[S]) -> LogicalType {
        let present: Vec<&str> = tokens
            .iter()
            .map(AsRef::as_ref)
            .filter(|t| !self.is_missing(t))
            .collect();

        if present.is_empty() {
            return LogicalType::String;
        }
        if present.iter().all(|t| self.parse_integer(t).is_some()) {
            return LogicalType::Integer;
        }
        if present.iter().all(|t| self.parse_float(t).is_some()) {
            return LogicalType::Float;
        }
        if present.iter().all(|t| self.parse_datetime(t).is_some()) {
            return LogicalType::DateTime;
        }
        if present.iter().all(|t| self.parse_boolean(t).is_some()) {
            return LogicalType::Boolean;
        }

        let distinct = present.iter().collect::<HashSet<_>>().len();
        let ratio = distinct as f64 / present.len() as f64;
        if distinct <= self.settings.categorical_max_distinct
            && ratio <= self.settings.categorical_max_ratio
        {
            LogicalType::Categorical
        } else {
            LogicalType::String
        }
    }

    /// Infers the column type and converts every token.
    pub fn build_column<S: AsRef<str>>(&self, name: &str, tokens: &[S]) -> Result<Column> {
        let logical_type = self.infer(tokens);
        let cells = tokens
            .iter()
            .map(|t| {
                // inference accepted every present token, so coercion cannot fail
                self.coerce(t.as_ref(), logical_type)
                    .unwrap_or(Cell::Missing)
            })
            .collect();
        Column::new(name, logical_type, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(tokens: &[&str]) -> LogicalType {
        let settings = InferenceSettings::default();
        TokenRules::new(&settings).infer(tokens)
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(infer(&["1", "2", "-3"]), LogicalType::Integer);
        assert_eq!(infer(&["1", "2.5"]), LogicalType::Float);
        assert_eq!(infer(&["1e3", "2"]), LogicalType::Float);
        assert_eq!(
            infer(&["2023-01-01", "2023-01-02 10:00:00"]),
            LogicalType::DateTime
        );
        assert_eq!(infer(&["true", "False", "TRUE"]), LogicalType::Boolean);
        // 0/1 parse as integers first
        assert_eq!(infer(&["0", "1"]), LogicalType::Integer);
    }

    #[test]
    fn test_missing_tokens_are_ignored() {
        assert_eq!(infer(&["1", "", "NA", "3"]), LogicalType::Integer);
        assert_eq!(infer(&["", "NaN", "null"]), LogicalType::String);
        assert_eq!(infer(&[]), LogicalType::String);
    }

    #[test]
    fn test_infinity_is_not_a_float() {
        assert_eq!(infer(&["inf", "1.0", "infinity"]), LogicalType::String);
        assert_eq!(infer(&["1e999", "2.5"]), LogicalType::String);
        assert_eq!(infer(&["-1e400"]), LogicalType::String);
        assert_eq!(infer(&["1e300", "2.5"]), LogicalType::Float);
    }

    #[test]
    fn test_categorical_threshold() {
        assert_eq!(
            infer(&["A", "B", "A", "B", "A", "C"]),
            LogicalType::Categorical
        );
        assert_eq!(infer(&["alice", "bob", "carol"]), LogicalType::String);
    }

    #[test]
    fn test_coerce_respects_type() {
        let settings = InferenceSettings::default();
        let rules = TokenRules::new(&settings);
        assert_eq!(
            rules.coerce(" 42 ", LogicalType::Integer),
            Some(Cell::Integer(42))
        );
        assert_eq!(rules.coerce("4.5", LogicalType::Integer), None);
        assert_eq!(rules.coerce("NA", LogicalType::Float), Some(Cell::Missing));
        assert_eq!(rules.coerce("yes", LogicalType::Boolean), None);
        let midnight = NaiveDate::from_ymd_opt(2024, 2, 29)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(
            rules.coerce("29/02/2024", LogicalType::DateTime),
            Some(Cell::DateTime(midnight))
        );
    }

    #[test]
    fn test_build_column_converts_tokens() -> Result<()> {
        let settings = InferenceSettings::default();
        let column = TokenRules::new(&settings).build_column("n", &["1", "", "3"])?;
        assert_eq!(column.logical_type(), LogicalType::Integer);
        assert_eq!(
            column.cells(),
            &[Cell::Integer(1), Cell::Missing, Cell::Integer(3)]
        );
        Ok(())
    }
}
