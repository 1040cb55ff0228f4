//! Resolves a parsed expression against a table before any row is evaluated.
//!
//! After binding, identifiers are column indices, function arities are
//! checked, and string literals compared against date-time columns are
//! already date-times. Nothing outside the table's columns, the function
//! allow-list and literals can appear in a bound tree.

use super::ast::{BinaryOp, Expr, ExprKind, Function, Literal, UnaryOp};
use crate::analyser::logic::inference::TokenRules;
use crate::analyser::logic::table::Table;
use crate::analyser::logic::types::{Cell, LogicalType};
use crate::error::{EngineError, Result};

/// Name a formula may use for the column it is writing.
pub const IMPLICIT_IDENTIFIER: &str = "x";

#[derive(Clone, Debug, PartialEq)]
pub enum Bound {
    Literal(Cell),
    Column(usize),
    Unary {
        op: UnaryOp,
        operand: Box<Bound>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Bound>,
        right: Box<Bound>,
    },
    Call {
        function: Function,
        args: Vec<Bound>,
    },
}

pub struct Binder<'a> {
    table: &'a Table,
    /// Column `x` stands for, when the table has no column named `x`
    implicit_target: Option<&'a str>,
    rules: TokenRules<'a>,
}

impl<'a> Binder<'a> {
    pub fn new(table: &'a Table, rules: TokenRules<'a>) -> Self {
        Self {
            table,
            implicit_target: None,
            rules,
        }
    }

    pub fn with_implicit_target(mut self, target: &'a str) -> Self {
        self.implicit_target = Some(target);
        self
    }

    pub fn bind(&self, expr: &Expr) -> Result<Bound> {
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(Bound::Literal(literal_cell(lit))),
            ExprKind::Identifier(name) => self.resolve(name).map(Bound::Column),
            ExprKind::Unary { op, operand } => Ok(Bound::Unary {
                op: *op,
                operand: Box::new(self.bind(operand)?),
            }),
            ExprKind::Binary { op, left, right } => {
                let mut left_bound = self.bind(left)?;
                let mut right_bound = self.bind(right)?;
                if op.is_comparison() {
                    self.coerce_date_literal(&mut right_bound, &left_bound, right)?;
                    self.coerce_date_literal(&mut left_bound, &right_bound, left)?;
                }
                Ok(Bound::Binary {
                    op: *op,
                    left: Box::new(left_bound),
                    right: Box::new(right_bound),
                })
            }
            ExprKind::Call { function, args } => {
                function.check_arity(args.len(), expr.position)?;
                let args = args
                    .iter()
                    .map(|a| self.bind(a))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Bound::Call {
                    function: *function,
                    args,
                })
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<usize> {
        if let Some(index) = self.table.column_index(name) {
            return Ok(index);
        }
        if name == IMPLICIT_IDENTIFIER
            && let Some(index) = self
                .implicit_target
                .and_then(|target| self.table.column_index(target))
        {
            return Ok(index);
        }
        Err(EngineError::UnknownColumn(name.to_owned()))
    }

    /// Turns a string literal into a date-time when the other side is a date-time column.
    fn coerce_date_literal(&self, side: &mut Bound, other: &Bound, source: &Expr) -> Result<()> {
        let Bound::Column(index) = other else {
            return Ok(());
        };
        let is_datetime = self
            .table
            .column_at(*index)
            .is_some_and(|c| c.logical_type() == LogicalType::DateTime);
        if !is_datetime {
            return Ok(());
        }
        if let Bound::Literal(Cell::String(text)) = side {
            let parsed = self.rules.parse_datetime(text).ok_or_else(|| {
                EngineError::InvalidExpression {
                    message: format!("'{text}' is not a recognised date-time"),
                    position: source.position,
                    fragment: text.clone(),
                }
            })?;
            *side = Bound::Literal(Cell::DateTime(parsed));
        }
        Ok(())
    }
}

fn literal_cell(lit: &Literal) -> Cell {
    match lit {
        Literal::Integer(v) => Cell::Integer(*v),
        Literal::Float(v) => Cell::Float(*v),
        Literal::Boolean(b) => Cell::Boolean(*b),
        Literal::String(s) => Cell::String(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::expr::parser::parse;
    use crate::analyser::logic::table::Column;
    use crate::config::InferenceSettings;

    fn table() -> Table {
        let day = chrono::NaiveDate::from_ymd_opt(2023, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("date");
        Table::new(vec![
            Column::new("price", LogicalType::Integer, vec![Cell::Integer(1)]).expect("column"),
            Column::new("when", LogicalType::DateTime, vec![Cell::DateTime(day)])
                .expect("column"),
        ])
        .expect("table")
    }

    fn bind(input: &str, target: Option<&str>) -> Result<Bound> {
        let table = table();
        let settings = InferenceSettings::default();
        let mut binder = Binder::new(&table, TokenRules::new(&settings));
        if let Some(target) = target {
            binder = binder.with_implicit_target(target);
        }
        binder.bind(&parse(input)?)
    }

    #[test]
    fn test_unknown_column() {
        assert!(matches!(
            bind("cost > 3", None),
            Err(EngineError::UnknownColumn(name)) if name == "cost"
        ));
    }

    #[test]
    fn test_implicit_identifier_only_for_formulas() {
        assert!(matches!(bind("x * 2", None), Err(EngineError::UnknownColumn(_))));
        assert!(matches!(
            bind("x * 2", Some("price")),
            Ok(Bound::Binary { left, .. }) if *left == Bound::Column(0)
        ));
        // a target that does not exist yet leaves `x` unresolved
        assert!(matches!(
            bind("x * 2", Some("new")),
            Err(EngineError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_arity_checked() {
        assert!(matches!(
            bind("abs(price, 2)", None),
            Err(EngineError::InvalidExpression { .. })
        ));
        assert!(matches!(
            bind("max()", None),
            Err(EngineError::InvalidExpression { .. })
        ));
        assert!(bind("max(price, 1, 2)", None).is_ok());
    }

    #[test]
    fn test_date_literals_are_parsed() {
        let bound = bind("when >= '2023-01-01'", None).expect("bind");
        let Bound::Binary { right, .. } = bound else {
            panic!("expected binary");
        };
        assert!(matches!(*right, Bound::Literal(Cell::DateTime(_))));

        assert!(matches!(
            bind("'soon' < when", None),
            Err(EngineError::InvalidExpression { position: 0, .. })
        ));
    }
}
