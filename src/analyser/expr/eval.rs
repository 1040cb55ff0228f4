//! Tree-walking evaluation of a bound expression for one row.
//!
//! In formulas, Missing operands propagate through arithmetic, comparisons and
//! function calls. In row predicates, a comparison or arithmetic step with a
//! Missing operand rejects the row outright. `and`/`or` use three-valued logic
//! and short-circuit.

use super::ast::{BinaryOp, Function, UnaryOp};
use super::binder::Bound;
use crate::analyser::logic::table::Table;
use crate::analyser::logic::types::Cell;
use crate::error::{EngineError, Result};
use std::cmp::Ordering;

/// How a comparison or arithmetic step treats a Missing operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// The step yields Missing
    Propagate,
    /// The whole row is rejected
    Predicate,
}

/// Evaluates a formula for one row. Missing operands yield Missing.
pub fn evaluate(bound: &Bound, table: &Table, row: usize) -> Result<Cell> {
    Ok(eval_node(bound, table, row, Mode::Propagate)?.unwrap_or(Cell::Missing))
}

/// Evaluates a row predicate.
///
/// Any comparison or arithmetic step that meets a Missing operand rejects the
/// row, whatever `not`, `and` or `or` surround it. Branches skipped by
/// short-circuiting are never evaluated and so never reject. A Missing final
/// value, such as a bare Boolean column with a gap, also rejects the row.
pub fn row_matches(bound: &Bound, table: &Table, row: usize) -> Result<bool> {
    match eval_node(bound, table, row, Mode::Predicate)? {
        Some(value) => Ok(truthiness(&value, "filter")? == Some(true)),
        None => Ok(false),
    }
}

/// `Ok(None)` means the row was rejected in predicate mode.
fn eval_node(bound: &Bound, table: &Table, row: usize, mode: Mode) -> Result<Option<Cell>> {
    match bound {
        Bound::Literal(cell) => Ok(Some(cell.clone())),
        Bound::Column(index) => Ok(Some(
            table.cell(row, *index).cloned().unwrap_or(Cell::Missing),
        )),
        Bound::Unary { op, operand } => {
            let Some(value) = eval_node(operand, table, row, mode)? else {
                return Ok(None);
            };
            match op {
                UnaryOp::Negate if mode == Mode::Predicate && value.is_missing() => Ok(None),
                UnaryOp::Negate => negate(value).map(Some),
                UnaryOp::Not => Ok(Some(match truthiness(&value, "not")? {
                    Some(b) => Cell::Boolean(!b),
                    None => Cell::Missing,
                })),
            }
        }
        Bound::Binary {
            op: op @ (BinaryOp::And | BinaryOp::Or),
            left,
            right,
        } => logical(*op, left, right, table, row, mode),
        Bound::Binary { op, left, right } => {
            let Some(l) = eval_node(left, table, row, mode)? else {
                return Ok(None);
            };
            let Some(r) = eval_node(right, table, row, mode)? else {
                return Ok(None);
            };
            if mode == Mode::Predicate && (l.is_missing() || r.is_missing()) {
                return Ok(None);
            }
            binary(*op, &l, &r).map(Some)
        }
        Bound::Call { function, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                let Some(value) = eval_node(arg, table, row, mode)? else {
                    return Ok(None);
                };
                values.push(value);
            }
            call(*function, &values).map(Some)
        }
    }
}

/// Boolean reading of a value: Booleans as is, numbers non-zero, Missing unknown.
pub fn truthiness(value: &Cell, operation: &str) -> Result<Option<bool>> {
    match value {
        Cell::Boolean(b) => Ok(Some(*b)),
        Cell::Integer(v) => Ok(Some(*v != 0)),
        Cell::Float(v) => Ok(Some(*v != 0.0)),
        Cell::Missing => Ok(None),
        other => Err(EngineError::type_mismatch(
            operation,
            other.type_name(),
            "Boolean",
        )),
    }
}

/// Kleene `and`/`or` with short-circuiting.
fn logical(
    op: BinaryOp,
    left: &Bound,
    right: &Bound,
    table: &Table,
    row: usize,
    mode: Mode,
) -> Result<Option<Cell>> {
    let Some(l) = eval_node(left, table, row, mode)? else {
        return Ok(None);
    };
    let l = truthiness(&l, op.symbol())?;
    let decisive = op == BinaryOp::Or;
    if l == Some(decisive) {
        return Ok(Some(Cell::Boolean(decisive)));
    }
    let Some(r) = eval_node(right, table, row, mode)? else {
        return Ok(None);
    };
    let r = truthiness(&r, op.symbol())?;
    Ok(Some(match (l, r) {
        (_, Some(v)) if v == decisive => Cell::Boolean(decisive),
        (Some(_), Some(_)) => Cell::Boolean(!decisive),
        _ => Cell::Missing,
    }))
}

fn negate(value: Cell) -> Result<Cell> {
    match value {
        Cell::Integer(v) => v
            .checked_neg()
            .map(Cell::Integer)
            .ok_or(EngineError::NumericOverflow),
        Cell::Float(v) => Ok(Cell::Float(-v)),
        Cell::Missing => Ok(Cell::Missing),
        other => Err(EngineError::type_mismatch("-", other.type_name(), "none")),
    }
}

fn binary(op: BinaryOp, l: &Cell, r: &Cell) -> Result<Cell> {
    if l.is_missing() || r.is_missing() {
        return Ok(Cell::Missing);
    }
    if op.is_comparison() {
        return compare(op, l, r).map(Cell::Boolean);
    }

    let mismatch = || EngineError::type_mismatch(op.symbol(), l.type_name(), r.type_name());

    if let (Cell::Integer(a), Cell::Integer(b)) = (l, r) {
        let (a, b) = (*a, *b);
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Subtract => a.checked_sub(b),
            BinaryOp::Multiply => a.checked_mul(b),
            BinaryOp::Divide => {
                if b == 0 {
                    return Err(EngineError::DivisionByZero);
                }
                return Ok(Cell::Float(a as f64 / b as f64));
            }
            BinaryOp::Modulo => return floored_mod_int(a, b).map(Cell::Integer),
            _ => return Err(mismatch()),
        };
        return result.map(Cell::Integer).ok_or(EngineError::NumericOverflow);
    }

    if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
        return match op {
            BinaryOp::Add => Ok(Cell::Float(a + b)),
            BinaryOp::Subtract => Ok(Cell::Float(a - b)),
            BinaryOp::Multiply => Ok(Cell::Float(a * b)),
            BinaryOp::Divide => {
                if b == 0.0 {
                    return Err(EngineError::DivisionByZero);
                }
                Ok(Cell::Float(a / b))
            }
            BinaryOp::Modulo => floored_mod_float(a, b).map(Cell::Float),
            _ => Err(mismatch()),
        };
    }

    if op == BinaryOp::Add
        && let (Some(a), Some(b)) = (l.as_text(), r.as_text())
    {
        return Ok(Cell::String(format!("{a}{b}")));
    }

    Err(mismatch())
}

/// Integer modulo taking the sign of the divisor.
fn floored_mod_int(a: i64, b: i64) -> Result<i64> {
    if b == 0 {
        return Err(EngineError::DivisionByZero);
    }
    let r = a.checked_rem(b).ok_or(EngineError::NumericOverflow)?;
    Ok(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
}

fn floored_mod_float(a: f64, b: f64) -> Result<f64> {
    if b == 0.0 {
        return Err(EngineError::DivisionByZero);
    }
    let r = a % b;
    Ok(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r })
}

/// Orders two non-missing cells. `None` when the values are unordered (NaN).
pub fn order(operation: &str, l: &Cell, r: &Cell) -> Result<Option<Ordering>> {
    match (l, r) {
        (Cell::Integer(a), Cell::Integer(b)) => Ok(Some(a.cmp(b))),
        (Cell::Boolean(a), Cell::Boolean(b)) => Ok(Some(a.cmp(b))),
        (Cell::DateTime(a), Cell::DateTime(b)) => Ok(Some(a.cmp(b))),
        _ => {
            if let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) {
                return Ok(a.partial_cmp(&b));
            }
            if let (Some(a), Some(b)) = (l.as_text(), r.as_text()) {
                return Ok(Some(a.cmp(b)));
            }
            Err(EngineError::type_mismatch(
                operation,
                l.type_name(),
                r.type_name(),
            ))
        }
    }
}

fn compare(op: BinaryOp, l: &Cell, r: &Cell) -> Result<bool> {
    let ordering = order(op.symbol(), l, r)?;
    Ok(match ordering {
        // NaN: only `!=` holds
        None => op == BinaryOp::NotEqual,
        Some(o) => match op {
            BinaryOp::Equal => o == Ordering::Equal,
            BinaryOp::NotEqual => o != Ordering::Equal,
            BinaryOp::LessThan => o == Ordering::Less,
            BinaryOp::LessThanOrEqual => o != Ordering::Greater,
            BinaryOp::GreaterThan => o == Ordering::Greater,
            BinaryOp::GreaterThanOrEqual => o != Ordering::Less,
            _ => false,
        },
    })
}

fn call(function: Function, args: &[Cell]) -> Result<Cell> {
    if args.iter().any(Cell::is_missing) {
        return Ok(Cell::Missing);
    }
    let name = function.name();
    let numeric = |cell: &Cell| {
        cell.as_f64()
            .ok_or_else(|| EngineError::type_mismatch(name, cell.type_name(), "Float"))
    };
    let first = args.first().ok_or_else(|| EngineError::InvalidExpression {
        message: format!("{name}() needs an argument"),
        position: 0,
        fragment: name.to_owned(),
    })?;

    match function {
        Function::Abs => match first {
            Cell::Integer(v) => v
                .checked_abs()
                .map(Cell::Integer)
                .ok_or(EngineError::NumericOverflow),
            other => Ok(Cell::Float(numeric(other)?.abs())),
        },
        Function::Sqrt => Ok(Cell::Float(numeric(first)?.sqrt())),
        Function::Log => {
            let n = numeric(first)?;
            let base = args.get(1).map(numeric).transpose()?;
            if n <= 0.0 || base.is_some_and(|b| b <= 0.0) {
                return Ok(Cell::Float(f64::NAN));
            }
            Ok(Cell::Float(match base {
                Some(b) => n.ln() / b.ln(),
                None => n.ln(),
            }))
        }
        Function::Round => round(first, args.get(1)),
        Function::Min | Function::Max => {
            let wanted = if function == Function::Min {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best = first;
            for candidate in args.iter().skip(1) {
                if order(name, candidate, best)? == Some(wanted) {
                    best = candidate;
                }
            }
            Ok(best.clone())
        }
        Function::Len => match first.as_text() {
            Some(s) => Ok(Cell::Integer(s.chars().count() as i64)),
            None => Err(EngineError::type_mismatch(name, first.type_name(), "String")),
        },
    }
}

/// Half-to-even rounding. Without `digits` the result is an Integer.
fn round(value: &Cell, digits: Option<&Cell>) -> Result<Cell> {
    let digits = match digits {
        None => None,
        Some(Cell::Integer(d)) => Some(*d),
        Some(other) => {
            return Err(EngineError::type_mismatch(
                "round",
                value.type_name(),
                other.type_name(),
            ));
        }
    };

    match (value, digits) {
        (Cell::Integer(v), None) => Ok(Cell::Integer(*v)),
        (Cell::Integer(v), Some(d)) if d >= 0 => Ok(Cell::Integer(*v)),
        (Cell::Integer(v), Some(d)) => {
            let exponent = u32::try_from(-d).map_err(|_| EngineError::NumericOverflow)?;
            let Some(factor) = 10_i64.checked_pow(exponent) else {
                return Ok(Cell::Integer(0));
            };
            let scaled = (*v as f64 / factor as f64).round_ties_even();
            float_to_int(scaled * factor as f64).map(Cell::Integer)
        }
        (Cell::Float(v), None) => float_to_int(v.round_ties_even()).map(Cell::Integer),
        (Cell::Float(v), Some(d)) => {
            let exponent = i32::try_from(d).map_err(|_| EngineError::NumericOverflow)?;
            let factor = 10_f64.powi(exponent);
            if factor == 0.0 {
                return Ok(Cell::Float(0.0));
            }
            if !factor.is_finite() {
                return Ok(Cell::Float(*v));
            }
            Ok(Cell::Float((v * factor).round_ties_even() / factor))
        }
        (other, _) => Err(EngineError::type_mismatch(
            "round",
            other.type_name(),
            "Float",
        )),
    }
}

fn float_to_int(value: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(EngineError::NumericOverflow)
    }
}
