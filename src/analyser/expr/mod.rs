//! The small expression language shared by row filters and formulas.
//!
//! Text goes through [`lexer`], [`parser`] and [`binder`] before any row is
//! touched, so malformed or disallowed input is rejected up front and never
//! partially executed. [`eval`] then walks the bound tree once per row.
//!
//! The only callable surface is [`ast::Function`]; there is no attribute
//! access, indexing, assignment or free name lookup.

pub mod ast;
pub mod binder;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, ExprKind, Function, Literal, UnaryOp};
pub use binder::{Binder, Bound, IMPLICIT_IDENTIFIER};
pub use eval::{evaluate, row_matches};
pub use parser::parse;
