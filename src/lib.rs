//! # Brisket - Tabular Data Analysis Engine
//!
//! Brisket loads rectangular datasets (delimited text, `.xlsx` workbooks or
//! JSON row arrays), describes them statistically, and transforms them with
//! small user-typed expressions: row filters, column selections, formulas,
//! group-by aggregations and missing-value strategies.
//!
//! ## Quick Start
//!
//! ```
//! use brisket::analyser::logic::{self, DataFormat};
//!
//! let csv = b"name,price\nbolt,120\nnut,80\nscrew,\n";
//! let table = logic::load(csv, DataFormat::Delimited)?;
//!
//! let expensive = logic::filter(&table, "price > 100")?;
//! assert_eq!(expensive.row_count(), 1);
//!
//! for summary in logic::describe(&table) {
//!     println!("{}: {} ({} missing)", summary.name, summary.logical_type, summary.missing);
//! }
//! # Ok::<(), brisket::error::EngineError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: the engine
//!   - [`analyser::logic`]: tables, loading/saving, statistics and transformations
//!   - [`analyser::expr`]: the filter and formula expression language
//!   - [`analyser::pipeline`]: JSON-serializable transform pipelines
//! - [`config`]: inference and summary settings
//! - [`error`]: error types and handling utilities
//! - [`logging`]: `env_logger` setup for the command-line front end
//!
//! ## Key Concepts
//!
//! ### Immutable Tables
//!
//! A [`analyser::logic::Table`] never changes after it is built. Every
//! operation returns a new table, and columns that an operation leaves alone
//! are shared with the input rather than copied.
//!
//! ### Atomic Failures
//!
//! Operations either return a complete result or an
//! [`error::EngineError`]. A formula that fails on row 900 produces no column
//! at all, and a pipeline that fails at step 3 produces no table.

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
