pub mod aggregation;
pub mod analysis;
pub mod cleaning;
pub mod inference;
pub mod io;
pub mod naming;
pub mod profiling;
pub mod sample;
pub mod selection;
pub mod table;
pub mod transforms;
pub mod types;

pub use aggregation::{AggregateOp, group_by};
pub use analysis::{
    correlations, dataset_info, describe, describe_column, describe_column_with, describe_with,
    missing_counts,
};
pub use cleaning::{FillStatistic, FillValue, MissingStrategy, handle_missing, handle_missing_with};
pub use io::{DataFormat, load, load_path, load_with, save, save_path};
pub use sample::example_dataset;
pub use selection::{parse_selection, select};
pub use table::{Column, Table};
pub use transforms::{apply_formula, apply_formula_with, filter, filter_with, sort_by};
pub use types::{
    Cell, ColumnStats, ColumnSummary, CorrelationMatrix, DatasetInfo, LogicalType, NumericStats,
    TemporalStats, TextStats,
};

#[cfg(test)]
mod tests;
