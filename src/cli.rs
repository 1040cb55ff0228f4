use anyhow::{Context as _, Result, bail};
use brisket::analyser::logic::{
    self, AggregateOp, DataFormat, FillStatistic, FillValue, MissingStrategy, Table,
};
use brisket::analyser::pipeline::TransformPipeline;
use brisket::config::{EngineSettings, load_settings};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "brisket", about = "Describe and transform tabular datasets")]
pub struct Cli {
    /// JSON settings file (missing tokens, date formats, summary size)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print per-column statistics as JSON
    Describe {
        input: PathBuf,

        /// Only summarise this column
        #[arg(short, long)]
        column: Option<String>,
    },
    /// Print the Pearson correlation matrix of the numeric columns
    Correlate { input: PathBuf },
    /// Print shape, column types and approximate memory use
    Info { input: PathBuf },
    /// Print the missing-cell count of every column
    Missing { input: PathBuf },
    /// Keep the columns named by a selection such as "name,price" or "1,3-4"
    Select {
        input: PathBuf,
        selection: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Keep the rows matching an expression such as "price > 100 and qty >= 2"
    Filter {
        input: PathBuf,
        expression: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Stable sort by one column, missing values last
    Sort {
        input: PathBuf,
        column: String,
        #[arg(long)]
        descending: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Group by a key column and reduce the others (sum, mean, count, max, min)
    Group {
        input: PathBuf,
        key: String,
        operation: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Drop or fill missing values
    Impute {
        input: PathBuf,
        #[arg(short, long, value_enum)]
        strategy: ImputeStrategy,

        /// Literal fill value, required with `--strategy fill`
        #[arg(long)]
        value: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute a column from a formula; `x` is the target column's current value
    Apply {
        input: PathBuf,
        target: String,
        expression: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert between csv, xlsx and json (formats follow the extensions)
    Convert { input: PathBuf, output: PathBuf },
    /// Run a JSON transform pipeline
    Pipeline {
        input: PathBuf,
        spec: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the built-in example dataset
    Example {
        #[arg(long, default_value_t = 30)]
        rows: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ImputeStrategy {
    Drop,
    Fill,
    Mean,
    Median,
    Mode,
}

#[expect(clippy::too_many_lines)]
pub fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => {
            log::info!("Loading settings from {}", path.display());
            load_settings(path)?
        }
        None => EngineSettings::default(),
    };

    match cli.command {
        Commands::Describe { input, column } => {
            let table = load(&input, &settings)?;
            match column {
                Some(name) => print_json(&logic::describe_column_with(
                    &table,
                    &name,
                    &settings.summary,
                )?),
                None => print_json(&logic::describe_with(&table, &settings.summary)),
            }
        }
        Commands::Correlate { input } => {
            let table = load(&input, &settings)?;
            print_json(&logic::correlations(&table)?)
        }
        Commands::Info { input } => {
            let table = load(&input, &settings)?;
            print_json(&logic::dataset_info(&table))
        }
        Commands::Missing { input } => {
            let table = load(&input, &settings)?;
            print_json(&logic::missing_counts(&table))
        }
        Commands::Select {
            input,
            selection,
            output,
        } => {
            let table = load(&input, &settings)?;
            let names = logic::parse_selection(&table, &selection)?;
            log::info!("Selected columns: {}", names.join(", "));
            emit(&logic::select(&table, &names)?, output.as_deref())
        }
        Commands::Filter {
            input,
            expression,
            output,
        } => {
            let table = load(&input, &settings)?;
            let filtered = logic::filter_with(&table, &expression, &settings.inference)?;
            log::info!(
                "Kept {} of {} rows",
                filtered.row_count(),
                table.row_count()
            );
            emit(&filtered, output.as_deref())
        }
        Commands::Sort {
            input,
            column,
            descending,
            output,
        } => {
            let table = load(&input, &settings)?;
            emit(
                &logic::sort_by(&table, &column, !descending)?,
                output.as_deref(),
            )
        }
        Commands::Group {
            input,
            key,
            operation,
            output,
        } => {
            let table = load(&input, &settings)?;
            let op = operation.parse::<AggregateOp>()?;
            emit(&logic::group_by(&table, &key, op)?, output.as_deref())
        }
        Commands::Impute {
            input,
            strategy,
            value,
            output,
        } => {
            let strategy = match (strategy, value) {
                (ImputeStrategy::Drop, _) => MissingStrategy::Drop,
                (ImputeStrategy::Fill, Some(v)) => MissingStrategy::Fill(FillValue::Literal(v)),
                (ImputeStrategy::Fill, None) => bail!("--strategy fill needs --value"),
                (ImputeStrategy::Mean, _) => {
                    MissingStrategy::Fill(FillValue::Statistic(FillStatistic::Mean))
                }
                (ImputeStrategy::Median, _) => {
                    MissingStrategy::Fill(FillValue::Statistic(FillStatistic::Median))
                }
                (ImputeStrategy::Mode, _) => {
                    MissingStrategy::Fill(FillValue::Statistic(FillStatistic::Mode))
                }
            };
            let table = load(&input, &settings)?;
            let cleaned = logic::handle_missing_with(&table, &strategy, &settings.inference)?;
            emit(&cleaned, output.as_deref())
        }
        Commands::Apply {
            input,
            target,
            expression,
            output,
        } => {
            let table = load(&input, &settings)?;
            let updated =
                logic::apply_formula_with(&table, &target, &expression, &settings.inference)?;
            emit(&updated, output.as_deref())
        }
        Commands::Convert { input, output } => {
            let table = load(&input, &settings)?;
            emit(&table, Some(output.as_path()))
        }
        Commands::Pipeline {
            input,
            spec,
            output,
        } => {
            let json = std::fs::read_to_string(&spec)
                .with_context(|| format!("Failed to read pipeline {}", spec.display()))?;
            let pipeline = TransformPipeline::from_json(&json)?;
            for (step, line) in pipeline.describe()?.iter().enumerate() {
                log::info!("Step {step}: {line}");
            }
            let table = load(&input, &settings)?;
            emit(
                &pipeline.apply_with(&table, &settings.inference)?,
                output.as_deref(),
            )
        }
        Commands::Example { rows, output } => {
            emit(&logic::example_dataset(rows)?, output.as_deref())
        }
    }
}

fn load(path: &Path, settings: &EngineSettings) -> Result<Table> {
    let table = logic::load_path(path, &settings.inference)?;
    log::info!(
        "Loaded {} ({} rows x {} columns)",
        path.display(),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Writes the table to `output`, or as CSV to stdout.
fn emit(table: &Table, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            logic::save_path(table, path)?;
            log::info!("Wrote {} rows to {}", table.row_count(), path.display());
        }
        None => {
            let bytes = logic::save(table, DataFormat::Delimited)?;
            std::io::stdout()
                .write_all(&bytes)
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
