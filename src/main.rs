//! # Brisket Command-Line Entry Point
//!
//! A one-shot command runner over the engine: each invocation loads one
//! file, runs one operation, and prints JSON or writes the resulting table.
//!
//! ```bash
//! brisket describe sales.csv
//! brisket filter sales.csv "price > 100 and region == 'north'" -o north.xlsx
//! brisket apply sales.csv total "price * qty"
//! brisket pipeline sales.csv steps.json -o cleaned.json
//! ```
//!
//! Set `RUST_LOG=debug` or pass `-vv` to see progress on stderr.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    brisket::logging::init(cli.verbose);
    cli::run(cli)
}
