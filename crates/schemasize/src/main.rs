//! Command-line estimator for the storage footprint of a MySQL schema.
//!
//! Reads DDL from a file argument or stdin and prints per-table and
//! per-database size estimates.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use report::{DEFAULT_PRECISION, DEFAULT_ROWS, Estimator, Options, OutputFormat};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let sql = read_input(args.file.as_deref())?;
    let options = Options::builder()
        .rows(args.rows)
        .precision(args.precision)
        .verbose(args.verbose)
        .format(args.output_format())
        .build();
    let estimator = Estimator::new(options)?;

    let stdout = io::stdout();
    estimator.run(&sql, &mut stdout.lock())?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut sql = String::new();
            io::stdin()
                .read_to_string(&mut sql)
                .context("failed to read stdin")?;
            Ok(sql)
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "schemasize")]
#[command(about = "Estimate the storage footprint of a MySQL schema from its DDL", long_about = None)]
struct Args {
    /// SQL file to read; stdin when omitted
    file: Option<PathBuf>,

    /// Batch mode: print results as CSV, one row per line
    #[arg(short = 'B', long)]
    batch: bool,

    /// Also report every column and key
    #[arg(short, long)]
    verbose: bool,

    /// Number of rows to assume per table
    #[arg(short = 'n', long = "rows", default_value_t = DEFAULT_ROWS)]
    rows: u64,

    /// Decimal places for human-readable sizes
    #[arg(short, long, default_value_t = DEFAULT_PRECISION)]
    precision: u8,

    /// Output format; overrides --batch
    #[arg(long, value_enum)]
    format: Option<CliFormat>,
}

impl Args {
    fn output_format(&self) -> OutputFormat {
        match self.format {
            Some(format) => format.into(),
            None if self.batch => OutputFormat::Csv,
            None => OutputFormat::Table,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CliFormat {
    Table,
    Csv,
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> OutputFormat {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Csv => OutputFormat::Csv,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}
