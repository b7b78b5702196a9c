//! Renders size estimates for a schema described by SQL DDL.
//!
//! The report walks the read-only schema tree, scales per-row sizes by a
//! configurable row-count factor, and writes a pretty table, CSV, or JSON.

use std::io::Write;

use catalog::{Builder, Storage};
use common::{SizeError, SizeResult, Sizeable, pretty};
use serde::Serialize;
use types::SizeRange;

/// Default row-count factor.
pub const DEFAULT_ROWS: u64 = 100;
/// Default decimal precision for human-readable sizes.
pub const DEFAULT_PRECISION: u8 = 2;

/// Output encodings for the rendered report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Report settings.
#[derive(Clone, Debug, bon::Builder)]
pub struct Options {
    /// Row-count factor applied to every per-row size.
    #[builder(default = DEFAULT_ROWS)]
    pub rows: u64,
    /// Decimal places for human-readable sizes.
    #[builder(default = DEFAULT_PRECISION)]
    pub precision: u8,
    /// Also report every column and key, not just tables and databases.
    #[builder(default = false)]
    pub verbose: bool,
    /// Output encoding.
    #[builder(default)]
    pub format: OutputFormat,
}

impl Default for Options {
    fn default() -> Self {
        Options::builder().build()
    }
}

/// One line of the report: a schema node with its per-row range and the
/// range scaled by the row-count factor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub kind: String,
    pub per_row: SizeRange,
    pub total: SizeRange,
}

/// Estimates storage footprints and renders them.
#[derive(Clone, Debug)]
pub struct Estimator {
    options: Options,
}

impl Estimator {
    /// Validates the options. A zero row-count factor would zero every
    /// total, so it is rejected as missing configuration.
    pub fn new(options: Options) -> SizeResult<Estimator> {
        if options.rows == 0 {
            return Err(SizeError::Missing("row count factor".into()));
        }
        Ok(Estimator { options })
    }

    /// Parse, build, and render in one pass.
    pub fn run(&self, sql: &str, out: &mut dyn Write) -> SizeResult<()> {
        let statements = parser::parse_sql(sql)?;
        let storage = Builder::build(statements)?;
        if storage.is_empty() {
            return Err(SizeError::Missing("schema statements".into()));
        }
        self.render(&storage, out)
    }

    /// Renders an already-built schema tree.
    pub fn render(&self, storage: &Storage, out: &mut dyn Write) -> SizeResult<()> {
        let rows = self.rows(storage);
        match self.options.format {
            OutputFormat::Table => self.write_table(&rows, out),
            OutputFormat::Csv => self.write_csv(&rows, out),
            OutputFormat::Json => self.write_json(&rows, out),
        }
    }

    /// Flattens the tree into report rows. `None` marks a separator between
    /// groups in verbose output.
    fn rows(&self, storage: &Storage) -> Vec<Option<ReportRow>> {
        let verbose = self.options.verbose;
        let mut rows = Vec::new();
        for (position, database) in storage.databases().iter().enumerate() {
            if position > 0 && verbose {
                rows.push(None);
            }
            for table in &database.tables {
                if verbose {
                    for field in table.fields() {
                        rows.push(Some(self.row(&field)));
                    }
                    for key in table.keys() {
                        rows.push(Some(self.row(&key)));
                    }
                }
                rows.push(Some(self.row(table)));
                if verbose {
                    rows.push(None);
                }
            }
            rows.push(Some(self.row(database)));
        }
        rows
    }

    fn row<T: Sizeable>(&self, node: &T) -> ReportRow {
        let per_row = node.size();
        ReportRow {
            name: node.name().to_string(),
            kind: node.kind(),
            per_row,
            total: SizeRange::new(
                per_row.min.saturating_mul(self.options.rows),
                per_row.max.saturating_mul(self.options.rows),
            ),
        }
    }

    fn header(&self) -> Vec<String> {
        vec![
            "Data".into(),
            "Type".into(),
            "Per row (min)".into(),
            "Per row (max)".into(),
            format!("X {} (min)", self.options.rows),
            format!("X {} (max)", self.options.rows),
        ]
    }

    fn cells(&self, row: &ReportRow) -> Vec<String> {
        let precision = self.options.precision;
        vec![
            row.name.clone(),
            row.kind.clone(),
            pretty::human_size(row.per_row.min, precision),
            pretty::human_size(row.per_row.max, precision),
            pretty::human_size(row.total.min, precision),
            pretty::human_size(row.total.max, precision),
        ]
    }

    fn write_table(&self, rows: &[Option<ReportRow>], out: &mut dyn Write) -> SizeResult<()> {
        let header = self.header();
        let data = rows
            .iter()
            .map(|row| match row {
                Some(row) => self.cells(row),
                None => vec![String::new(); header.len()],
            })
            .collect();
        let headers: Vec<&str> = header.iter().map(String::as_str).collect();
        let rendered = pretty::render_string_table(&headers, data, pretty::TableStyleKind::Modern);
        writeln!(out, "{rendered}")?;
        Ok(())
    }

    fn write_csv(&self, rows: &[Option<ReportRow>], out: &mut dyn Write) -> SizeResult<()> {
        let header = self.header();
        writeln!(out, "{}", csv_line(&header))?;
        for row in rows {
            let line = match row {
                Some(row) => csv_line(&self.cells(row)),
                None => csv_line(&vec![String::new(); header.len()]),
            };
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn write_json(&self, rows: &[Option<ReportRow>], out: &mut dyn Write) -> SizeResult<()> {
        let data: Vec<&ReportRow> = rows.iter().flatten().collect();
        let rendered = serde_json::to_string_pretty(&data)
            .map_err(|err| SizeError::Report(err.to_string()))?;
        writeln!(out, "{rendered}")?;
        Ok(())
    }
}

/// Minimal CSV quoting: fields containing separators or quotes are wrapped
/// and inner quotes doubled.
fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
