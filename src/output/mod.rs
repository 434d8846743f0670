//! Output module for persisting and inspecting datasets
//!
//! This module handles:
//! - Writing a finished dataset as CSV, JSON, Excel or SQLite
//! - Reading written datasets back and converting between formats
//! - Summarizing a dataset for display

mod csv_writer;
mod json_writer;
mod sqlite_output;
pub mod stats;
mod traits;
mod xlsx_writer;

pub use csv_writer::{read_csv, CsvWriter};
pub use json_writer::{read_json, JsonWriter};
pub use sqlite_output::{read_sqlite, SqliteWriter, SCHEMA_SQL};
pub use stats::{print_summary, DatasetSummary};
pub use traits::{header, MovieRow, OutputError, OutputResult, OutputWriter};
pub use xlsx_writer::{read_xlsx, XlsxWriter};

use crate::config::OutputFormat;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Creates the writer for a format
///
/// # Arguments
///
/// * `format` - Output format
/// * `path` - Destination file
/// * `include_adult` - Whether the run included adult titles
/// * `started_at` - When the run started (recorded by SQLite output)
/// * `config_hash` - Hash of the configuration file (recorded by SQLite output)
pub fn open_writer(
    format: OutputFormat,
    path: &Path,
    include_adult: bool,
    started_at: DateTime<Utc>,
    config_hash: Option<String>,
) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Csv => Box::new(CsvWriter::new(path, include_adult)),
        OutputFormat::Json => Box::new(JsonWriter::new(path, include_adult)),
        OutputFormat::Xlsx => Box::new(XlsxWriter::new(path, include_adult)),
        OutputFormat::Sqlite => Box::new(SqliteWriter::new(
            path,
            include_adult,
            started_at,
            config_hash,
        )),
    }
}

/// Reads a written dataset back as rows
pub fn read_rows(path: &Path, format: OutputFormat) -> OutputResult<Vec<MovieRow>> {
    match format {
        OutputFormat::Csv => read_csv(path),
        OutputFormat::Json => read_json(path),
        OutputFormat::Xlsx => read_xlsx(path),
        OutputFormat::Sqlite => read_sqlite(path),
    }
}

/// Rewrites a dataset in another format
///
/// The `Adult` column is kept when the input has one. Returns the number of
/// rows written.
pub fn convert(
    input: &Path,
    from: OutputFormat,
    output: &Path,
    to: OutputFormat,
) -> OutputResult<usize> {
    let rows = read_rows(input, from)?;
    let include_adult = rows.iter().any(|row| row.adult.is_some());

    tracing::info!(
        "Converting {} rows from {} ({}) to {} ({})",
        rows.len(),
        input.display(),
        from,
        output.display(),
        to
    );

    let mut writer = open_writer(to, output, include_adult, Utc::now(), None);
    writer.write_rows(&rows)
}
