//! Output writer traits and types
//!
//! This module defines the trait interface for dataset writers and the flat
//! row shape they all share.

use crate::config::OutputFormat;
use crate::movie::MovieRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Excel write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Excel read error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Unreadable dataset: {0}")]
    Format(String),

    #[error("Failed to write output: {0}")]
    Write(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One movie as it appears in a written dataset
///
/// Column names match the spreadsheet-style headers users already rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRow {
    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Year")]
    pub year: Option<u16>,

    #[serde(rename = "Rating")]
    pub rating: f64,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Genre")]
    pub genre: String,

    /// Only present when the run included adult titles
    #[serde(rename = "Adult", default, skip_serializing_if = "Option::is_none")]
    pub adult: Option<bool>,
}

impl MovieRow {
    /// Flattens a record; `include_adult` controls the `Adult` column
    pub fn from_record(record: &MovieRecord, include_adult: bool) -> Self {
        Self {
            title: record.title.clone(),
            year: record.year,
            rating: record.rating,
            description: record.description.clone(),
            genre: record.genre_list(),
            adult: include_adult.then_some(record.adult),
        }
    }

    /// Copy shaped for a dataset with or without the `Adult` column
    pub fn with_adult_column(&self, include_adult: bool) -> Self {
        Self {
            adult: include_adult.then(|| self.adult.unwrap_or(false)),
            ..self.clone()
        }
    }

    /// Genre names in this row
    pub fn genre_names(&self) -> impl Iterator<Item = &str> {
        self.genre
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Trait for dataset writers
///
/// A writer persists one complete, ordered dataset, either the records of a
/// successful run or rows read from another dataset.
pub trait OutputWriter {
    /// The format this writer produces
    fn format(&self) -> OutputFormat;

    /// Whether the `Adult` column is written
    fn include_adult(&self) -> bool;

    /// Writes all rows, replacing earlier content of the destination
    ///
    /// # Returns
    ///
    /// The number of rows written
    fn write_rows(&mut self, rows: &[MovieRow]) -> OutputResult<usize>;

    /// Writes all records of a run
    fn write(&mut self, records: &[MovieRecord]) -> OutputResult<usize> {
        let include_adult = self.include_adult();
        let rows: Vec<MovieRow> = records
            .iter()
            .map(|record| MovieRow::from_record(record, include_adult))
            .collect();
        self.write_rows(&rows)
    }
}

/// Column headers, in output order
pub fn header(include_adult: bool) -> Vec<&'static str> {
    let mut columns = vec!["Title", "Year", "Rating", "Description", "Genre"];
    if include_adult {
        columns.push("Adult");
    }
    columns
}
