//! Excel dataset writer
//!
//! One worksheet named "Movies" with a bold header row. Reading goes through
//! `calamine` and accepts any workbook whose first sheet has the same
//! headers, in any column order.

use crate::config::OutputFormat;
use crate::output::traits::{header, MovieRow, OutputError, OutputResult, OutputWriter};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

const SHEET_NAME: &str = "Movies";

pub struct XlsxWriter {
    path: PathBuf,
    include_adult: bool,
}

impl XlsxWriter {
    pub fn new(path: impl AsRef<Path>, include_adult: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            include_adult,
        }
    }
}

impl OutputWriter for XlsxWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xlsx
    }

    fn include_adult(&self) -> bool {
        self.include_adult
    }

    fn write_rows(&mut self, rows: &[MovieRow]) -> OutputResult<usize> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, name) in header(self.include_adult).into_iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, name, &bold)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let line = u32::try_from(index + 1)
                .map_err(|_| OutputError::Write("too many rows for a worksheet".to_string()))?;

            sheet.write_string(line, 0, &row.title)?;
            if let Some(year) = row.year {
                sheet.write_number(line, 1, f64::from(year))?;
            }
            sheet.write_number(line, 2, row.rating)?;
            sheet.write_string(line, 3, &row.description)?;
            sheet.write_string(line, 4, &row.genre)?;
            if self.include_adult {
                sheet.write_boolean(line, 5, row.adult.unwrap_or(false))?;
            }
        }

        workbook.save(&self.path)?;

        tracing::info!("Wrote {} movies to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }
}

/// Column positions found in the header row
struct Columns {
    title: usize,
    year: usize,
    rating: usize,
    description: usize,
    genre: usize,
    adult: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[Data]) -> OutputResult<Self> {
        let find = |name: &str| {
            cells
                .iter()
                .position(|cell| cell_text(cell).eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| OutputError::Format(format!("missing column {}", name)))
        };

        Ok(Self {
            title: require("Title")?,
            year: require("Year")?,
            rating: require("Rating")?,
            description: require("Description")?,
            genre: require("Genre")?,
            adult: find("Adult"),
        })
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_number(cell: Option<&Data>) -> Option<f64> {
    match cell? {
        Data::Float(value) => Some(*value),
        Data::Int(value) => Some(*value as f64),
        Data::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn cell_bool(cell: Option<&Data>) -> Option<bool> {
    match cell? {
        Data::Bool(value) => Some(*value),
        Data::Int(value) => Some(*value != 0),
        Data::Float(value) => Some(*value != 0.0),
        Data::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Reads rows back from the first worksheet of an Excel dataset
pub fn read_xlsx(path: &Path) -> OutputResult<Vec<MovieRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| OutputError::Format("workbook has no worksheets".to_string()))??;

    let mut lines = range.rows();
    let columns = match lines.next() {
        Some(cells) => Columns::from_header(cells)?,
        None => return Ok(Vec::new()),
    };

    let rows = lines
        .map(|cells| {
            let text = |index: usize| cells.get(index).map(cell_text).unwrap_or_default();
            MovieRow {
                title: text(columns.title),
                year: cell_number(cells.get(columns.year))
                    .filter(|year| (0.0..=f64::from(u16::MAX)).contains(year))
                    .map(|year| year as u16),
                rating: cell_number(cells.get(columns.rating)).unwrap_or(0.0),
                description: text(columns.description),
                genre: text(columns.genre),
                adult: columns.adult.and_then(|index| cell_bool(cells.get(index))),
            }
        })
        .collect();

    Ok(rows)
}
