//! CSV dataset writer

use crate::config::OutputFormat;
use crate::output::traits::{header, MovieRow, OutputResult, OutputWriter};
use std::path::{Path, PathBuf};

/// Writes a dataset as CSV with a header row
pub struct CsvWriter {
    path: PathBuf,
    include_adult: bool,
}

impl CsvWriter {
    pub fn new(path: impl AsRef<Path>, include_adult: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            include_adult,
        }
    }
}

impl OutputWriter for CsvWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Csv
    }

    fn include_adult(&self) -> bool {
        self.include_adult
    }

    fn write_rows(&mut self, rows: &[MovieRow]) -> OutputResult<usize> {
        let mut writer = csv::Writer::from_path(&self.path)?;

        if rows.is_empty() {
            writer.write_record(header(self.include_adult))?;
        }

        for row in rows {
            writer.serialize(row.with_adult_column(self.include_adult))?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} movies to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }
}

/// Reads rows back from a CSV dataset
pub fn read_csv(path: &Path) -> OutputResult<Vec<MovieRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<MovieRow>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
