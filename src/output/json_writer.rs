//! JSON dataset writer
//!
//! Writes the dataset as one pretty-printed array of row objects.

use crate::config::OutputFormat;
use crate::output::traits::{MovieRow, OutputResult, OutputWriter};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct JsonWriter {
    path: PathBuf,
    include_adult: bool,
}

impl JsonWriter {
    pub fn new(path: impl AsRef<Path>, include_adult: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            include_adult,
        }
    }
}

impl OutputWriter for JsonWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn include_adult(&self) -> bool {
        self.include_adult
    }

    fn write_rows(&mut self, rows: &[MovieRow]) -> OutputResult<usize> {
        let rows: Vec<MovieRow> = rows
            .iter()
            .map(|row| row.with_adult_column(self.include_adult))
            .collect();

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &rows)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::info!("Wrote {} movies to {}", rows.len(), self.path.display());
        Ok(rows.len())
    }
}

/// Reads rows back from a JSON dataset
pub fn read_json(path: &Path) -> OutputResult<Vec<MovieRow>> {
    let reader = BufReader::new(File::open(path)?);
    let rows = serde_json::from_reader(reader)?;
    Ok(rows)
}
