//! SQLite dataset writer
//!
//! Stores the dataset in a `movies` table in dataset order, with the
//! upstream id when it is known, and keeps a `runs` table recording when each
//! dataset was written and from which configuration.

use crate::config::OutputFormat;
use crate::movie::MovieRecord;
use crate::output::traits::{MovieRow, OutputError, OutputResult, OutputWriter};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// SQL schema for the dataset database
pub const SCHEMA_SQL: &str = r#"
-- One row per written dataset
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT,
    record_count INTEGER NOT NULL
);

-- The latest dataset; tmdb_id is NULL for rows converted from other files
CREATE TABLE IF NOT EXISTS movies (
    position INTEGER PRIMARY KEY,
    tmdb_id INTEGER UNIQUE,
    title TEXT NOT NULL,
    year INTEGER,
    rating REAL NOT NULL,
    description TEXT NOT NULL,
    genre TEXT NOT NULL,
    adult INTEGER,
    run_id INTEGER NOT NULL REFERENCES runs(id)
);
"#;

/// SQLite writer
pub struct SqliteWriter {
    path: PathBuf,
    include_adult: bool,
    started_at: DateTime<Utc>,
    config_hash: Option<String>,
}

impl SqliteWriter {
    /// Creates a writer
    ///
    /// # Arguments
    ///
    /// * `path` - Database file, created if missing
    /// * `include_adult` - Whether the `adult` column is filled
    /// * `started_at` - When the scrape that produced the dataset started
    /// * `config_hash` - Hash of the configuration file, if one was used
    pub fn new(
        path: impl AsRef<Path>,
        include_adult: bool,
        started_at: DateTime<Utc>,
        config_hash: Option<String>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            include_adult,
            started_at,
            config_hash,
        }
    }

    /// Replaces the stored dataset in one transaction
    ///
    /// `ids` is either empty or holds one upstream id per row.
    fn store(&self, rows: &[MovieRow], ids: &[u64]) -> OutputResult<usize> {
        let mut conn = open(&self.path)?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM movies", [])?;
        tx.execute(
            "INSERT INTO runs (started_at, finished_at, config_hash, record_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.started_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
                self.config_hash,
                rows.len() as i64
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut insert = tx.prepare(
                "INSERT INTO movies (position, tmdb_id, title, year, rating, description, genre, adult, run_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;

            for (position, row) in rows.iter().enumerate() {
                let tmdb_id = match ids.get(position) {
                    Some(&id) => Some(i64::try_from(id).map_err(|_| {
                        OutputError::Write(format!("movie id {} does not fit in SQLite", id))
                    })?),
                    None => None,
                };
                let adult = if self.include_adult {
                    Some(row.adult.unwrap_or(false))
                } else {
                    None
                };

                insert.execute(params![
                    position as i64,
                    tmdb_id,
                    row.title,
                    row.year,
                    row.rating,
                    row.description,
                    row.genre,
                    adult,
                    run_id
                ])?;
            }
        }

        tx.commit()?;

        tracing::info!(
            "Wrote {} movies to {} (run {})",
            rows.len(),
            self.path.display(),
            run_id
        );
        Ok(rows.len())
    }
}

fn open(path: &Path) -> OutputResult<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
    ",
    )?;
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(conn)
}

impl OutputWriter for SqliteWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Sqlite
    }

    fn include_adult(&self) -> bool {
        self.include_adult
    }

    fn write_rows(&mut self, rows: &[MovieRow]) -> OutputResult<usize> {
        self.store(rows, &[])
    }

    fn write(&mut self, records: &[MovieRecord]) -> OutputResult<usize> {
        let rows: Vec<MovieRow> = records
            .iter()
            .map(|record| MovieRow::from_record(record, self.include_adult))
            .collect();
        let ids: Vec<u64> = records.iter().map(|record| record.id).collect();
        self.store(&rows, &ids)
    }
}

/// Reads rows of the latest dataset, in their original order
pub fn read_sqlite(path: &Path) -> OutputResult<Vec<MovieRow>> {
    let conn = open(path)?;
    let mut stmt = conn.prepare(
        "SELECT title, year, rating, description, genre, adult FROM movies ORDER BY position",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(MovieRow {
                title: row.get(0)?,
                year: row.get(1)?,
                rating: row.get(2)?,
                description: row.get(3)?,
                genre: row.get(4)?,
                adult: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}
