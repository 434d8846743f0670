//! Summary statistics for a written dataset
//!
//! This module computes and prints an overview of a dataset, either straight
//! after a scrape or later from a file on disk.

use crate::output::traits::MovieRow;
use std::collections::BTreeSet;

/// Dataset summary
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    /// Number of movies in the dataset
    pub total_movies: usize,

    /// Earliest and latest release year, if any movie has one
    pub year_range: Option<(u16, u16)>,

    /// Mean rating over all movies
    pub average_rating: f64,

    /// Lowest and highest rating, if the dataset is non-empty
    pub rating_range: Option<(f64, f64)>,

    /// Distinct genre names, sorted
    pub genres: BTreeSet<String>,

    /// Movies flagged as adult; `None` when the dataset has no Adult column
    pub adult_movies: Option<usize>,
}

impl DatasetSummary {
    /// Computes the summary of a set of rows
    pub fn from_rows(rows: &[MovieRow]) -> Self {
        let years = rows.iter().filter_map(|row| row.year);
        let year_range = years.fold(None, |range, year| match range {
            None => Some((year, year)),
            Some((min, max)) => Some((min.min(year), max.max(year))),
        });

        let rating_range = rows.iter().map(|row| row.rating).fold(None, |range, r| match range {
            None => Some((r, r)),
            Some((min, max)) => Some((f64::min(min, r), f64::max(max, r))),
        });

        let average_rating = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|row| row.rating).sum::<f64>() / rows.len() as f64
        };

        let genres = rows
            .iter()
            .flat_map(|row| row.genre_names())
            .map(str::to_string)
            .collect();

        let adult_movies = if rows.iter().any(|row| row.adult.is_some()) {
            Some(rows.iter().filter(|row| row.adult == Some(true)).count())
        } else {
            None
        };

        Self {
            total_movies: rows.len(),
            year_range,
            average_rating,
            rating_range,
            genres,
            adult_movies,
        }
    }
}

/// Prints a summary to stdout
pub fn print_summary(summary: &DatasetSummary) {
    println!("=== Dataset Summary ===\n");

    println!("  Total movies: {}", summary.total_movies);
    if summary.total_movies == 0 {
        return;
    }

    match summary.year_range {
        Some((min, max)) => println!("  Year range: {} - {}", min, max),
        None => println!("  Year range: unknown"),
    }

    println!("  Average rating: {:.2}", summary.average_rating);
    if let Some((min, max)) = summary.rating_range {
        println!("  Rating range: {:.1} - {:.1}", min, max);
    }

    println!("  Unique genres: {}", summary.genres.len());
    if !summary.genres.is_empty() {
        let names: Vec<&str> = summary.genres.iter().map(String::as_str).collect();
        println!("    {}", names.join(", "));
    }

    if let Some(adult) = summary.adult_movies {
        println!("  Adult movies: {}", adult);
    }
}
