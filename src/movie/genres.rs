use crate::movie::raw::GenreListResponse;
use std::collections::HashMap;

/// Read-only lookup from TMDb genre id to genre name
///
/// Built once per run (usually from the genre list endpoint) and shared with
/// the normalizer by reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreMap {
    names: HashMap<i64, String>,
}

impl GenreMap {
    /// Creates an empty map; every genre id will be dropped
    pub fn new() -> Self {
        Self::default()
    }

    /// The movie genres TMDb has published for years
    ///
    /// Used when the genre endpoint cannot be queried, e.g. offline tests.
    pub fn tmdb_defaults() -> Self {
        [
            (28, "Action"),
            (12, "Adventure"),
            (16, "Animation"),
            (35, "Comedy"),
            (80, "Crime"),
            (99, "Documentary"),
            (18, "Drama"),
            (10751, "Family"),
            (14, "Fantasy"),
            (36, "History"),
            (27, "Horror"),
            (10402, "Music"),
            (9648, "Mystery"),
            (10749, "Romance"),
            (878, "Science Fiction"),
            (10770, "TV Movie"),
            (53, "Thriller"),
            (10752, "War"),
            (37, "Western"),
        ]
        .into_iter()
        .collect()
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for GenreMap {
    fn from_iter<T: IntoIterator<Item = (i64, S)>>(iter: T) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|(id, name)| (id, name.into()))
                .collect(),
        }
    }
}

impl From<GenreListResponse> for GenreMap {
    fn from(response: GenreListResponse) -> Self {
        response
            .genres
            .into_iter()
            .filter(|genre| !genre.name.trim().is_empty())
            .map(|genre| (genre.id, genre.name))
            .collect()
    }
}
