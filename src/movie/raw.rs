//! Upstream response shapes
//!
//! Responses are validated here, at the parse boundary. A malformed field in
//! one entry never rejects the page: the field is treated as absent and the
//! normalizer substitutes its default.

use serde::Deserialize;
use serde_json::Value;

/// One movie entry as returned by the discover endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMovie {
    pub id: u64,
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub overview: Option<String>,
    pub genre_ids: Vec<i64>,
    pub adult: Option<bool>,
}

impl RawMovie {
    /// Builds a raw entry from an arbitrary JSON value
    ///
    /// Returns `None` when the value is not an object or has no integer `id`,
    /// since such an entry cannot take part in deduplication.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get("id").and_then(Value::as_u64)?;

        let string_field = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let genre_ids = object
            .get("genre_ids")
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        Some(Self {
            id,
            title: string_field("title"),
            original_title: string_field("original_title"),
            release_date: string_field("release_date"),
            vote_average: object.get("vote_average").and_then(Value::as_f64),
            overview: string_field("overview"),
            genre_ids,
            adult: object.get("adult").and_then(Value::as_bool),
        })
    }
}

/// Envelope of a discover response
///
/// `results` is kept as raw JSON so one bad entry cannot fail the page.
#[derive(Debug, Deserialize)]
pub struct DiscoverResponse {
    #[serde(default)]
    pub page: Option<u32>,

    #[serde(default)]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub total_results: Option<u64>,

    #[serde(default)]
    pub results: Vec<Value>,
}

impl DiscoverResponse {
    /// Converts the raw result list into typed entries, dropping unusable ones
    pub fn entries(&self) -> (Vec<RawMovie>, usize) {
        let mut dropped = 0;
        let entries = self
            .results
            .iter()
            .filter_map(|value| {
                let entry = RawMovie::from_value(value);
                if entry.is_none() {
                    dropped += 1;
                }
                entry
            })
            .collect();
        (entries, dropped)
    }
}

/// One genre in the genre list response
#[derive(Debug, Clone, Deserialize)]
pub struct RawGenre {
    pub id: i64,
    pub name: String,
}

/// Envelope of the genre list response
#[derive(Debug, Clone, Deserialize)]
pub struct GenreListResponse {
    #[serde(default)]
    pub genres: Vec<RawGenre>,
}
