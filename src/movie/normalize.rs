use crate::movie::genres::GenreMap;
use crate::movie::raw::RawMovie;
use crate::movie::record::{MovieRecord, TITLE_PLACEHOLDER};

/// Highest rating TMDb hands out
const MAX_RATING: f64 = 10.0;

/// Normalizes a raw upstream entry into a movie record
///
/// # Normalization Steps
///
/// 1. Title: trimmed `title`, else trimmed `original_title`, else a placeholder
/// 2. Year: the leading `YYYY` of `release_date`, if it is four digits
/// 3. Rating: `vote_average` when finite and within `[0, 10]`, else `0.0`
/// 4. Description: `overview` with line breaks replaced by spaces, trimmed
/// 5. Genres: ids resolved through `genres`, unknown ids dropped, repeats removed
///
/// Pure: the same input always yields the same record.
///
/// # Examples
///
/// ```
/// use tmdb_scraper::movie::{normalize, GenreMap, RawMovie};
///
/// let raw = RawMovie {
///     id: 603,
///     title: Some("The Matrix".to_string()),
///     release_date: Some("1999-03-30".to_string()),
///     vote_average: Some(8.2),
///     genre_ids: vec![28, 878],
///     ..Default::default()
/// };
///
/// let record = normalize(&raw, &GenreMap::tmdb_defaults());
/// assert_eq!(record.year, Some(1999));
/// assert_eq!(record.genre_list(), "Action, Science Fiction");
/// ```
pub fn normalize(raw: &RawMovie, genres: &GenreMap) -> MovieRecord {
    MovieRecord {
        id: raw.id,
        title: normalize_title(raw),
        year: raw.release_date.as_deref().and_then(parse_year),
        rating: raw.vote_average.map(clamp_rating).unwrap_or(0.0),
        description: raw
            .overview
            .as_deref()
            .map(single_line)
            .unwrap_or_default(),
        genres: resolve_genres(&raw.genre_ids, genres),
        adult: raw.adult.unwrap_or(false),
    }
}

fn normalize_title(raw: &RawMovie) -> String {
    [raw.title.as_deref(), raw.original_title.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|title| !title.is_empty())
        .unwrap_or(TITLE_PLACEHOLDER)
        .to_string()
}

/// Extracts the year from a `YYYY-MM-DD` (or bare `YYYY`) date
pub fn parse_year(release_date: &str) -> Option<u16> {
    let year = release_date.trim().split('-').next()?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    year.parse().ok()
}

/// Out-of-range and non-finite values collapse to 0.0
fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() && (0.0..=MAX_RATING).contains(&rating) {
        rating
    } else {
        0.0
    }
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

fn resolve_genres(ids: &[i64], genres: &GenreMap) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(ids.len());
    for name in ids.iter().filter_map(|id| genres.get(*id)) {
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}
