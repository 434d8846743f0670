/// Text used when upstream gives no usable title
pub const TITLE_PLACEHOLDER: &str = "Untitled";

/// Canonical movie record handed to the output writers
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    /// Upstream id, unique within a dataset
    pub id: u64,

    /// Never empty
    pub title: String,

    /// Release year, when the release date carried one
    pub year: Option<u16>,

    /// Average vote in `[0.0, 10.0]`
    pub rating: f64,

    /// Overview flattened to one line
    pub description: String,

    /// Genre names in upstream order
    pub genres: Vec<String>,

    pub adult: bool,
}

impl MovieRecord {
    /// Genres as written to flat output, e.g. `"Drama, Thriller"`
    pub fn genre_list(&self) -> String {
        self.genres.join(", ")
    }
}
