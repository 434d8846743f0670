//! Movie data model
//!
//! - `RawMovie` and the response envelopes: upstream JSON, validated at the
//!   parse boundary
//! - `GenreMap`: read-only genre id to name lookup
//! - `normalize`: raw entry to canonical `MovieRecord`

mod genres;
mod normalize;
mod raw;
mod record;

pub use genres::GenreMap;
pub use normalize::{normalize, parse_year};
pub use raw::{DiscoverResponse, GenreListResponse, RawGenre, RawMovie};
pub use record::{MovieRecord, TITLE_PLACEHOLDER};
