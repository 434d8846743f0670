//! TMDb movie scraper
//!
//! This crate pages through the TMDb discover API under a request quota,
//! normalizes each entry into a flat movie record, deduplicates by id and
//! hands the ordered result to CSV, JSON or SQLite writers.

pub mod config;
pub mod movie;
pub mod output;
pub mod scraper;
pub mod state;

use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end a pipeline run
///
/// A run is atomic: when one of these is returned no records are handed out.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition {
        from: state::PipelineState,
        to: state::PipelineState,
    },
}

/// What a failed request was trying to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    /// One page of discover results
    Page(u32),

    /// The movie genre list
    Genres,
}

impl std::fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page(number) => write!(f, "page {}", number),
            Self::Genres => write!(f, "genre list"),
        }
    }
}

/// Fatal fetch errors
///
/// Transient failures are retried inside the fetcher and only surface here
/// once every attempt has been used.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Authentication failed while fetching {target}: missing or invalid API key")]
    Auth { target: FetchTarget },

    #[error("Not found (HTTP 404): {target}")]
    NotFound { target: FetchTarget },

    #[error("Request for {target} rejected with HTTP {status}")]
    Rejected { target: FetchTarget, status: u16 },

    #[error("Giving up on {target} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        target: FetchTarget,
        attempts: u32,
        last_error: String,
    },

    #[error("Fetch task for page {page} did not finish: {message}")]
    Task { page: u32, message: String },
}

impl FetchError {
    /// Short name of the failure kind, for user-facing messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "authentication error",
            Self::NotFound { .. } => "not found",
            Self::Rejected { .. } => "request rejected",
            Self::RetriesExhausted { .. } => "retries exhausted",
            Self::Task { .. } => "task failure",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use movie::{GenreMap, MovieRecord};
pub use scraper::{run_pipeline, Pipeline};
pub use state::PipelineState;
