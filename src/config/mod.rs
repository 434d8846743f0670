//! Configuration module for the scraper
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and picking up the credential from the environment.
//!
//! # Example
//!
//! ```no_run
//! use tmdb_scraper::config::{apply_environment, load_config};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("scraper.toml")).unwrap();
//! apply_environment(&mut config);
//! println!("Collecting {} movies", config.scraper.target_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, OutputConfig, OutputFormat, ScraperConfig};

// Re-export parser functions
pub use parser::{
    apply_environment, apply_environment_with, compute_config_hash, load_config,
    load_config_with_hash, API_KEY_VAR, INCLUDE_ADULT_VAR,
};
pub use validation::{validate, validate_scraper_config, MAX_CONCURRENCY, MAX_TARGET_COUNT};
