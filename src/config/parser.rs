use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the TMDb credential
pub const API_KEY_VAR: &str = "TMDB_API_KEY";

/// Environment variable enabling adult titles
pub const INCLUDE_ADULT_VAR: &str = "TMDB_INCLUDE_ADULT";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use tmdb_scraper::config::load_config;
///
/// let config = load_config(Path::new("scraper.toml")).unwrap();
/// println!("Target: {}", config.scraper.target_count);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded alongside SQLite output so datasets can be traced back to the
/// settings that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Fills environment-sourced settings from the process environment
///
/// Call after `dotenvy::dotenv()` so values from a `.env` file are visible.
pub fn apply_environment(config: &mut Config) {
    apply_environment_with(config, |name| std::env::var(name).ok());
}

/// Same as [`apply_environment`], reading variables through `lookup`
pub fn apply_environment_with<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(API_KEY_VAR) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            config.api.api_key = Some(key);
        }
    }

    if config.scraper.include_adult.is_none() {
        if let Some(value) = lookup(INCLUDE_ADULT_VAR) {
            config.scraper.include_adult = Some(parse_env_bool(&value));
        }
    }
}

/// Accepts 1/0, true/false, yes/no, y, on
fn parse_env_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
