use crate::config::types::{ApiConfig, Config, OutputConfig, ScraperConfig};
use crate::ConfigError;
use url::Url;

/// Largest dataset a single run may request
pub const MAX_TARGET_COUNT: usize = 10_000;

/// Largest number of concurrent page fetches
pub const MAX_CONCURRENCY: usize = 20;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API access settings
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "language cannot be empty".to_string(),
        ));
    }

    if config.requests_per_window < 1 {
        return Err(ConfigError::Validation(
            "requests-per-window must be >= 1".to_string(),
        ));
    }

    if config.window_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "window-ms must be >= 100ms, got {}ms",
            config.window_ms
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms ({}) must not be smaller than base-delay-ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    Ok(())
}

/// Validates run settings
pub fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.target_count < 1 || config.target_count > MAX_TARGET_COUNT {
        return Err(ConfigError::Validation(format!(
            "target-count must be between 1 and {}, got {}",
            MAX_TARGET_COUNT, config.target_count
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
