use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for the scraper
///
/// Every section is optional in the TOML file; missing sections and keys
/// take the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub scraper: ScraperConfig,
    pub output: OutputConfig,
}

/// Upstream API access and request policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL of the TMDb v3 API
    pub base_url: String,

    /// Language passed to the discover and genre endpoints
    pub language: String,

    /// Maximum requests issued per rate limit window
    pub requests_per_window: u32,

    /// Length of the rate limit window (milliseconds)
    pub window_ms: u64,

    /// Per-attempt request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Total attempts per request, the first one included
    pub max_attempts: u32,

    /// Backoff delay before the first retry (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound for any single backoff delay (milliseconds)
    pub max_delay_ms: u64,

    /// Credential, taken from the environment rather than the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            language: "en-US".to_string(),
            requests_per_window: 40,
            window_ms: 10_000,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            api_key: None,
        }
    }
}

impl ApiConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Returns the API key with everything but its ends hidden
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask_secret)
    }
}

/// What a scrape run collects
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Number of movies to collect
    pub target_count: usize,

    /// Maximum number of page fetches in flight
    pub concurrency: usize,

    /// Ask upstream to include adult titles
    ///
    /// Left unset, `TMDB_INCLUDE_ADULT` decides; a value in the file wins.
    pub include_adult: Option<bool>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            target_count: 1_000,
            concurrency: 8,
            include_adult: None,
        }
    }
}

impl ScraperConfig {
    /// Whether adult titles are requested, off unless set
    pub fn include_adult(&self) -> bool {
        self.include_adult.unwrap_or(false)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the file written after a successful run
    pub path: String,

    /// Format of that file
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "tmdb_movies.csv".to_string(),
            format: OutputFormat::Csv,
        }
    }
}

/// Supported dataset formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
    Sqlite,
}

impl OutputFormat {
    /// Guesses the format from a file extension, falling back to CSV
    pub fn from_path(path: &std::path::Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("xlsx") => Self::Xlsx,
            Some("db") | Some("sqlite") | Some("sqlite3") => Self::Sqlite,
            _ => Self::Csv,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Xlsx => "Excel",
            Self::Sqlite => "SQLite",
        };
        write!(f, "{}", name)
    }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 12), tail)
}
