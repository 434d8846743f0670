//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests to the upstream API, including:
//! - Building the HTTP client with a proper user agent and timeouts
//! - Attaching the credential (v3 api key or v4 bearer token)
//! - Passing every attempt through the shared rate limiter
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::ApiConfig;
use crate::movie::{DiscoverResponse, GenreListResponse, GenreMap, RawMovie};
use crate::scraper::rate_limit::RateLimiter;
use crate::{FetchError, FetchTarget};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One page of discover results
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number
    pub page_number: u32,

    /// Usable entries, in upstream order
    pub entries: Vec<RawMovie>,

    /// Total pages reported by upstream, if it reported any
    pub total_pages: Option<u32>,

    /// Whether upstream has pages after this one
    pub has_more: bool,
}

impl Page {
    /// Builds a page from a decoded discover response
    ///
    /// An empty result list ends pagination. Without a `total_pages` field,
    /// pagination continues as long as results keep arriving.
    pub fn from_response(page_number: u32, response: DiscoverResponse) -> Self {
        let (entries, dropped) = response.entries();
        if dropped > 0 {
            tracing::warn!(
                "Page {}: dropped {} entries without a usable id",
                page_number,
                dropped
            );
        }

        let has_more = !response.results.is_empty()
            && response
                .total_pages
                .map_or(true, |total| page_number < total);

        Self {
            page_number,
            entries,
            total_pages: response.total_pages,
            has_more,
        }
    }
}

/// Source of discover pages
///
/// Implemented by [`PageFetcher`]; the scheduler only depends on this trait.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Fetches one page, resolving retryable failures internally
    async fn fetch_page(&self, page_number: u32) -> Result<Page, FetchError>;
}

/// Retry and backoff settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first included; at least one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Cap for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay(), config.max_delay())
    }

    /// Delay after failed attempt `attempt` (0-based)
    ///
    /// `base_delay × 2^attempt`, raised to `retry_after` when upstream asked
    /// for a longer pause, and capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponential = self
            .base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(self.max_delay);

        let delay = match retry_after {
            Some(hint) => exponential.max(hint),
            None => exponential,
        };

        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ApiConfig::default())
    }
}

/// Failure of a single attempt
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying
    Transient {
        reason: String,
        retry_after: Option<Duration>,
    },

    /// Ends the request immediately
    Fatal(FetchError),
}

/// How a non-success status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Transient,
    Fatal,
}

fn classify_status(status: StatusCode) -> StatusClass {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        StatusClass::Transient
    } else {
        StatusClass::Fatal
    }
}

fn fatal_for_status(status: StatusCode, target: FetchTarget) -> FetchError {
    if status == StatusCode::UNAUTHORIZED {
        FetchError::Auth { target }
    } else if status == StatusCode::NOT_FOUND {
        FetchError::NotFound { target }
    } else {
        FetchError::Rejected {
            target,
            status: status.as_u16(),
        }
    }
}

/// Reads a `Retry-After` header in either delta-seconds or HTTP-date form
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

/// Attaches the credential to a request
///
/// v4 read-access tokens are JWTs and go in the `Authorization` header; v3
/// keys go in the `api_key` query parameter.
fn apply_credential(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    if api_key.starts_with("eyJ") {
        request.bearer_auth(api_key)
    } else {
        request.query(&[("api_key", api_key)])
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - API settings carrying the timeouts
/// * `pool_size` - Idle connections kept per host, normally the run's concurrency
///
/// # Example
///
/// ```no_run
/// use tmdb_scraper::config::ApiConfig;
/// use tmdb_scraper::scraper::build_http_client;
///
/// let client = build_http_client(&ApiConfig::default(), 8).unwrap();
/// ```
pub fn build_http_client(config: &ApiConfig, pool_size: usize) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .pool_max_idle_per_host(pool_size.max(1))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches discover pages and the genre list from the upstream API
pub struct PageFetcher {
    client: Client,
    discover_url: Url,
    genre_url: Url,
    api_key: Option<String>,
    language: String,
    include_adult: bool,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    requests_sent: AtomicU64,
}

impl PageFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (its pool is reused across fetches)
    /// * `config` - Base URL, language, credential and retry settings
    /// * `include_adult` - Value of the `include_adult` query parameter
    /// * `limiter` - Rate limiter shared with every other fetcher of the run
    pub fn new(
        client: Client,
        config: &ApiConfig,
        include_adult: bool,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, url::ParseError> {
        let base = config.base_url.trim_end_matches('/');
        let discover_url = Url::parse(&format!("{}/discover/movie", base))?;
        let genre_url = Url::parse(&format!("{}/genre/movie/list", base))?;

        Ok(Self {
            client,
            discover_url,
            genre_url,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
            include_adult,
            limiter,
            retry: RetryPolicy::from_config(config),
            requests_sent: AtomicU64::new(0),
        })
    }

    /// Replaces the retry policy taken from the configuration
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Number of HTTP requests issued so far, retries included
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    /// Fetches one page of popular movies
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 401 | Immediate → `FetchError::Auth` |
    /// | HTTP 404 | Immediate → `FetchError::NotFound` |
    /// | Other 4xx | Immediate → `FetchError::Rejected` |
    /// | HTTP 408, 429, 5xx | Retry with backoff, honoring `Retry-After` |
    /// | Timeout, connection error | Retry with backoff |
    /// | Undecodable body | Retry with backoff |
    pub async fn fetch(&self, page_number: u32) -> Result<Page, FetchError> {
        let target = FetchTarget::Page(page_number);
        let page_param = page_number.to_string();
        let include_adult = if self.include_adult { "true" } else { "false" };
        let query = [
            ("page", page_param.as_str()),
            ("sort_by", "popularity.desc"),
            ("language", self.language.as_str()),
            ("include_adult", include_adult),
        ];

        let response: DiscoverResponse = self.get_json(&self.discover_url, &query, target).await?;
        let page = Page::from_response(page_number, response);

        tracing::debug!(
            "Fetched page {} ({} entries, has_more={})",
            page_number,
            page.entries.len(),
            page.has_more
        );

        Ok(page)
    }

    /// Fetches the movie genre list
    pub async fn fetch_genres(&self) -> Result<GenreMap, FetchError> {
        let query = [("language", self.language.as_str())];
        let response: GenreListResponse = self
            .get_json(&self.genre_url, &query, FetchTarget::Genres)
            .await?;

        let genres = GenreMap::from(response);
        tracing::info!("Fetched {} genres", genres.len());
        Ok(genres)
    }

    /// Runs the retry loop for one GET request and decodes its JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        target: FetchTarget,
    ) -> Result<T, FetchError> {
        let api_key = match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                tracing::error!("No API key configured; cannot fetch {}", target);
                return Err(FetchError::Auth { target });
            }
        };

        let max_attempts = self.retry.max_attempts;
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            self.limiter.acquire().await;

            let (reason, retry_after) = match self.attempt(url, query, api_key, target).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(error)) => {
                    tracing::error!("Fatal error fetching {}: {}", target, error);
                    return Err(error);
                }
                Err(AttemptError::Transient {
                    reason,
                    retry_after,
                }) => (reason, retry_after),
            };

            let attempts_made = attempt + 1;
            if attempts_made >= max_attempts {
                last_error = reason;
                break;
            }

            let delay = self.retry.backoff_delay(attempt, retry_after);
            tracing::warn!(
                "Fetching {} failed (attempt {}/{}): {}; retrying in {:?}",
                target,
                attempts_made,
                max_attempts,
                reason,
                delay
            );
            last_error = reason;
            tokio::time::sleep(delay).await;
        }

        tracing::error!(
            "Failed to fetch {} after {} attempts: {}",
            target,
            max_attempts,
            last_error
        );

        Err(FetchError::RetriesExhausted {
            target,
            attempts: max_attempts,
            last_error,
        })
    }

    /// Issues a single request
    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, &str)],
        api_key: &str,
        target: FetchTarget,
    ) -> Result<T, AttemptError> {
        let request = apply_credential(self.client.get(url.clone()).query(query), api_key);
        self.requests_sent.fetch_add(1, Ordering::Relaxed);

        let response = request.send().await.map_err(|e| AttemptError::Transient {
            reason: describe_transport_error(&e),
            retry_after: None,
        })?;

        let status = response.status();
        if !status.is_success() {
            return match classify_status(status) {
                StatusClass::Transient => Err(AttemptError::Transient {
                    reason: format!("HTTP {}", status.as_u16()),
                    retry_after: parse_retry_after(response.headers()),
                }),
                StatusClass::Fatal => Err(AttemptError::Fatal(fatal_for_status(status, target))),
            };
        }

        let body = response.bytes().await.map_err(|e| AttemptError::Transient {
            reason: describe_transport_error(&e),
            retry_after: None,
        })?;

        serde_json::from_slice(&body).map_err(|e| AttemptError::Transient {
            reason: format!("invalid response body: {}", e),
            retry_after: None,
        })
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch_page(&self, page_number: u32) -> Result<Page, FetchError> {
        self.fetch(page_number).await
    }
}
