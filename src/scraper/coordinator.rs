//! Pipeline coordinator - main scrape orchestration logic
//!
//! This module wires the scheduler, the normalizer and the aggregator into a
//! single run. Pages are processed as soon as they arrive in order: each one
//! is normalized and aggregated before the next page is awaited.

use crate::config::{Config, ScraperConfig};
use crate::movie::{normalize, GenreMap, MovieRecord};
use crate::scraper::fetcher::{build_http_client, PageFetcher, PageSource};
use crate::scraper::rate_limit::RateLimiter;
use crate::scraper::scheduler::{Demand, Scheduler};
use crate::state::{Aggregator, PipelineState};
use crate::PipelineError;
use std::sync::Arc;
use std::time::Instant;

/// Main pipeline structure
///
/// Runs once: target count in, ordered and deduplicated records out.
pub struct Pipeline<S: PageSource> {
    settings: ScraperConfig,
    scheduler: Scheduler<S>,
    genres: Arc<GenreMap>,
    state: PipelineState,
}

impl<S: PageSource> Pipeline<S> {
    /// Creates a new pipeline
    ///
    /// # Arguments
    ///
    /// * `settings` - Target count and concurrency for this run
    /// * `source` - Where pages come from
    /// * `genres` - Genre lookup used by the normalizer
    pub fn new(settings: ScraperConfig, source: Arc<S>, genres: Arc<GenreMap>) -> Self {
        let scheduler = Scheduler::new(source, settings.concurrency);
        Self {
            settings,
            scheduler,
            genres,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn settings(&self) -> &ScraperConfig {
        &self.settings
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("Pipeline {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<MovieRecord>)` - `min(target_count, available)` records with
    ///   distinct ids, ordered by page then position within the page
    /// * `Err(PipelineError)` - The first fatal error; no records are returned
    pub async fn run(&mut self) -> Result<Vec<MovieRecord>, PipelineError> {
        let target_count = self.settings.target_count;

        if target_count == 0 {
            self.transition(PipelineState::Completed)?;
            return Ok(Vec::new());
        }

        self.transition(PipelineState::Fetching)?;
        tracing::info!(
            "Collecting {} movies with {} concurrent requests",
            target_count,
            self.scheduler.concurrency()
        );

        let start_time = Instant::now();
        let genres = Arc::clone(&self.genres);
        let mut aggregator = Aggregator::new(target_count);
        let mut phase = self.state;

        let result = self
            .scheduler
            .run(target_count, |page| {
                advance(&mut phase, PipelineState::Normalizing);
                let records: Vec<MovieRecord> = page
                    .entries
                    .iter()
                    .map(|raw| normalize(raw, &genres))
                    .collect();

                advance(&mut phase, PipelineState::Aggregating);
                for record in records {
                    if aggregator.is_full() {
                        break;
                    }
                    aggregator.add(record);
                }

                tracing::info!(
                    "Progress: page {} processed, {}/{} movies collected",
                    page.page_number,
                    aggregator.len(),
                    target_count
                );

                if aggregator.is_full() {
                    Demand::Satisfied
                } else {
                    advance(&mut phase, PipelineState::Fetching);
                    Demand::Needs(aggregator.remaining())
                }
            })
            .await;

        self.state = phase;

        match result {
            Ok(outcome) => {
                self.transition(PipelineState::Completed)?;

                if aggregator.len() < target_count {
                    tracing::warn!(
                        "Upstream provided only {} of {} requested movies",
                        aggregator.len(),
                        target_count
                    );
                }

                tracing::info!(
                    "Collected {} movies from {} pages in {:?} ({} duplicates dropped)",
                    aggregator.len(),
                    outcome.pages_delivered,
                    start_time.elapsed(),
                    aggregator.duplicates()
                );

                Ok(aggregator.into_records())
            }
            Err(error) => {
                self.transition(PipelineState::Failed)?;
                tracing::error!(
                    "Pipeline failed after collecting {} movies: {}",
                    aggregator.len(),
                    error
                );
                Err(error.into())
            }
        }
    }
}

/// Moves the per-page phase forward
fn advance(phase: &mut PipelineState, next: PipelineState) {
    debug_assert!(
        phase.can_transition_to(next),
        "invalid pipeline transition {} -> {}",
        phase,
        next
    );
    *phase = next;
}

/// Builds the fetcher described by the configuration
///
/// The fetcher owns a fresh HTTP client and rate limiter; share it through
/// an `Arc` to fetch genres and pages under the same quota.
pub fn build_fetcher(config: &Config) -> Result<PageFetcher, PipelineError> {
    let client = build_http_client(&config.api, config.scraper.concurrency)?;
    let limiter = Arc::new(RateLimiter::new(
        config.api.requests_per_window,
        config.api.window(),
    ));

    let fetcher = PageFetcher::new(
        client,
        &config.api,
        config.scraper.include_adult(),
        limiter,
    )?;

    Ok(fetcher)
}

/// Runs a complete scrape
///
/// This is the main entry point for collecting movies. It will:
/// 1. Build the HTTP client, rate limiter and fetcher
/// 2. Schedule page fetches
/// 3. Normalize and deduplicate entries in page order
///
/// # Arguments
///
/// * `config` - The scraper configuration (credential included)
/// * `genres` - Genre lookup for the normalizer
pub async fn run_pipeline(
    config: &Config,
    genres: GenreMap,
) -> Result<Vec<MovieRecord>, PipelineError> {
    let fetcher = Arc::new(build_fetcher(config)?);
    let mut pipeline = Pipeline::new(config.scraper.clone(), fetcher, Arc::new(genres));
    pipeline.run().await
}
