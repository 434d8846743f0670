//! Scraper module for paging through the upstream API
//!
//! This module contains the core fetch-and-aggregate logic, including:
//! - Sliding-window rate limiting shared by all requests
//! - HTTP fetching with retry and backoff
//! - Bounded-parallel page scheduling with in-order delivery
//! - Overall pipeline coordination

mod coordinator;
mod fetcher;
mod rate_limit;
mod scheduler;

pub use coordinator::{build_fetcher, run_pipeline, Pipeline};
pub use fetcher::{build_http_client, parse_retry_after, Page, PageFetcher, PageSource, RetryPolicy};
pub use rate_limit::RateLimiter;
pub use scheduler::{pages_needed, Demand, ScheduleOutcome, Scheduler, MAX_PAGES, PAGE_SIZE};
