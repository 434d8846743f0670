//! Scheduler for bounded-parallel page fetches
//!
//! This module handles:
//! - Planning how many pages a target count needs
//! - Keeping at most `concurrency` fetches in flight
//! - Reassembling completed pages in ascending page order
//! - Stopping on consumer satisfaction, end of upstream data or a fatal error

use crate::config::MAX_CONCURRENCY;
use crate::scraper::fetcher::{Page, PageSource};
use crate::FetchError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Entries per discover page, fixed by upstream
pub const PAGE_SIZE: usize = 20;

/// Highest page number upstream will serve
pub const MAX_PAGES: u32 = 500;

/// Number of pages needed to collect `count` entries, capped at [`MAX_PAGES`]
pub fn pages_needed(count: usize) -> u32 {
    let pages = (count + PAGE_SIZE - 1) / PAGE_SIZE;
    pages.min(MAX_PAGES as usize) as u32
}

/// Consumer's answer after receiving a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demand {
    /// No further pages are wanted
    Satisfied,

    /// This many more records are still wanted
    Needs(usize),
}

/// Summary of a finished schedule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleOutcome {
    /// Pages handed to the consumer
    pub pages_delivered: u32,

    /// Page fetches started, including ones whose result was discarded
    pub pages_dispatched: u32,

    /// Upstream reported that no further pages exist
    pub upstream_exhausted: bool,
}

/// Issues page fetches with bounded parallelism and delivers them in order
pub struct Scheduler<S: PageSource> {
    source: Arc<S>,
    concurrency: usize,
}

impl<S: PageSource> Scheduler<S> {
    /// Creates a scheduler
    ///
    /// `concurrency` is clamped to `1..=MAX_CONCURRENCY`.
    pub fn new(source: Arc<S>, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.clamp(1, MAX_CONCURRENCY),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Fetches pages until the consumer is satisfied or upstream runs out
    ///
    /// # Flow
    ///
    /// 1. Plan `ceil(target_count / PAGE_SIZE)` pages
    /// 2. Keep up to `concurrency` fetches in flight, lowest page numbers first
    /// 3. Buffer completions and call `deliver` for each page in ascending order
    /// 4. If every planned page was delivered and the consumer still needs
    ///    records, plan enough additional pages for the remainder
    ///
    /// Pages after one reporting `has_more = false` are never delivered.
    ///
    /// # Errors
    ///
    /// An `Auth` error is returned as soon as it arrives. Any other failure
    /// is returned once its page is the next one to deliver, so a failure on
    /// a page past the end of upstream's catalogue is dropped no matter when
    /// it completes. Nothing new is dispatched past a failed page; fetches
    /// already in flight are detached and their results dropped.
    pub async fn run<F>(
        &self,
        target_count: usize,
        mut deliver: F,
    ) -> Result<ScheduleOutcome, FetchError>
    where
        F: FnMut(Page) -> Demand,
    {
        let mut outcome = ScheduleOutcome::default();
        if target_count == 0 {
            return Ok(outcome);
        }

        let mut limit = pages_needed(target_count);
        let mut last_page = MAX_PAGES;
        let mut next_dispatch: u32 = 1;
        let mut next_deliver: u32 = 1;
        let mut first_failed: Option<u32> = None;
        let mut ready: BTreeMap<u32, Result<Page, FetchError>> = BTreeMap::new();
        let mut in_flight: JoinSet<(u32, Result<Page, FetchError>)> = JoinSet::new();

        tracing::debug!(
            "Scheduling {} pages for {} records with concurrency {}",
            limit,
            target_count,
            self.concurrency
        );

        loop {
            while in_flight.len() < self.concurrency
                && next_dispatch <= limit
                && next_dispatch <= last_page
                && first_failed.map_or(true, |failed| next_dispatch < failed)
            {
                in_flight.spawn(fetch_task(Arc::clone(&self.source), next_dispatch));
                next_dispatch += 1;
                outcome.pages_dispatched += 1;
            }

            let joined = match in_flight.join_next().await {
                Some(joined) => joined,
                None => break,
            };

            // fetch_task never panics; it is only cancelled when the set is dropped
            let (page_number, result) = match joined {
                Ok(completed) => completed,
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(_) => continue,
            };

            if page_number > last_page {
                tracing::trace!("Discarding page {} past the last page", page_number);
                continue;
            }

            match result {
                Ok(page) => {
                    if !page.has_more {
                        last_page = last_page.min(page_number);
                    }
                    if let Some(total) = page.total_pages {
                        last_page = last_page.min(total.max(1));
                    }
                    ready.insert(page_number, Ok(page));
                }
                Err(error) if is_page_independent(&error) || page_number == next_deliver => {
                    tracing::warn!(
                        "Page {} failed, abandoning {} in-flight fetches: {}",
                        page_number,
                        in_flight.len(),
                        error
                    );
                    in_flight.detach_all();
                    return Err(error);
                }
                Err(error) => {
                    tracing::debug!(
                        "Page {} failed ahead of page {}; holding the error: {}",
                        page_number,
                        next_deliver,
                        error
                    );
                    first_failed = Some(first_failed.map_or(page_number, |p| p.min(page_number)));
                    ready.insert(page_number, Err(error));
                }
            }

            while let Some(entry) = ready.remove(&next_deliver) {
                let page = match entry {
                    Ok(page) => page,
                    Err(error) => {
                        tracing::warn!(
                            "Page {} failed, abandoning {} in-flight fetches: {}",
                            next_deliver,
                            in_flight.len(),
                            error
                        );
                        in_flight.detach_all();
                        return Err(error);
                    }
                };

                let is_last = next_deliver >= last_page;
                next_deliver += 1;
                outcome.pages_delivered += 1;

                match deliver(page) {
                    Demand::Satisfied => {
                        in_flight.detach_all();
                        return Ok(outcome);
                    }
                    Demand::Needs(_) if is_last => {
                        tracing::info!("Upstream has no pages after page {}", next_deliver - 1);
                        outcome.upstream_exhausted = true;
                        in_flight.detach_all();
                        return Ok(outcome);
                    }
                    Demand::Needs(remaining) => {
                        if next_deliver > limit {
                            let extra = pages_needed(remaining).max(1);
                            limit = limit.saturating_add(extra).min(MAX_PAGES);
                            tracing::debug!(
                                "Still need {} records, extending plan to {} pages",
                                remaining,
                                limit
                            );
                        }
                    }
                }
            }
        }

        if next_deliver > MAX_PAGES {
            tracing::warn!("Reached upstream page limit of {}", MAX_PAGES);
        }

        Ok(outcome)
    }
}

/// Fetches one page in its own task so a panicking source is reported
/// against the page it was fetching
async fn fetch_task<S: PageSource>(
    source: Arc<S>,
    page_number: u32,
) -> (u32, Result<Page, FetchError>) {
    let fetch = tokio::spawn(async move { source.fetch_page(page_number).await });
    let result = match fetch.await {
        Ok(result) => result,
        Err(join_error) => Err(FetchError::Task {
            page: page_number,
            message: join_error.to_string(),
        }),
    };
    (page_number, result)
}

/// Errors that would hit every page alike
fn is_page_independent(error: &FetchError) -> bool {
    matches!(error, FetchError::Auth { .. })
}
