//! Sliding-window rate limiter shared by all fetch tasks
//!
//! At most `max_requests` requests may start within any `window`. Callers
//! that would exceed the quota sleep until the oldest request in the window
//! expires.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Request-rate gate in front of the upstream API
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    issued: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`
    ///
    /// A quota of zero is treated as one so `acquire` can always make progress.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1) as usize;
        Self {
            max_requests,
            window,
            issued: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Waits until one more request is permitted, then records it
    ///
    /// Never fails; the only effect on the caller is delay.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.try_acquire(Instant::now()) {
                None => return,
                Some(wait) => wait,
            };

            tracing::trace!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Records a request at `now` if the quota allows it
    ///
    /// # Returns
    ///
    /// * `None` - The request was recorded
    /// * `Some(Duration)` - Time until a slot frees up
    fn try_acquire(&self, now: Instant) -> Option<Duration> {
        // The lock is never held across an await, so poisoning only follows a
        // panic inside this block; the queue is still consistent then.
        let mut issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        while let Some(&oldest) = issued.front() {
            if now.duration_since(oldest) >= self.window {
                issued.pop_front();
            } else {
                break;
            }
        }

        if issued.len() < self.max_requests {
            issued.push_back(now);
            return None;
        }

        issued
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
            .filter(|wait| !wait.is_zero())
            .or(Some(Duration::from_millis(1)))
    }

    /// Requests recorded within the current window
    pub fn in_window(&self) -> usize {
        let now = Instant::now();
        let issued = self
            .issued
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        issued
            .iter()
            .filter(|&&at| now.duration_since(at) < self.window)
            .count()
    }
}
