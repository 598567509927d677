use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep_until, Duration, Instant};
use parking_lot::Mutex;

/// Rate limiter to control market data request frequency
///
/// Alpha Vantage's free tier allows 5 requests per minute, so the default
/// configuration spaces provider calls 15 seconds apart. One limiter is shared
/// by every job that talks to the provider.
pub struct RateLimiter {
    /// Semaphore to limit concurrent requests
    semaphore: Arc<Semaphore>,
    /// Earliest instant the next request may start
    next_slot: Arc<Mutex<Instant>>,
    /// Minimum delay between the start of two requests
    min_delay: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_concurrent` - Maximum number of requests in flight at once
    /// * `min_delay` - Minimum spacing between the start of two requests
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use stockdb_backend::services::rate_limiter::RateLimiter;
    ///
    /// // One request at a time, 15 seconds apart
    /// let limiter = RateLimiter::new(1, Duration::from_secs(15));
    /// assert_eq!(limiter.min_delay(), Duration::from_secs(15));
    /// ```
    pub fn new(max_concurrent: usize, min_delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            next_slot: Arc::new(Mutex::new(Instant::now())),
            min_delay,
        }
    }

    /// Zero-delay limiter, for tests and offline providers.
    pub fn unlimited() -> Self {
        Self::new(Semaphore::MAX_PERMITS, Duration::ZERO)
    }

    /// Acquire permission to make a request
    ///
    /// This will wait until:
    /// 1. A semaphore permit is available (concurrent limit)
    /// 2. The reserved time slot has arrived (rate limit)
    ///
    /// Returns a guard that releases the permit when dropped.
    pub async fn acquire(&self) -> RateLimitGuard {
        // The semaphore is never closed, so a failed acquire only means "no permit to hold"
        let permit = self.semaphore.clone().acquire_owned().await.ok();

        // Reserve a slot under the lock so concurrent callers get distinct slots
        let slot = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + self.min_delay;
            slot
        }; // Lock is dropped here

        // Sleep outside the lock if needed
        if slot > Instant::now() {
            sleep_until(slot).await;
        }

        RateLimitGuard { _permit: permit }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Get the current utilization (for monitoring)
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Guard that holds a rate limit permit
/// The permit is automatically released when this is dropped
pub struct RateLimitGuard {
    _permit: Option<tokio::sync::OwnedSemaphorePermit>,
}
