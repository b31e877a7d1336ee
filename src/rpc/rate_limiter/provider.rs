//! Per-service rate limiter using Governor (GCRA algorithm)

use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Bounds the request rate against one external service
///
/// Allows at most `requests_per_window` acquisitions per `window`, shared by
/// every task holding the limiter. Capacity comes back as the window elapses,
/// not when a request completes, so this limits rate and not concurrency.
pub struct RequestRateLimiter {
    /// Service identifier (for logs)
    service: String,

    /// Governor rate limiter (GCRA - Generic Cell Rate Algorithm)
    limiter: GovernorLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,

    requests_per_window: u32,
    window: Duration,

    /// Total acquisitions granted
    acquired: AtomicU64,
}

impl RequestRateLimiter {
    /// Create new rate limiter
    pub fn new(service: &str, requests_per_window: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(requests_per_window).unwrap_or(NonZeroU32::MIN);

        // One cell every window/N, with the whole window's worth available as burst
        let period = (window / burst.get()).max(Duration::from_nanos(1));
        let quota = Quota::with_period(period)
            .map(|q| q.allow_burst(burst))
            .unwrap_or_else(|| Quota::per_second(burst));

        Self {
            service: service.to_string(),
            limiter: GovernorLimiter::direct(quota),
            requests_per_window: burst.get(),
            window,
            acquired: AtomicU64::new(0),
        }
    }

    /// Wait until the rate limit allows a request; never fails
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Try to acquire without waiting
    #[cfg(test)]
    fn try_acquire(&self) -> bool {
        if self.limiter.check().is_ok() {
            self.acquired.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Acquisitions granted so far
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("service", &self.service)
            .field("requests_per_window", &self.requests_per_window)
            .field("window", &self.window)
            .field("acquired", &self.acquired())
            .finish()
    }
}
