//! Retry delays after rate-limit responses

use std::time::Duration;

/// Exponential backoff with an attempt cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// First retry delay
    base_delay: Duration,
    /// Upper bound for any single delay
    max_delay: Duration,
    /// Retries allowed before giving up
    max_retries: u32,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_retries,
        }
    }

    /// Delay before retry number `retry` (0-based), or `None` once retries are exhausted
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        // 2^retry * base_delay
        let multiplier = 2u32.saturating_pow(retry.min(16));
        let delay = self.base_delay.saturating_mul(multiplier);
        Some(delay.min(self.max_delay))
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_secs(30), 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_until_capped_then_stops() {
        let backoff = ExponentialBackoff::default();
        let delays: Vec<_> = (0..10).map(|r| backoff.delay_for(r)).collect();

        assert_eq!(delays[0], Some(Duration::from_secs(3)));
        assert_eq!(delays[1], Some(Duration::from_secs(6)));
        assert_eq!(delays[2], Some(Duration::from_secs(12)));
        assert_eq!(delays[3], Some(Duration::from_secs(24)));
        assert_eq!(delays[4], Some(Duration::from_secs(30)));
        assert_eq!(delays[7], Some(Duration::from_secs(30)));
        assert_eq!(delays[8], None);
    }

    #[test]
    fn zero_retries_never_retries() {
        let backoff = ExponentialBackoff::new(Duration::from_millis(10), Duration::from_millis(10), 0);
        assert_eq!(backoff.delay_for(0), None);
    }
}
