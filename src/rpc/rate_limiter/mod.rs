//! Request pacing: GCRA rate limiting and retry backoff

mod adaptive;
mod provider;

pub use adaptive::ExponentialBackoff;
pub use provider::RequestRateLimiter;
