//! Call throttling: sliding-window rate limiting and retry with backoff

pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{RateDecision, RateLimiter};
pub use retry::{RetryEvent, RetryExecutor, RetryFailure, RetryHook, RetryPolicy};
