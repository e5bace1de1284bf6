//! Sliding-window rate limiter shared by all extraction workers
//!
//! Two optional ceilings (per minute, per hour) over one timestamp log. The
//! prune/check/record sequence runs under a single lock so two callers can
//! never both take the last slot.

use crate::config::RateLimitConfig;
use crate::domain::ExtractionError;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Outcome of [`RateLimiter::check_and_record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The call was recorded and may proceed
    Allowed,
    /// A ceiling is reached; a slot frees up after `wait`
    Throttled { wait: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    span: Duration,
    limit: usize,
}

/// Per-minute / per-hour call throttle
#[derive(Debug)]
pub struct RateLimiter {
    windows: Vec<Window>,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter; `None` disables a window
    pub fn new(per_minute: Option<u32>, per_hour: Option<u32>) -> Self {
        let windows = [(MINUTE, per_minute), (HOUR, per_hour)]
            .into_iter()
            .filter_map(|(span, limit)| {
                limit.map(|l| Window {
                    span,
                    limit: l.max(1) as usize,
                })
            })
            .collect();

        Self {
            windows,
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// A limiter with no ceilings
    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// Creates a limiter from the `[rate_limit]` section
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.per_minute, config.per_hour)
    }

    /// True when no window is configured
    pub fn is_unlimited(&self) -> bool {
        self.windows.is_empty()
    }

    /// Prune expired entries, test every ceiling and record the call if allowed
    ///
    /// When several windows are full the longest wait is reported.
    pub fn check_and_record(&self) -> RateDecision {
        if self.windows.is_empty() {
            return RateDecision::Allowed;
        }

        let now = Instant::now();
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());

        let longest = self.windows.iter().map(|w| w.span).max().unwrap_or(HOUR);
        while let Some(oldest) = calls.front() {
            if now.duration_since(*oldest) >= longest {
                calls.pop_front();
            } else {
                break;
            }
        }

        let mut wait = Duration::ZERO;
        for window in &self.windows {
            let first_inside = calls.partition_point(|ts| now.duration_since(*ts) >= window.span);
            let in_window = calls.len() - first_inside;
            if in_window >= window.limit {
                // The entry whose expiry brings the count back under the limit
                let blocking = calls[first_inside + (in_window - window.limit)];
                let expires_in = window.span.saturating_sub(now.duration_since(blocking));
                wait = wait.max(expires_in.max(Duration::from_millis(1)));
            }
        }

        if wait > Duration::ZERO {
            return RateDecision::Throttled { wait };
        }

        calls.push_back(now);
        RateDecision::Allowed
    }

    /// Wait for a slot, sleeping at most `budget` in total
    ///
    /// # Errors
    ///
    /// Returns a retryable [`ExtractionError::Throttled`] when the next slot is
    /// further away than the remaining budget.
    pub async fn acquire(&self, budget: Duration) -> Result<(), ExtractionError> {
        let mut waited = Duration::ZERO;
        loop {
            match self.check_and_record() {
                RateDecision::Allowed => return Ok(()),
                RateDecision::Throttled { wait } => {
                    if waited + wait > budget {
                        tracing::debug!(
                            wait_ms = wait.as_millis() as u64,
                            budget_ms = budget.as_millis() as u64,
                            "Rate limit wait exceeds budget"
                        );
                        return Err(ExtractionError::Throttled { wait });
                    }
                    tracing::debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit slot");
                    tokio::time::sleep(wait).await;
                    waited += wait;
                }
            }
        }
    }

    /// Calls recorded within the last hour
    pub fn recorded_calls(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_else(|e| e.into_inner().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_unlimited_always_allows() {
        let limiter = RateLimiter::unlimited();
        for _ in 0..1000 {
            assert_eq!(limiter.check_and_record(), RateDecision::Allowed);
        }
        assert_eq!(limiter.recorded_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_minute_ceiling() {
        let limiter = RateLimiter::new(Some(3), None);
        for _ in 0..3 {
            assert_eq!(limiter.check_and_record(), RateDecision::Allowed);
        }

        tokio::time::advance(Duration::from_secs(10)).await;
        match limiter.check_and_record() {
            RateDecision::Throttled { wait } => {
                assert!(wait > Duration::ZERO);
                assert!(wait <= Duration::from_secs(50));
            }
            RateDecision::Allowed => panic!("4th call inside the minute must be throttled"),
        }

        tokio::time::advance(Duration::from_secs(51)).await;
        assert_eq!(limiter.check_and_record(), RateDecision::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_tracks_oldest_violating_entry() {
        let limiter = RateLimiter::new(Some(2), None);
        limiter.check_and_record();
        tokio::time::advance(Duration::from_secs(20)).await;
        limiter.check_and_record();
        tokio::time::advance(Duration::from_secs(5)).await;

        // Oldest entry is 25s old, so it expires in 35s
        assert_eq!(
            limiter.check_and_record(),
            RateDecision::Throttled {
                wait: Duration::from_secs(35)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_longer_wait_wins_when_both_windows_full() {
        let limiter = RateLimiter::new(Some(1), Some(1));
        limiter.check_and_record();
        tokio::time::advance(Duration::from_secs(61)).await;

        match limiter.check_and_record() {
            RateDecision::Throttled { wait } => {
                assert_eq!(wait, Duration::from_secs(3600 - 61));
            }
            RateDecision::Allowed => panic!("hour window must still be full"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_sleeps_within_budget() {
        let limiter = RateLimiter::new(Some(1), None);
        limiter.acquire(Duration::from_secs(5)).await.unwrap();

        let start = Instant::now();
        limiter.acquire(Duration::from_secs(120)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_fails_past_budget() {
        let limiter = RateLimiter::new(Some(1), None);
        limiter.acquire(Duration::from_secs(1)).await.unwrap();

        let err = limiter.acquire(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Throttled { .. }));
        assert!(err.is_retryable());
    }
}
