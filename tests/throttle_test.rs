//! Integration tests for rate limiting and retry with backoff

use almoner::core::throttle::{RateDecision, RateLimiter, RetryEvent, RetryExecutor, RetryPolicy};
use almoner::domain::ExtractionError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(2),
        jitter: Duration::ZERO,
    }
}

#[tokio::test(start_paused = true)]
async fn test_fourth_call_waits_for_minute_window() {
    let limiter = RateLimiter::new(Some(3), None);
    let started = Instant::now();

    for _ in 0..3 {
        limiter.acquire(Duration::from_secs(120)).await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    limiter.acquire(Duration::from_secs(120)).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(limiter.recorded_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_wait_beyond_budget_is_throttled() {
    let limiter = RateLimiter::new(Some(2), None);
    limiter.acquire(Duration::from_secs(5)).await.unwrap();
    limiter.acquire(Duration::from_secs(5)).await.unwrap();

    let err = limiter.acquire(Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, ExtractionError::Throttled { .. }));
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_hour_window_reports_longest_wait() {
    let limiter = RateLimiter::new(Some(10), Some(2));
    assert_eq!(limiter.check_and_record(), RateDecision::Allowed);
    assert_eq!(limiter.check_and_record(), RateDecision::Allowed);

    match limiter.check_and_record() {
        RateDecision::Throttled { wait } => {
            assert!(wait > Duration::from_secs(60));
            assert!(wait <= Duration::from_secs(3600));
        }
        RateDecision::Allowed => panic!("hour ceiling ignored"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_never_exceed_window() {
    let limiter = Arc::new(RateLimiter::new(Some(5), None));
    let allowed = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..20 {
        let limiter = Arc::clone(&limiter);
        let allowed = Arc::clone(&allowed);
        handles.push(tokio::spawn(async move {
            if limiter.check_and_record() == RateDecision::Allowed {
                allowed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(allowed.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_unlimited_never_throttles() {
    let limiter = RateLimiter::unlimited();
    assert!(limiter.is_unlimited());
    for _ in 0..1000 {
        assert_eq!(limiter.check_and_record(), RateDecision::Allowed);
    }
}

#[tokio::test(start_paused = true)]
async fn test_retry_recovers_after_server_error() {
    let executor = RetryExecutor::new(policy(3));
    let calls = AtomicU32::new(0);

    let result = executor
        .execute("extract slips.pdf#p1-10", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ExtractionError::from_status(503, "Service Unavailable"))
                } else {
                    Ok(vec!["record"])
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), vec!["record"]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_is_not_retried() {
    let executor = RetryExecutor::new(policy(3));
    let calls = AtomicU32::new(0);

    let failure = executor
        .execute("extract ledger.csv", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ExtractionError::from_status(400, "Bad Request")) }
        })
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(failure.attempts, 1);
    assert_eq!(failure.error.status(), Some(400));
}

#[tokio::test(start_paused = true)]
async fn test_hook_sees_every_retry() {
    let retries = Arc::new(AtomicU32::new(0));
    let observed = Arc::clone(&retries);
    let executor = RetryExecutor::new(policy(4)).with_hook(Arc::new(move |event: &RetryEvent| {
        observed.fetch_add(1, Ordering::SeqCst);
        assert_eq!(event.max_retries, 4);
    }));

    let failure = executor
        .execute("extract slip.png", || async {
            Err::<(), _>(ExtractionError::Timeout("no response".to_string()))
        })
        .await
        .unwrap_err();

    assert_eq!(retries.load(Ordering::SeqCst), 4);
    assert_eq!(failure.attempts, 5);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_between_attempts() {
    let executor = RetryExecutor::new(policy(3));
    let started = Instant::now();

    let _ = executor
        .execute("extract slip.png", || async {
            Err::<(), _>(ExtractionError::from_status(502, "Bad Gateway"))
        })
        .await;

    // 100ms + 200ms + 400ms
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(700));
    assert!(elapsed < Duration::from_millis(800));
}
