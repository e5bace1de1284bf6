//! Exponential-backoff retry executor
//!
//! `delay(n) = min(initial * 2^n, max) + uniform(0..=jitter)` where `n` is the
//! zero-based retry index, raised to the error's own wait hint when it has
//! one. Fatal errors are returned immediately. Failures that never reached
//! the remote side (local throttling) wait out their hint without using up
//! a retry.

use crate::config::RetryConfig;
use crate::domain::Retryable;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Sleep for an uncounted failure that carries no usable hint
const MIN_UNCOUNTED_WAIT: Duration = Duration::from_millis(100);

/// Backoff parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter: Duration,
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Backoff before retry number `retry_index` (zero-based), without jitter
    pub fn base_delay(&self, retry_index: u32) -> Duration {
        let factor = 2u32.checked_pow(retry_index).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn delay_with_jitter(&self, retry_index: u32) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.base_delay(retry_index) + Duration::from_millis(extra)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

/// Passed to the retry hook before each backoff sleep
#[derive(Debug, Clone)]
pub struct RetryEvent {
    pub operation: String,
    /// 1-based retry number
    pub retry: u32,
    pub max_retries: u32,
    pub delay: Duration,
    pub error: String,
}

/// Observer called on every retry
pub type RetryHook = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Final failure together with the number of calls made
#[derive(Debug, Clone, PartialEq)]
pub struct RetryFailure<E> {
    pub error: E,
    pub attempts: u32,
}

impl<E: fmt::Display> fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} attempt(s))", self.error, self.attempts)
    }
}

/// Runs an async operation with retry on transient failures
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    hook: Option<RetryHook>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, hook: None }
    }

    /// Registers a hook called before each retry; it cannot suppress failures
    pub fn with_hook(mut self, hook: RetryHook) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calls `operation` until it succeeds, fails fatally, or retries run out
    ///
    /// # Errors
    ///
    /// The first fatal error, or the last retryable one once `max_retries`
    /// retries have been spent. Either way the attempt count is attached.
    pub async fn execute<T, E, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        let mut attempts = 0u32;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if error.is_retryable() && !error.consumes_attempt() {
                let wait = error
                    .retry_after()
                    .filter(|w| !w.is_zero())
                    .unwrap_or(MIN_UNCOUNTED_WAIT);
                tracing::debug!(
                    operation = operation_name,
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "Waiting before retrying without using an attempt"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            attempts += 1;
            let retry_index = attempts - 1;
            if !error.is_retryable() || retry_index >= self.policy.max_retries {
                if error.is_retryable() {
                    tracing::warn!(
                        operation = operation_name,
                        attempts,
                        error = %error,
                        "Retries exhausted"
                    );
                }
                return Err(RetryFailure { error, attempts });
            }

            let delay = match error.retry_after() {
                Some(hint) => self.policy.delay_with_jitter(retry_index).max(hint),
                None => self.policy.delay_with_jitter(retry_index),
            };
            let event = RetryEvent {
                operation: operation_name.to_string(),
                retry: attempts,
                max_retries: self.policy.max_retries,
                delay,
                error: error.to_string(),
            };

            crate::log_retry_attempt!(
                event.operation,
                event.retry,
                event.max_retries,
                delay.as_millis() as u64,
                event.error
            );

            if let Some(hook) = &self.hook {
                hook(&event);
            }

            tokio::time::sleep(delay).await;
        }
    }
}
