//! Bounded-concurrency batch dispatch
//!
//! Batches run on a semaphore-bounded pool of tokio tasks. Each call goes
//! through the shared rate limiter, a per-call timeout and the retry
//! executor. A failed batch becomes a [`BatchError`]; it never stops the
//! others.

use super::summary::{BatchError, BatchErrorKind, OrchestrationOutcome};
use crate::adapters::extraction::ExtractionClient;
use crate::adapters::progress::{NoopProgressSink, ProgressSink};
use crate::config::AlmonerConfig;
use crate::core::throttle::{RateLimiter, RetryExecutor, RetryFailure, RetryPolicy};
use crate::domain::{Batch, BatchStatus, ExtractionError, RawExtractedRecord};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

/// Default worker pool size
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Worker pool size
    pub max_concurrency: usize,
    /// Timeout for a single extraction call
    pub call_timeout: Duration,
    /// Longest a worker blocks on the rate limiter per attempt
    pub max_rate_wait: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            call_timeout: Duration::from_secs(120),
            max_rate_wait: Duration::from_secs(30),
        }
    }
}

impl From<&AlmonerConfig> for OrchestratorSettings {
    fn from(config: &AlmonerConfig) -> Self {
        Self {
            max_concurrency: config.extraction.max_concurrency,
            call_timeout: config.extraction.timeout(),
            max_rate_wait: config.rate_limit.max_wait(),
        }
    }
}

/// What a worker task hands back
struct WorkerOutput {
    slot: usize,
    batch: Batch,
    result: Result<Vec<RawExtractedRecord>, BatchError>,
}

/// Dispatches batches to the extraction collaborator
pub struct BatchOrchestrator {
    client: Arc<dyn ExtractionClient>,
    limiter: Arc<RateLimiter>,
    retry: RetryExecutor,
    progress: Arc<dyn ProgressSink>,
    settings: OrchestratorSettings,
}

impl BatchOrchestrator {
    /// Creates an orchestrator with no rate limit, default retry policy and no
    /// progress sink
    pub fn new(client: Arc<dyn ExtractionClient>, settings: OrchestratorSettings) -> Self {
        Self {
            client,
            limiter: Arc::new(RateLimiter::unlimited()),
            retry: RetryExecutor::new(RetryPolicy::default()),
            progress: Arc::new(NoopProgressSink),
            settings,
        }
    }

    /// Shares a rate limiter with this orchestrator
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Runs every batch to completion
    pub async fn submit(&self, batches: Vec<Batch>) -> OrchestrationOutcome {
        let (_tx, rx) = watch::channel(false);
        self.submit_until(batches, rx).await
    }

    /// Runs batches until done or until `shutdown` turns true
    ///
    /// After shutdown no new batch is dispatched; in-flight batches finish and
    /// their records are returned.
    pub async fn submit_until(
        &self,
        batches: Vec<Batch>,
        mut shutdown: watch::Receiver<bool>,
    ) -> OrchestrationOutcome {
        let total = batches.len();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrency.max(1)));
        let processed = Arc::new(Mutex::new(0usize));
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Batch> = Vec::with_capacity(total);
        let mut cancelled = false;
        let mut not_dispatched = 0usize;

        tracing::info!(
            batches = total,
            max_concurrency = self.settings.max_concurrency,
            "Dispatching batches"
        );

        for (slot, mut batch) in batches.into_iter().enumerate() {
            if cancelled {
                not_dispatched += 1;
                slots.push(batch);
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                tracing::warn!(
                    remaining = total - slot,
                    "Shutdown requested, no further batches will be dispatched"
                );
                cancelled = true;
                not_dispatched += 1;
                slots.push(batch);
                continue;
            };

            if let Err(e) = batch.mark_dispatched() {
                tracing::error!(batch_id = %batch.id, error = %e, "Refusing to dispatch batch");
                slots.push(batch);
                continue;
            }
            slots.push(batch.clone());

            let client = Arc::clone(&self.client);
            let limiter = Arc::clone(&self.limiter);
            let retry = self.retry.clone();
            let progress = Arc::clone(&self.progress);
            let processed = Arc::clone(&processed);
            let settings = self.settings.clone();

            join_set.spawn(async move {
                let result = run_batch(&batch, client, limiter, &retry, &settings).await;
                drop(permit);

                let mut batch = batch;
                let transition = match &result {
                    Ok(_) => batch.mark_succeeded(),
                    Err(_) => batch.mark_failed(),
                };
                if let Err(e) = transition {
                    tracing::error!(batch_id = %batch.id, error = %e, "Invalid batch transition");
                }

                {
                    let mut count = processed.lock().unwrap_or_else(|e| e.into_inner());
                    *count += 1;
                    progress.on_batch_complete(*count, total, &batch.id, result.is_ok());
                }

                WorkerOutput {
                    slot,
                    batch,
                    result,
                }
            });
        }

        // Indexed by plan slot; batch ids are not unique across same-named documents
        let mut records_by_slot: Vec<Vec<RawExtractedRecord>> = vec![Vec::new(); total];
        let mut errors_by_slot: Vec<Option<BatchError>> = vec![None; total];

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(output) => {
                    match output.result {
                        Ok(batch_records) => records_by_slot[output.slot] = batch_records,
                        Err(error) => errors_by_slot[output.slot] = Some(error),
                    }
                    slots[output.slot] = output.batch;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Extraction worker task failed");
                }
            }
        }

        // Batches still marked dispatched belong to tasks that never reported
        for (slot, batch) in slots.iter_mut().enumerate() {
            if batch.status() == BatchStatus::Dispatched {
                let _ = batch.mark_failed();
                errors_by_slot[slot] = Some(BatchError {
                    batch_id: batch.id.clone(),
                    kind: BatchErrorKind::Aborted,
                    message: "Worker task ended without a result".to_string(),
                    attempts: 0,
                    status: None,
                });
            }
        }

        let mut order: Vec<usize> = (0..total).collect();
        order.sort_by_key(|&slot| slots[slot].ordinal);

        let mut records = Vec::new();
        let mut errors = Vec::new();
        for slot in order {
            records.append(&mut records_by_slot[slot]);
            if let Some(error) = errors_by_slot[slot].take() {
                errors.push(error);
            }
        }

        let outcome = OrchestrationOutcome {
            records,
            errors,
            batches: slots,
            not_dispatched,
            cancelled,
        };
        outcome.log_summary();
        outcome
    }
}

/// One batch: rate limit, timeout and retry around a single extraction call
async fn run_batch(
    batch: &Batch,
    client: Arc<dyn ExtractionClient>,
    limiter: Arc<RateLimiter>,
    retry: &RetryExecutor,
    settings: &OrchestratorSettings,
) -> Result<Vec<RawExtractedRecord>, BatchError> {
    let content = batch.content();
    let operation = format!("extract {}", batch.id);
    let call_timeout = settings.call_timeout;
    let max_rate_wait = settings.max_rate_wait;

    let result = retry
        .execute(&operation, || {
            let client = Arc::clone(&client);
            let limiter = Arc::clone(&limiter);
            let content = content.clone();
            async move {
                limiter.acquire(max_rate_wait).await?;
                match tokio::time::timeout(call_timeout, client.extract(&content)).await {
                    Ok(result) => result,
                    Err(_) => Err(ExtractionError::Timeout(format!(
                        "no response within {}s",
                        call_timeout.as_secs_f64()
                    ))),
                }
            }
        })
        .await;

    match result {
        Ok(mut records) => {
            let single_page = batch
                .page_range
                .filter(|r| r.start == r.end)
                .map(|r| r.start);
            for (index, record) in records.iter_mut().enumerate() {
                record.attach_source(&batch.id, index);
                if record.source_page.is_none() {
                    record.source_page = single_page;
                }
            }
            tracing::debug!(batch_id = %batch.id, records = records.len(), "Batch extracted");
            Ok(records)
        }
        Err(RetryFailure { error, attempts }) => {
            let kind = if error.is_retryable() {
                BatchErrorKind::RetriesExhausted
            } else {
                BatchErrorKind::Fatal
            };
            Err(BatchError {
                batch_id: batch.id.clone(),
                kind,
                status: error.status(),
                message: error.to_string(),
                attempts,
            })
        }
    }
}

/// Resolves once the shutdown flag is true; pends forever if the sender is gone
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
