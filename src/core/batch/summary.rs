//! Orchestration outcome and per-batch error entries

use crate::domain::{Batch, BatchId, BatchStatus, RawExtractedRecord};
use serde::{Deserialize, Serialize};

/// Why a batch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchErrorKind {
    /// Transient failures outlasted every retry
    RetriesExhausted,
    /// A non-retryable failure
    Fatal,
    /// The worker task died before reporting
    Aborted,
}

/// A failed batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    pub batch_id: BatchId,
    pub kind: BatchErrorKind,
    pub message: String,
    /// Calls made to the extraction collaborator
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Result of [`super::BatchOrchestrator::submit`]
#[derive(Debug, Default)]
pub struct OrchestrationOutcome {
    /// Records ordered by (batch ordinal, record index)
    pub records: Vec<RawExtractedRecord>,
    pub errors: Vec<BatchError>,
    /// Every submitted batch in its final state, in submission order
    pub batches: Vec<Batch>,
    /// Batches left pending because of cancellation
    pub not_dispatched: usize,
    pub cancelled: bool,
}

impl OrchestrationOutcome {
    pub fn succeeded(&self) -> usize {
        self.count(BatchStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(BatchStatus::Failed)
    }

    fn count(&self, status: BatchStatus) -> usize {
        self.batches.iter().filter(|b| b.status() == status).count()
    }

    /// Log the outcome
    pub fn log_summary(&self) {
        tracing::info!(
            batches = self.batches.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            not_dispatched = self.not_dispatched,
            records = self.records.len(),
            cancelled = self.cancelled,
            "Extraction finished"
        );

        for error in &self.errors {
            tracing::warn!(
                batch_id = %error.batch_id,
                kind = ?error.kind,
                attempts = error.attempts,
                message = %error.message,
                "Batch failed"
            );
        }
    }
}
