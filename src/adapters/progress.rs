//! Batch progress reporting

use crate::domain::BatchId;

/// Receives one call per finished batch
///
/// Fire-and-forget: the orchestrator ignores whatever the sink does. Calls
/// arrive in order with a strictly increasing `processed` count.
pub trait ProgressSink: Send + Sync {
    fn on_batch_complete(&self, processed: usize, total: usize, batch_id: &BatchId, success: bool);
}

/// Emits a structured `tracing` event per completed batch
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProgressSink;

impl ProgressSink for LoggingProgressSink {
    fn on_batch_complete(&self, processed: usize, total: usize, batch_id: &BatchId, success: bool) {
        crate::log_batch_progress!(processed, total, batch_id, success);
    }
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn on_batch_complete(&self, _: usize, _: usize, _: &BatchId, _: bool) {}
}
