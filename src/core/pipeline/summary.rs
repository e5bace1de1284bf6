//! Run report and the request/response shapes of a reconciliation run

use crate::domain::ReconciledDonation;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Where in the run an issue came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Unsupported or unreadable document
    Planning,
    /// A batch failed at the extraction collaborator
    Extraction,
    /// Customer directory unavailable
    Match,
    /// A record without enough identifying fields
    Identity,
}

/// A warning or error with optional context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunIssue {
    pub kind: IssueKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl RunIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Add context (e.g. a batch id or document name)
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// A document submitted inline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    pub name: String,
    pub content_base64: String,
    /// Known page count; estimated from the content when absent
    #[serde(default)]
    pub page_count: Option<u32>,
}

/// `POST /reconcile` request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    #[serde(default)]
    pub documents: Vec<DocumentPayload>,
    #[serde(default)]
    pub existing_donations: Vec<ReconciledDonation>,
}

/// `POST /reconcile` response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileResponse {
    pub donations: Vec<ReconciledDonation>,
    pub warnings: Vec<RunIssue>,
    pub errors: Vec<RunIssue>,
}

/// Everything a run produced, plus counters for the summary
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub run_id: Uuid,
    pub donations: Vec<ReconciledDonation>,
    pub warnings: Vec<RunIssue>,
    pub errors: Vec<RunIssue>,
    pub documents: usize,
    pub batches_total: usize,
    pub batches_succeeded: usize,
    pub batches_failed: usize,
    pub batches_not_dispatched: usize,
    pub records_extracted: usize,
    pub records_merged: usize,
    pub records_dropped: usize,
    pub donations_matched: usize,
    pub cancelled: bool,
    pub duration: Duration,
}

impl ReconcileReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            donations: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            documents: 0,
            batches_total: 0,
            batches_succeeded: 0,
            batches_failed: 0,
            batches_not_dispatched: 0,
            records_extracted: 0,
            records_merged: 0,
            records_dropped: 0,
            donations_matched: 0,
            cancelled: false,
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn add_warning(&mut self, warning: RunIssue) {
        self.warnings.push(warning);
    }

    pub fn add_error(&mut self, error: RunIssue) {
        self.errors.push(error);
    }

    /// No errors and not cancelled
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            documents = self.documents,
            batches = self.batches_total,
            batches_succeeded = self.batches_succeeded,
            batches_failed = self.batches_failed,
            records_extracted = self.records_extracted,
            records_merged = self.records_merged,
            records_dropped = self.records_dropped,
            donations = self.donations.len(),
            matched = self.donations_matched,
            cancelled = self.cancelled,
            duration_secs = self.duration.as_secs(),
            "Reconciliation run completed"
        );

        for warning in &self.warnings {
            tracing::warn!(
                kind = ?warning.kind,
                message = %warning.message,
                context = warning.context.as_deref().unwrap_or(""),
                "Run warning"
            );
        }
        for error in &self.errors {
            tracing::error!(
                kind = ?error.kind,
                message = %error.message,
                context = error.context.as_deref().unwrap_or(""),
                "Run error"
            );
        }
    }

    /// The service-boundary view of the report
    pub fn into_response(self) -> ReconcileResponse {
        ReconcileResponse {
            donations: self.donations,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

impl Default for ReconcileReport {
    fn default() -> Self {
        Self::new()
    }
}
