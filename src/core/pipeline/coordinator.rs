//! Reconcile coordinator - end-to-end run
//!
//! Plans batches, dispatches them for extraction, matches every extracted
//! donor against the customer directory and reconciles the result against
//! the caller's existing donations.

use super::summary::{IssueKind, ReconcileReport, ReconcileRequest, ReconcileResponse, RunIssue};
use crate::adapters::directory::DirectorySource;
use crate::adapters::documents::decode_document;
use crate::adapters::extraction::ExtractionClient;
use crate::adapters::progress::ProgressSink;
use crate::config::{AlmonerConfig, MatchMode};
use crate::core::batch::{BatchErrorKind, BatchOrchestrator, BatchPlanner, OrchestratorSettings};
use crate::core::directory::DirectoryCache;
use crate::core::matching::{CustomerMatcher, SearchTerms};
use crate::core::reconcile::ReconciliationEngine;
use crate::core::throttle::{RateLimiter, RetryExecutor, RetryPolicy};
use crate::domain::{MatchError, MatchResult, RawExtractedRecord, ReconError, ReconciledDonation, Result, SourceDocument};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Matching behaviour of a run
#[derive(Debug, Clone)]
pub struct MatchSettings {
    pub mode: MatchMode,
    /// Propagate a directory failure instead of continuing unmatched
    pub fail_on_directory_error: bool,
    /// Cascade lookups in flight at once
    pub concurrency: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            mode: MatchMode::Cascade,
            fail_on_directory_error: false,
            concurrency: 8,
        }
    }
}

/// Runs the whole pipeline
pub struct ReconcileCoordinator {
    planner: BatchPlanner,
    orchestrator: BatchOrchestrator,
    matcher: Arc<CustomerMatcher>,
    settings: MatchSettings,
}

impl ReconcileCoordinator {
    pub fn new(
        planner: BatchPlanner,
        orchestrator: BatchOrchestrator,
        matcher: Arc<CustomerMatcher>,
        settings: MatchSettings,
    ) -> Self {
        Self {
            planner,
            orchestrator,
            matcher,
            settings,
        }
    }

    /// Wires every component from configuration
    ///
    /// # Errors
    ///
    /// `ReconError::Configuration` for an invalid batch size.
    pub fn from_config(
        config: &AlmonerConfig,
        extraction: Arc<dyn ExtractionClient>,
        directory: Arc<dyn DirectorySource>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Self> {
        let planner = BatchPlanner::new(config.extraction.pages_per_batch)?;

        let orchestrator = BatchOrchestrator::new(extraction, OrchestratorSettings::from(config))
            .with_rate_limiter(Arc::new(RateLimiter::from_config(&config.rate_limit)))
            .with_retry(RetryExecutor::new(RetryPolicy::from(&config.retry)))
            .with_progress(progress);

        let cache = Arc::new(DirectoryCache::new(directory, config.directory.cache_ttl()));
        let matcher = Arc::new(CustomerMatcher::new(cache));

        let settings = MatchSettings {
            mode: config.matching.mode,
            fail_on_directory_error: config.matching.fail_on_directory_error,
            ..MatchSettings::default()
        };

        Ok(Self::new(planner, orchestrator, matcher, settings))
    }

    pub fn matcher(&self) -> &Arc<CustomerMatcher> {
        &self.matcher
    }

    /// Runs the pipeline over `documents`
    ///
    /// Batch failures, unsupported documents and unkeyable records end up in
    /// the report. Raising `shutdown` stops dispatching; whatever was
    /// extracted is still matched and reconciled.
    ///
    /// # Errors
    ///
    /// `ReconError::Match` when the directory is unavailable and
    /// `fail_on_directory_error` is set.
    pub async fn run(
        &self,
        documents: Vec<SourceDocument>,
        existing: Vec<ReconciledDonation>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ReconcileReport> {
        let started = Instant::now();
        let mut report = ReconcileReport::new();
        report.documents = documents.len();

        tracing::info!(
            run_id = %report.run_id,
            documents = documents.len(),
            existing = existing.len(),
            mode = %self.settings.mode,
            "Starting reconciliation run"
        );

        // Plan
        let plan = self.planner.plan(&documents);
        for warning in plan.warnings {
            report.add_warning(
                RunIssue::new(IssueKind::Planning, warning.reason).with_context(warning.document_name),
            );
        }
        report.batches_total = plan.batches.len();

        // Extract
        let extraction = self.orchestrator.submit_until(plan.batches, shutdown).await;
        report.batches_succeeded = extraction.succeeded();
        report.batches_failed = extraction.failed();
        report.batches_not_dispatched = extraction.not_dispatched;
        report.cancelled = extraction.cancelled;
        for error in &extraction.errors {
            let label = match error.kind {
                BatchErrorKind::RetriesExhausted => "retries exhausted",
                BatchErrorKind::Fatal => "fatal",
                BatchErrorKind::Aborted => "aborted",
            };
            report.add_error(
                RunIssue::new(
                    IssueKind::Extraction,
                    format!("{} after {} attempt(s), {label}", error.message, error.attempts),
                )
                .with_context(error.batch_id.to_string()),
            );
        }
        if extraction.not_dispatched > 0 {
            report.add_warning(RunIssue::new(
                IssueKind::Extraction,
                format!("{} batch(es) not dispatched after shutdown", extraction.not_dispatched),
            ));
        }

        let records = extraction.records;
        report.records_extracted = records.len();

        // Match
        let matches = match self.match_records(&records).await {
            Ok(matches) => matches,
            Err(e) if self.settings.fail_on_directory_error => {
                tracing::error!(error = %e, "Customer directory unavailable, aborting run");
                return Err(ReconError::Match(e));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Customer directory unavailable, continuing unmatched");
                report.add_error(
                    RunIssue::new(IssueKind::Match, e.to_string())
                        .with_context("all records left unmatched"),
                );
                vec![None; records.len()]
            }
        };

        // Reconcile
        let outcome = ReconciliationEngine::reconcile(existing, records.into_iter().zip(matches).collect());
        for dropped in &outcome.dropped {
            let context = match &dropped.source_batch_id {
                Some(batch_id) => format!("{batch_id} record {}", dropped.record_index),
                None => format!("record {}", dropped.record_index),
            };
            report.add_warning(
                RunIssue::new(IssueKind::Identity, dropped.reason.clone()).with_context(context),
            );
        }
        report.records_merged = outcome.merged_records;
        report.records_dropped = outcome.dropped.len();
        report.donations_matched = outcome.matched();
        report.donations = outcome.donations;

        let report = report.with_duration(started.elapsed());
        report.log_summary();
        Ok(report)
    }

    /// Service-boundary entry point: inline documents in, response out
    ///
    /// Undecodable documents become planning warnings.
    ///
    /// # Errors
    ///
    /// As [`Self::run`].
    pub async fn handle(
        &self,
        request: ReconcileRequest,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ReconcileResponse> {
        let mut documents = Vec::with_capacity(request.documents.len());
        let mut rejected = Vec::new();
        for payload in &request.documents {
            match decode_document(&payload.name, &payload.content_base64, payload.page_count) {
                Ok(document) => documents.push(document),
                Err(e) => rejected.push(
                    RunIssue::new(IssueKind::Planning, e.to_string()).with_context(payload.name.clone()),
                ),
            }
        }

        let mut report = self.run(documents, request.existing_donations, shutdown).await?;
        rejected.append(&mut report.warnings);
        report.warnings = rejected;
        Ok(report.into_response())
    }

    /// One match per record, same order
    async fn match_records(
        &self,
        records: &[RawExtractedRecord],
    ) -> std::result::Result<Vec<Option<MatchResult>>, MatchError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let terms: Vec<SearchTerms> = records.iter().map(SearchTerms::from_record).collect();

        match self.settings.mode {
            MatchMode::Similarity => {
                let results = self.matcher.match_batch(&terms).await?;
                Ok(results.into_iter().map(Some).collect())
            }
            MatchMode::Cascade => {
                // One fetch up front; lookups then share the snapshot
                self.matcher.cache().get_all(true).await?;

                let matcher = &self.matcher;
                let results: Vec<std::result::Result<MatchResult, MatchError>> = stream::iter(terms.iter())
                    .map(|t| matcher.find_customer(t))
                    .buffered(self.settings.concurrency.max(1))
                    .collect()
                    .await;

                results
                    .into_iter()
                    .map(|r| r.map(Some))
                    .collect()
            }
        }
    }
}
