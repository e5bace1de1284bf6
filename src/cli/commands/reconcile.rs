//! Reconcile command implementation
//!
//! Loads source documents from disk, runs them through extraction, matching
//! and reconciliation, then writes the resulting donations as JSON.

use crate::adapters::directory::HttpDirectorySource;
use crate::adapters::documents::load_documents;
use crate::adapters::extraction::HttpExtractionClient;
use crate::adapters::progress::LoggingProgressSink;
use crate::config::{load_config, MatchMode};
use crate::core::pipeline::{IssueKind, ReconcileCoordinator, ReconcileReport, RunIssue};
use crate::domain::ReconciledDonation;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the reconcile command
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Source documents (PDF scans, CSV or spreadsheet exports)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// JSON file with donations from a previous run to merge into
    #[arg(long)]
    pub existing: Option<PathBuf>,

    /// Where to write the reconciled donations
    #[arg(short, long, default_value = "reconciled.json")]
    pub output: PathBuf,

    /// Override pages per PDF batch
    #[arg(long)]
    pub pages_per_batch: Option<u32>,

    /// Override the extraction worker pool size
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override the matching mode
    #[arg(long, value_enum)]
    pub mode: Option<MatchMode>,
}

impl ReconcileArgs {
    /// Execute the reconcile command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(files = self.files.len(), "Starting reconcile command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        // Apply CLI overrides
        if let Some(pages) = self.pages_per_batch {
            tracing::info!(pages_per_batch = pages, "Overriding pages per batch from CLI");
            config.extraction.pages_per_batch = pages;
        }

        if let Some(concurrency) = self.concurrency {
            tracing::info!(concurrency, "Overriding worker pool size from CLI");
            config.extraction.max_concurrency = concurrency;
        }

        if let Some(mode) = self.mode {
            tracing::info!(mode = %mode, "Overriding match mode from CLI");
            config.matching.mode = mode;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        let existing = match &self.existing {
            Some(path) => match read_existing(path).await {
                Ok(donations) => donations,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read existing donations");
                    eprintln!("Failed to read existing donations: {e:#}");
                    return Ok(5);
                }
            },
            None => Vec::new(),
        };

        tracing::info!("Creating reconcile coordinator");
        let coordinator = match build_coordinator(&config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create reconcile coordinator");
                eprintln!("Failed to initialize collaborators: {e}");
                return Ok(4);
            }
        };

        let (documents, failures) = load_documents(&self.files).await;

        println!("🚀 Reconciling {} document(s)...", documents.len());
        println!();

        let mut report = match coordinator.run(documents, existing, shutdown_signal).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Reconciliation failed");
                eprintln!("Reconciliation failed: {e}");
                return Ok(5);
            }
        };

        for failure in failures {
            report.add_warning(
                RunIssue::new(IssueKind::Planning, failure.message)
                    .with_context(failure.path.display().to_string()),
            );
        }

        print_summary(&report);

        let cancelled = report.cancelled;
        let has_errors = !report.errors.is_empty();

        let json = serde_json::to_string_pretty(&report.into_response())?;
        if let Err(e) = tokio::fs::write(&self.output, json).await {
            tracing::error!(error = %e, output = %self.output.display(), "Failed to write output");
            eprintln!("Failed to write {}: {e}", self.output.display());
            return Ok(5);
        }
        println!("💾 Donations written to {}", self.output.display());

        if cancelled {
            println!("⚠️  Run was interrupted before all batches were dispatched");
            return Ok(130);
        }

        if has_errors {
            println!("⚠️  Reconciliation completed with errors");
            Ok(1)
        } else {
            println!("✅ Reconciliation completed successfully");
            Ok(0)
        }
    }
}

fn build_coordinator(config: &crate::config::AlmonerConfig) -> crate::domain::Result<ReconcileCoordinator> {
    let extraction = HttpExtractionClient::new(&config.extraction)?;
    let directory = HttpDirectorySource::new(&config.directory)?;
    ReconcileCoordinator::from_config(
        config,
        Arc::new(extraction),
        Arc::new(directory),
        Arc::new(LoggingProgressSink),
    )
}

async fn read_existing(path: &Path) -> anyhow::Result<Vec<ReconciledDonation>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let donations = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {} as a donation list", path.display()))?;
    Ok(donations)
}

fn print_summary(report: &ReconcileReport) {
    println!();
    println!("📊 Reconciliation Summary:");
    println!("  Run ID: {}", report.run_id);
    println!("  Documents: {}", report.documents);
    println!(
        "  Batches: {} total, {} succeeded, {} failed, {} not dispatched",
        report.batches_total,
        report.batches_succeeded,
        report.batches_failed,
        report.batches_not_dispatched
    );
    println!("  Records Extracted: {}", report.records_extracted);
    println!("  Records Merged: {}", report.records_merged);
    println!("  Records Dropped: {}", report.records_dropped);
    println!("  Donations: {}", report.donations.len());
    println!("  Matched: {}", report.donations_matched);
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    println!();

    if !report.warnings.is_empty() {
        println!("⚠️  Warnings:");
        for warning in report.warnings.iter().take(10) {
            print_issue(warning);
        }
        if report.warnings.len() > 10 {
            println!("    ... and {} more warnings", report.warnings.len() - 10);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("❌ Errors:");
        for error in report.errors.iter().take(10) {
            print_issue(error);
        }
        if report.errors.len() > 10 {
            println!("    ... and {} more errors", report.errors.len() - 10);
        }
        println!();
    }
}

fn print_issue(issue: &RunIssue) {
    match &issue.context {
        Some(context) => println!("    - [{context}] {}", issue.message),
        None => println!("    - {}", issue.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_existing_parses_empty_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let donations = read_existing(file.path()).await.unwrap();
        assert!(donations.is_empty());
    }

    #[tokio::test]
    async fn test_read_existing_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not a list").unwrap();

        let err = read_existing(file.path()).await.unwrap_err();
        assert!(format!("{err:#}").contains("donation list"));
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = ReconcileArgs {
            files: vec![PathBuf::from("slips.pdf")],
            existing: None,
            output: PathBuf::from("unused.json"),
            pages_per_batch: None,
            concurrency: None,
            mode: None,
        };
        let (_tx, rx) = watch::channel(false);

        let code = args.execute("/nonexistent/almoner.toml", rx).await.unwrap();
        assert_eq!(code, 2);
    }
}
