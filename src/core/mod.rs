//! Core business logic for Almoner.
//!
//! # Modules
//!
//! - [`throttle`] - Sliding-window rate limiting and retry with backoff
//! - [`batch`] - Batch planning and bounded-concurrency orchestration
//! - [`directory`] - TTL snapshot cache of the customer directory
//! - [`matching`] - Cascading and similarity-based customer matching
//! - [`reconcile`] - Identity-key deduplication and field merging
//! - [`pipeline`] - End-to-end runs and their reports
//!
//! # Reconciliation Workflow
//!
//! 1. **Plan**: split documents into page-range and whole-file batches
//! 2. **Extract**: dispatch batches to the extraction service, rate limited
//!    and retried, collecting per-batch errors
//! 3. **Match**: resolve each extracted donor against the customer directory
//! 4. **Reconcile**: fold records into one donation per identity key
//! 5. **Report**: donations plus warnings and errors
//!
//! # Example
//!
//! ```rust,no_run
//! use almoner::adapters::directory::HttpDirectorySource;
//! use almoner::adapters::extraction::HttpExtractionClient;
//! use almoner::adapters::progress::LoggingProgressSink;
//! use almoner::config::load_config;
//! use almoner::core::pipeline::ReconcileCoordinator;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("almoner.toml")?;
//! let coordinator = ReconcileCoordinator::from_config(
//!     &config,
//!     Arc::new(HttpExtractionClient::new(&config.extraction)?),
//!     Arc::new(HttpDirectorySource::new(&config.directory)?),
//!     Arc::new(LoggingProgressSink),
//! )?;
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let report = coordinator.run(Vec::new(), Vec::new(), shutdown_rx).await?;
//!
//! println!("Donations: {}", report.donations.len());
//! println!("Errors: {}", report.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod directory;
pub mod matching;
pub mod pipeline;
pub mod reconcile;
pub mod throttle;
