// Almoner - Donation Reconciliation Pipeline
// Copyright (c) 2025 Almoner Contributors
// Licensed under the MIT License

//! # Almoner - Donation Reconciliation Pipeline
//!
//! Almoner turns scanned deposit slips, check images and spreadsheet exports
//! into a deduplicated list of donations, each linked to a customer in the
//! organisation's accounting directory.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Batching** source documents into page ranges and whole files
//! - **Extracting** records through a rate-limited, retried worker pool
//! - **Matching** donors against a cached customer directory
//! - **Reconciling** records into one donation per identity key, with an
//!   audit trail of every merge
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (throttling, batching, matching, reconciliation)
//! - [`adapters`] - External integrations (extraction service, directory, files)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use almoner::adapters::directory::HttpDirectorySource;
//! use almoner::adapters::documents::load_documents;
//! use almoner::adapters::extraction::HttpExtractionClient;
//! use almoner::adapters::progress::LoggingProgressSink;
//! use almoner::config::load_config;
//! use almoner::core::pipeline::ReconcileCoordinator;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("almoner.toml")?;
//!     let coordinator = ReconcileCoordinator::from_config(
//!         &config,
//!         Arc::new(HttpExtractionClient::new(&config.extraction)?),
//!         Arc::new(HttpDirectorySource::new(&config.directory)?),
//!         Arc::new(LoggingProgressSink),
//!     )?;
//!
//!     let (documents, _failures) = load_documents(&[PathBuf::from("deposits.pdf")]).await;
//!     let (_tx, shutdown) = tokio::sync::watch::channel(false);
//!     let report = coordinator.run(documents, Vec::new(), shutdown).await?;
//!
//!     println!("Reconciled {} donations", report.donations.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Matching
//!
//! Donors are resolved by a cascade of strategies (exact name, containment,
//! swapped "Last, First" order, significant token, email domain, phone
//! suffix) followed by a direct directory lookup, or by fuzzy similarity
//! with a 0.75 acceptance threshold:
//!
//! ```rust,no_run
//! use almoner::core::matching::{CustomerMatcher, SearchTerms};
//!
//! # async fn example(matcher: &CustomerMatcher) -> Result<(), Box<dyn std::error::Error>> {
//! let result = matcher.find_customer(&SearchTerms::new("Smith, John")).await?;
//! if let Some(entry) = &result.matched_entry {
//!     println!("{} via {:?} ({:.2})", entry.display_name, result.method, result.confidence);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`domain::Result`], an alias over
//! [`domain::ReconError`]. Per-batch and per-record failures do not abort a
//! run; they are collected as warnings and errors on the report.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
