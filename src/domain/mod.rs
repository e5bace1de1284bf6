//! Domain models and types for Almoner.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`BatchId`], [`IdentityKey`], [`DonationId`], [`CustomerId`])
//! - **Work units** ([`SourceDocument`], [`Batch`], [`BatchContent`])
//! - **Records** ([`RawExtractedRecord`], [`DirectoryEntry`], [`MatchResult`], [`ReconciledDonation`])
//! - **Error types** ([`ReconError`], [`ExtractionError`], [`MatchError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers are newtypes so a batch id can never be passed where an
//! identity key is expected:
//!
//! ```rust
//! use almoner::domain::{BatchId, IdentityKey};
//!
//! let batch = BatchId::for_pages("deposits.pdf", 1, 10);
//! let key = IdentityKey::check("1234", "100.00");
//!
//! // let wrong: IdentityKey = batch;  // Compile error!
//! assert_eq!(key.as_str(), "CHECK:1234:100.00");
//! # let _ = batch;
//! ```

pub mod batch;
pub mod directory;
pub mod donation;
pub mod errors;
pub mod ids;
pub mod matching;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use batch::{Batch, BatchContent, BatchStatus, DocumentKind, PageRange, SourceDocument};
pub use directory::DirectoryEntry;
pub use donation::{
    DonationFields, IncomingIdentity, MatchInfo, MergeEntry, ReconciledDonation, SyncStatus,
};
pub use errors::{ExtractionError, MatchError, ReconError, Retryable};
pub use ids::{BatchId, CustomerId, DonationId, IdentityKey};
pub use matching::{MatchCandidate, MatchMethod, MatchResult, MATCH_THRESHOLD};
pub use record::RawExtractedRecord;
pub use result::Result;
