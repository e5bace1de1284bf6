//! Extraction collaborator
//!
//! The extraction service turns a batch of document content into zero or
//! more raw donation records. Errors carry the classification the retry layer
//! needs (see [`ExtractionError::is_retryable`]).

pub mod http;

use crate::domain::{BatchContent, ExtractionError, RawExtractedRecord};
use async_trait::async_trait;

pub use http::HttpExtractionClient;

/// Extraction client trait
///
/// Implementations must be cheap to share across workers; the orchestrator
/// calls `extract` concurrently from up to `max_concurrency` tasks.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    /// Extract every donation record found in `content`
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] classified as retryable or fatal.
    async fn extract(
        &self,
        content: &BatchContent,
    ) -> Result<Vec<RawExtractedRecord>, ExtractionError>;
}
