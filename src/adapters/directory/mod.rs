//! Customer directory collaborator

pub mod http;

use crate::domain::{DirectoryEntry, MatchError};
use async_trait::async_trait;

pub use http::HttpDirectorySource;

/// Source of customer directory entries
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch the complete directory; paging is the implementation's concern
    async fn fetch_all(&self) -> Result<Vec<DirectoryEntry>, MatchError>;

    /// Point lookup by name
    ///
    /// The default reports "not found", for sources that cannot search.
    async fn lookup(&self, _name: &str) -> Result<Option<DirectoryEntry>, MatchError> {
        Ok(None)
    }
}
