//! Documents and the batches they are split into
//!
//! A [`Batch`] is one bounded unit of extraction work. Its status only moves
//! forward: `Pending -> Dispatched -> Succeeded | Failed`.

use super::errors::ReconError;
use super::ids::BatchId;
use super::result::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Kind of a source document, decided by file extension
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Multi-page PDF, split into page ranges
    Pdf,
    /// Single scanned image (check, deposit slip)
    Image,
    /// Tabular export, one batch per file
    Csv,
    /// Anything else; skipped by the planner
    Unsupported(String),
}

impl DocumentKind {
    /// Classify a file name by its extension (case-insensitive)
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "tif" | "tiff" | "heic" => Self::Image,
            "csv" => Self::Csv,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Wire name used in extraction requests
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Csv => "csv",
            Self::Unsupported(ext) => ext,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(ext) if ext.is_empty() => write!(f, "unsupported (no extension)"),
            Self::Unsupported(ext) => write!(f, "unsupported (.{ext})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// A document handed to the planner
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Display name, usually the file name; part of every batch id
    pub name: String,
    pub kind: DocumentKind,
    /// Page count for PDFs; ignored for other kinds
    pub page_count: u32,
    /// Raw bytes, shared with every batch cut from this document
    pub data: Arc<Vec<u8>>,
}

impl SourceDocument {
    /// Creates a document, classifying its kind from the name
    pub fn new(name: impl Into<String>, page_count: u32, data: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            kind: DocumentKind::from_path(&name),
            name,
            page_count,
            data: Arc::new(data),
        }
    }
}

/// Inclusive, 1-based page range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    /// Creates a range, rejecting `start == 0` or `end < start`
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start == 0 || end < start {
            return Err(ReconError::Planning(format!(
                "Invalid page range {start}-{end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of pages covered
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Always false for a constructed range
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if the two ranges share at least one page
    pub fn overlaps(&self, other: &PageRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Lifecycle of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Dispatched,
    Succeeded,
    Failed,
}

impl BatchStatus {
    /// Succeeded and Failed are terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One unit of extraction work
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: BatchId,
    pub document_name: String,
    pub kind: DocumentKind,
    pub page_range: Option<PageRange>,
    /// Position in the plan, used to re-order results
    pub ordinal: usize,
    status: BatchStatus,
    data: Arc<Vec<u8>>,
}

impl Batch {
    /// Creates a pending batch
    pub fn new(
        id: BatchId,
        document: &SourceDocument,
        page_range: Option<PageRange>,
        ordinal: usize,
    ) -> Self {
        Self {
            id,
            document_name: document.name.clone(),
            kind: document.kind.clone(),
            page_range,
            ordinal,
            status: BatchStatus::Pending,
            data: Arc::clone(&document.data),
        }
    }

    /// Current status
    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Pending -> Dispatched
    pub fn mark_dispatched(&mut self) -> Result<()> {
        self.transition(BatchStatus::Pending, BatchStatus::Dispatched)
    }

    /// Dispatched -> Succeeded
    pub fn mark_succeeded(&mut self) -> Result<()> {
        self.transition(BatchStatus::Dispatched, BatchStatus::Succeeded)
    }

    /// Dispatched -> Failed
    pub fn mark_failed(&mut self) -> Result<()> {
        self.transition(BatchStatus::Dispatched, BatchStatus::Failed)
    }

    fn transition(&mut self, from: BatchStatus, to: BatchStatus) -> Result<()> {
        if self.status != from {
            return Err(ReconError::Validation(format!(
                "Batch {} cannot move from {:?} to {:?}",
                self.id, self.status, to
            )));
        }
        self.status = to;
        Ok(())
    }

    /// Content sent to the extraction collaborator
    pub fn content(&self) -> BatchContent {
        BatchContent {
            batch_id: self.id.clone(),
            document_name: self.document_name.clone(),
            kind: self.kind.clone(),
            page_range: self.page_range,
            data: Arc::clone(&self.data),
        }
    }
}

/// Payload of one extraction call
///
/// Cheap to clone: the document bytes are shared.
#[derive(Debug, Clone)]
pub struct BatchContent {
    pub batch_id: BatchId,
    pub document_name: String,
    pub kind: DocumentKind,
    pub page_range: Option<PageRange>,
    pub data: Arc<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("march.pdf", DocumentKind::Pdf; "pdf")]
    #[test_case("SLIP.JPG", DocumentKind::Image; "uppercase jpg")]
    #[test_case("scan.tiff", DocumentKind::Image; "tiff")]
    #[test_case("export.csv", DocumentKind::Csv; "csv")]
    #[test_case("notes.docx", DocumentKind::Unsupported("docx".to_string()); "docx")]
    #[test_case("README", DocumentKind::Unsupported(String::new()); "no extension")]
    fn test_kind_from_path(name: &str, expected: DocumentKind) {
        assert_eq!(DocumentKind::from_path(name), expected);
    }

    #[test]
    fn test_page_range_validation() {
        assert!(PageRange::new(0, 3).is_err());
        assert!(PageRange::new(5, 4).is_err());
        let range = PageRange::new(11, 20).unwrap();
        assert_eq!(range.len(), 10);
        assert_eq!(range.to_string(), "11-20");
    }

    #[test]
    fn test_page_range_overlap() {
        let a = PageRange::new(1, 10).unwrap();
        let b = PageRange::new(10, 12).unwrap();
        let c = PageRange::new(11, 20).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_status_is_one_way() {
        let doc = SourceDocument::new("slip.png", 1, vec![1, 2, 3]);
        let mut batch = Batch::new(BatchId::for_whole("slip.png", "image"), &doc, None, 0);
        assert_eq!(batch.status(), BatchStatus::Pending);

        assert!(batch.mark_succeeded().is_err());
        batch.mark_dispatched().unwrap();
        assert!(batch.mark_dispatched().is_err());
        batch.mark_failed().unwrap();
        assert!(batch.status().is_terminal());
        assert!(batch.mark_succeeded().is_err());
    }

    #[test]
    fn test_content_shares_document_bytes() {
        let doc = SourceDocument::new("a.pdf", 3, vec![0u8; 1024]);
        let batch = Batch::new(
            BatchId::for_pages("a.pdf", 1, 3),
            &doc,
            Some(PageRange::new(1, 3).unwrap()),
            0,
        );
        let content = batch.content();
        assert!(Arc::ptr_eq(&content.data, &doc.data));
        assert_eq!(content.kind, DocumentKind::Pdf);
    }
}
