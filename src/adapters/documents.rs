//! Filesystem and inline document loading

use crate::domain::{DocumentKind, ReconError, Result, SourceDocument};
use base64::Engine as _;
use regex::bytes::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A path that could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLoadFailure {
    pub path: PathBuf,
    pub message: String,
}

fn page_object_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"/Type\s*/Page[^s]").ok())
        .as_ref()
}

/// Counts `/Type /Page` objects; at least 1
pub fn estimate_pdf_pages(data: &[u8]) -> u32 {
    let count = page_object_pattern()
        .map(|re| re.find_iter(data).count())
        .unwrap_or(0);
    u32::try_from(count).unwrap_or(u32::MAX).max(1)
}

/// Builds a document from bytes, estimating the page count for PDFs when
/// none is given
pub fn document_from_bytes(name: &str, data: Vec<u8>, page_count: Option<u32>) -> SourceDocument {
    let pages = match (page_count, DocumentKind::from_path(name)) {
        (Some(pages), _) => pages.max(1),
        (None, DocumentKind::Pdf) => estimate_pdf_pages(&data),
        (None, _) => 1,
    };
    SourceDocument::new(name, pages, data)
}

/// Decodes an inline base64 document
///
/// # Errors
///
/// `ReconError::Validation` when the content is not valid base64.
pub fn decode_document(name: &str, content_base64: &str, page_count: Option<u32>) -> Result<SourceDocument> {
    let data = base64::engine::general_purpose::STANDARD
        .decode(content_base64.trim())
        .map_err(|e| ReconError::Validation(format!("Document '{name}' is not valid base64: {e}")))?;
    Ok(document_from_bytes(name, data, page_count))
}

/// Reads one document from disk
///
/// # Errors
///
/// `ReconError::Io` when the file cannot be read.
pub async fn load_document(path: &Path) -> Result<SourceDocument> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| ReconError::Io(format!("Failed to read {}: {e}", path.display())))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let document = document_from_bytes(&name, data, None);
    tracing::debug!(
        document = %document.name,
        kind = %document.kind,
        pages = document.page_count,
        bytes = document.data.len(),
        "Document loaded"
    );
    Ok(document)
}

/// Reads every path in order; unreadable files are reported, not fatal
pub async fn load_documents(paths: &[PathBuf]) -> (Vec<SourceDocument>, Vec<DocumentLoadFailure>) {
    let mut documents = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in paths {
        match load_document(path).await {
            Ok(document) => documents.push(document),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable document");
                failures.push(DocumentLoadFailure {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    (documents, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_PAGE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj << /Type /Pages /Kids [2 0 R 3 0 R] >>\n\
        2 0 obj << /Type /Page /Parent 1 0 R >>\n3 0 obj << /Type/Page /Parent 1 0 R >>\n%%EOF";

    #[test]
    fn test_estimate_pdf_pages() {
        assert_eq!(estimate_pdf_pages(TWO_PAGE_PDF), 2);
        assert_eq!(estimate_pdf_pages(b"not a pdf"), 1);
    }

    #[test]
    fn test_document_from_bytes_kinds() {
        let pdf = document_from_bytes("march.pdf", TWO_PAGE_PDF.to_vec(), None);
        assert_eq!(pdf.kind, DocumentKind::Pdf);
        assert_eq!(pdf.page_count, 2);

        let given = document_from_bytes("march.pdf", TWO_PAGE_PDF.to_vec(), Some(40));
        assert_eq!(given.page_count, 40);

        let image = document_from_bytes("slip.JPG", vec![1, 2, 3], None);
        assert_eq!(image.kind, DocumentKind::Image);
        assert_eq!(image.page_count, 1);
    }

    #[test]
    fn test_decode_document_rejects_bad_base64() {
        assert!(decode_document("a.png", "!!!", None).is_err());
        let doc = decode_document("a.csv", "bmFtZSxhbW91bnQK", None).unwrap();
        assert_eq!(doc.data.as_slice(), b"name,amount\n");
    }

    #[tokio::test]
    async fn test_load_documents_reports_missing_files() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(TWO_PAGE_PDF).unwrap();

        let paths = vec![file.path().to_path_buf(), PathBuf::from("/nonexistent/slip.png")];
        let (documents, failures) = load_documents(&paths).await;

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].page_count, 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, PathBuf::from("/nonexistent/slip.png"));
    }
}
