//! Batch planning
//!
//! PDFs become fixed-size, order-preserving page ranges; every image and every
//! CSV file becomes a single batch. Unsupported kinds are skipped with a
//! warning.

use crate::domain::{
    Batch, BatchId, DocumentKind, PageRange, ReconError, Result, SourceDocument,
};

/// Default number of pages per PDF batch
pub const DEFAULT_PAGES_PER_BATCH: u32 = 10;

/// A document that produced no batches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanWarning {
    pub document_name: String,
    pub reason: String,
}

/// Result of one planning run
#[derive(Debug, Default)]
pub struct PlanOutcome {
    pub batches: Vec<Batch>,
    pub warnings: Vec<PlanWarning>,
}

/// Splits documents into bounded work units
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    pages_per_batch: u32,
}

impl BatchPlanner {
    /// Creates a planner
    ///
    /// # Errors
    ///
    /// `ReconError::Configuration` when `pages_per_batch` is 0.
    pub fn new(pages_per_batch: u32) -> Result<Self> {
        if pages_per_batch == 0 {
            return Err(ReconError::Configuration(
                "pages_per_batch must be greater than 0".to_string(),
            ));
        }
        Ok(Self { pages_per_batch })
    }

    pub fn pages_per_batch(&self) -> u32 {
        self.pages_per_batch
    }

    /// Plans batches for every document, in document order
    ///
    /// Ordinals are assigned across the whole plan so results can be sorted
    /// back into submission order.
    pub fn plan(&self, documents: &[SourceDocument]) -> PlanOutcome {
        let mut outcome = PlanOutcome::default();

        for document in documents {
            match &document.kind {
                DocumentKind::Pdf => self.plan_pdf(document, &mut outcome.batches),
                DocumentKind::Image => {
                    let id = BatchId::for_whole(&document.name, "image");
                    let ordinal = outcome.batches.len();
                    outcome.batches.push(Batch::new(id, document, None, ordinal));
                }
                DocumentKind::Csv => {
                    let id = BatchId::for_whole(&document.name, "csv");
                    let ordinal = outcome.batches.len();
                    outcome.batches.push(Batch::new(id, document, None, ordinal));
                }
                DocumentKind::Unsupported(_) => {
                    tracing::warn!(
                        document = %document.name,
                        kind = %document.kind,
                        "Skipping unsupported document"
                    );
                    outcome.warnings.push(PlanWarning {
                        document_name: document.name.clone(),
                        reason: format!("Unsupported document kind: {}", document.kind),
                    });
                }
            }
        }

        tracing::debug!(
            documents = documents.len(),
            batches = outcome.batches.len(),
            skipped = outcome.warnings.len(),
            "Planned batches"
        );

        outcome
    }

    fn plan_pdf(&self, document: &SourceDocument, batches: &mut Vec<Batch>) {
        let pages = document.page_count.max(1);
        let mut start = 1u32;

        while start <= pages {
            let end = start.saturating_add(self.pages_per_batch - 1).min(pages);
            let range = PageRange { start, end };
            let id = BatchId::for_pages(&document.name, start, end);
            let ordinal = batches.len();
            batches.push(Batch::new(id, document, Some(range), ordinal));
            start = end + 1;
        }
    }
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            pages_per_batch: DEFAULT_PAGES_PER_BATCH,
        }
    }
}
