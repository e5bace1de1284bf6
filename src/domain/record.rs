//! Raw records returned by the extraction collaborator

use super::ids::BatchId;
use serde::{Deserialize, Serialize};

/// One donation as extracted from a document, before any normalization
///
/// Every field is optional text because extraction output is untrusted.
/// `source_batch_id`, `source_page` and `record_index` are back-references
/// used to re-order results that arrive out of order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawExtractedRecord {
    pub donor_name: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    /// Check or other payment reference number
    pub check_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub memo: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_batch_id: Option<BatchId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_page: Option<u32>,
    pub record_index: usize,
}

impl RawExtractedRecord {
    /// Creates a new builder
    pub fn builder() -> RawExtractedRecordBuilder {
        RawExtractedRecordBuilder::default()
    }

    /// Stamps the record with the batch it came from and its position in it
    pub fn attach_source(&mut self, batch_id: &BatchId, record_index: usize) {
        self.source_batch_id = Some(batch_id.clone());
        self.record_index = record_index;
    }
}

/// Builder for [`RawExtractedRecord`]
#[derive(Debug, Default)]
pub struct RawExtractedRecordBuilder {
    record: RawExtractedRecord,
}

impl RawExtractedRecordBuilder {
    pub fn donor_name(mut self, value: impl Into<String>) -> Self {
        self.record.donor_name = Some(value.into());
        self
    }

    pub fn amount(mut self, value: impl Into<String>) -> Self {
        self.record.amount = Some(value.into());
        self
    }

    pub fn date(mut self, value: impl Into<String>) -> Self {
        self.record.date = Some(value.into());
        self
    }

    pub fn check_number(mut self, value: impl Into<String>) -> Self {
        self.record.check_number = Some(value.into());
        self
    }

    pub fn address_line1(mut self, value: impl Into<String>) -> Self {
        self.record.address_line1 = Some(value.into());
        self
    }

    pub fn city(mut self, value: impl Into<String>) -> Self {
        self.record.city = Some(value.into());
        self
    }

    pub fn state(mut self, value: impl Into<String>) -> Self {
        self.record.state = Some(value.into());
        self
    }

    pub fn postal_code(mut self, value: impl Into<String>) -> Self {
        self.record.postal_code = Some(value.into());
        self
    }

    pub fn memo(mut self, value: impl Into<String>) -> Self {
        self.record.memo = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.record.email = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.record.phone = Some(value.into());
        self
    }

    pub fn source(mut self, batch_id: BatchId, page: Option<u32>) -> Self {
        self.record.source_batch_id = Some(batch_id);
        self.record.source_page = page;
        self
    }

    pub fn build(self) -> RawExtractedRecord {
        self.record
    }
}
