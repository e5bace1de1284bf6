//! Identity-key deduplication over a complete result set
//!
//! The engine is a serial reduction: existing donations are absorbed first,
//! then incoming records in order. Each identity key owns exactly one output
//! donation. Output order is first-seen order.

use super::identity::{derive_identity_key, IdentityError};
use super::merge::synthesize;
use super::normalize::{normalize_amount, normalize_check_number, normalize_date};
use crate::domain::{
    BatchId, DonationFields, IdentityKey, MatchInfo, MatchMethod, MatchResult, RawExtractedRecord,
    ReconciledDonation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A record left out of the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_batch_id: Option<BatchId>,
    pub record_index: usize,
    pub reason: String,
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// One donation per identity key, first-seen order
    pub donations: Vec<ReconciledDonation>,
    pub dropped: Vec<DroppedRecord>,
    /// Incoming records folded into an already-present key
    pub merged_records: usize,
}

/// Deduplicating reducer
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    donations: Vec<ReconciledDonation>,
    index: HashMap<IdentityKey, usize>,
    dropped: Vec<DroppedRecord>,
    merged_records: usize,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles `incoming` against `existing` in one pass
    pub fn reconcile(
        existing: Vec<ReconciledDonation>,
        incoming: Vec<(RawExtractedRecord, Option<MatchResult>)>,
    ) -> ReconcileOutcome {
        let mut engine = Self::new();
        for donation in existing {
            engine.absorb_existing(donation);
        }
        for (record, match_result) in incoming {
            engine.absorb(&record, match_result.as_ref());
        }
        engine.finish()
    }

    /// Takes in an already-reconciled donation
    ///
    /// A second donation with the same key collapses into the first: its
    /// fields are merged and its history is appended, skipping identical
    /// events.
    pub fn absorb_existing(&mut self, donation: ReconciledDonation) {
        match self.index.get(&donation.identity_key) {
            Some(&position) => {
                let target = &mut self.donations[position];
                synthesize(target, &donation.fields);
                for entry in donation.merge_history {
                    target.record_merge(entry);
                }
                if target.match_info.customer_id.is_none() && donation.match_info.customer_id.is_some() {
                    target.match_info = donation.match_info;
                }
                tracing::debug!(identity_key = %target.identity_key, "Collapsed duplicate existing donation");
            }
            None => self.push(donation),
        }
    }

    /// Takes in one extracted record and its match, if any
    ///
    /// Returns the key the record was filed under, or `None` when it lacks
    /// identifying fields (the record is then reported as dropped).
    pub fn absorb(
        &mut self,
        record: &RawExtractedRecord,
        match_result: Option<&MatchResult>,
    ) -> Option<IdentityKey> {
        let fields = normalized_fields(record);
        let key = match derive_identity_key(&fields) {
            Ok(key) => key,
            Err(e) => {
                self.drop_record(record, &e);
                return None;
            }
        };

        match self.index.get(&key) {
            Some(&position) => {
                let target = &mut self.donations[position];
                synthesize(target, &fields);
                if target.match_info.customer_id.is_none() {
                    if let Some(info) = match_result.and_then(match_info) {
                        target.match_info = info;
                    }
                }
                self.merged_records += 1;
            }
            None => {
                let mut donation =
                    ReconciledDonation::new(key.clone(), fields, self.donations.len() as u64);
                if let Some(info) = match_result.and_then(match_info) {
                    donation.match_info = info;
                }
                self.push(donation);
            }
        }
        Some(key)
    }

    /// Donations so far, first-seen order
    pub fn donations(&self) -> &[ReconciledDonation] {
        &self.donations
    }

    pub fn finish(self) -> ReconcileOutcome {
        tracing::info!(
            donations = self.donations.len(),
            merged_records = self.merged_records,
            dropped = self.dropped.len(),
            "Reconciliation finished"
        );
        ReconcileOutcome {
            donations: self.donations,
            dropped: self.dropped,
            merged_records: self.merged_records,
        }
    }

    fn push(&mut self, mut donation: ReconciledDonation) {
        donation.sequence = self.donations.len() as u64;
        self.index
            .insert(donation.identity_key.clone(), self.donations.len());
        self.donations.push(donation);
    }

    fn drop_record(&mut self, record: &RawExtractedRecord, error: &IdentityError) {
        tracing::warn!(
            batch_id = record.source_batch_id.as_ref().map(BatchId::as_str).unwrap_or(""),
            record_index = record.record_index,
            reason = %error,
            "Record dropped"
        );
        self.dropped.push(DroppedRecord {
            source_batch_id: record.source_batch_id.clone(),
            record_index: record.record_index,
            reason: error.to_string(),
        });
    }
}

/// Record fields with amount, check number and date in canonical form
fn normalized_fields(record: &RawExtractedRecord) -> DonationFields {
    let mut fields = DonationFields::from(record);
    if let Some(amount) = normalize_amount(fields.amount.as_deref()) {
        fields.amount = Some(amount);
    }
    if let Some(check) = normalize_check_number(fields.check_number.as_deref()) {
        fields.check_number = Some(check);
    }
    if let Some(date) = normalize_date(fields.date.as_deref()) {
        fields.date = Some(date);
    }
    fields
}

fn match_info(result: &MatchResult) -> Option<MatchInfo> {
    let entry = result.entry()?;
    Some(MatchInfo {
        customer_id: Some(entry.id.clone()),
        customer_name: Some(entry.display_name.clone()),
        method: result.method,
        confidence: result.confidence,
    })
}

impl ReconcileOutcome {
    /// Donations that received a directory match
    pub fn matched(&self) -> usize {
        self.donations
            .iter()
            .filter(|d| d.match_info.method != MatchMethod::None)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerId, DirectoryEntry};

    fn check(check: &str, amount: &str, donor: &str) -> RawExtractedRecord {
        RawExtractedRecord::builder()
            .check_number(check)
            .amount(amount)
            .donor_name(donor)
            .build()
    }

    #[test]
    fn test_same_check_collapses() {
        let outcome = ReconciliationEngine::reconcile(
            vec![],
            vec![
                (check("1234", "100.00", "Jane"), None),
                (check("01234", "$100", "Jane Doe"), None),
            ],
        );
        assert_eq!(outcome.donations.len(), 1);
        assert_eq!(outcome.merged_records, 1);
        assert_eq!(outcome.donations[0].fields.donor_name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_insufficient_record_dropped_with_signal() {
        let record = RawExtractedRecord::builder().donor_name("Jane").build();
        let outcome = ReconciliationEngine::reconcile(vec![], vec![(record, None)]);
        assert!(outcome.donations.is_empty());
        assert_eq!(outcome.dropped.len(), 1);
    }

    #[test]
    fn test_match_info_only_on_first_sight_or_empty() {
        let first = DirectoryEntry::new(CustomerId::new("c1").unwrap(), "Jane Doe");
        let second = DirectoryEntry::new(CustomerId::new("c2").unwrap(), "Jane Dough");
        let outcome = ReconciliationEngine::reconcile(
            vec![],
            vec![
                (check("1", "5", "Jane"), None),
                (check("1", "5", "Jane"), Some(MatchResult::hit(first, MatchMethod::Exact))),
                (check("1", "5", "Jane"), Some(MatchResult::hit(second, MatchMethod::Exact))),
            ],
        );
        let info = &outcome.donations[0].match_info;
        assert_eq!(info.customer_id.as_ref().map(CustomerId::as_str), Some("c1"));
    }

    #[test]
    fn test_sequence_is_first_seen_order() {
        let outcome = ReconciliationEngine::reconcile(
            vec![],
            vec![
                (check("3", "1", "C"), None),
                (check("1", "1", "A"), None),
                (check("3", "1", "C"), None),
                (check("2", "1", "B"), None),
            ],
        );
        let keys: Vec<_> = outcome
            .donations
            .iter()
            .map(|d| (d.sequence, d.identity_key.as_str().to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (0, "CHECK:3:1.00".to_string()),
                (1, "CHECK:1:1.00".to_string()),
                (2, "CHECK:2:1.00".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_existing_histories_unioned() {
        let base = ReconciliationEngine::reconcile(
            vec![],
            vec![
                (check("9", "10", "N/A"), None),
                (check("9", "10", "John"), None),
            ],
        )
        .donations;
        let twice = vec![base[0].clone(), base[0].clone()];

        let outcome = ReconciliationEngine::reconcile(twice, vec![]);
        assert_eq!(outcome.donations.len(), 1);
        assert_eq!(outcome.donations[0].merge_history.len(), 1);
    }
}
