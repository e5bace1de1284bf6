//! Reconciled donations and their merge audit trail

use super::ids::{CustomerId, DonationId, IdentityKey};
use super::matching::MatchMethod;
use super::record::RawExtractedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mergeable donation fields
///
/// These are the fields a later record may fill in or improve. Engine-owned
/// metadata lives on [`ReconciledDonation`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationFields {
    pub donor_name: Option<String>,
    pub amount: Option<String>,
    pub date: Option<String>,
    pub check_number: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub memo: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Name of the memo field; merged by concatenation instead of replacement
pub const MEMO_FIELD: &str = "memo";

impl DonationFields {
    /// Field names in a fixed order, paired with mutable access
    pub fn entries_mut(&mut self) -> [(&'static str, &mut Option<String>); 12] {
        [
            ("donor_name", &mut self.donor_name),
            ("amount", &mut self.amount),
            ("date", &mut self.date),
            ("check_number", &mut self.check_number),
            ("address_line1", &mut self.address_line1),
            ("address_line2", &mut self.address_line2),
            ("city", &mut self.city),
            ("state", &mut self.state),
            ("postal_code", &mut self.postal_code),
            (MEMO_FIELD, &mut self.memo),
            ("email", &mut self.email),
            ("phone", &mut self.phone),
        ]
    }

    /// Field names in the same order as [`Self::entries_mut`], read-only
    pub fn entries(&self) -> [(&'static str, Option<&str>); 12] {
        [
            ("donor_name", self.donor_name.as_deref()),
            ("amount", self.amount.as_deref()),
            ("date", self.date.as_deref()),
            ("check_number", self.check_number.as_deref()),
            ("address_line1", self.address_line1.as_deref()),
            ("address_line2", self.address_line2.as_deref()),
            ("city", self.city.as_deref()),
            ("state", self.state.as_deref()),
            ("postal_code", self.postal_code.as_deref()),
            (MEMO_FIELD, self.memo.as_deref()),
            ("email", self.email.as_deref()),
            ("phone", self.phone.as_deref()),
        ]
    }
}

impl From<&RawExtractedRecord> for DonationFields {
    fn from(record: &RawExtractedRecord) -> Self {
        Self {
            donor_name: record.donor_name.clone(),
            amount: record.amount.clone(),
            date: record.date.clone(),
            check_number: record.check_number.clone(),
            address_line1: record.address_line1.clone(),
            address_line2: record.address_line2.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            postal_code: record.postal_code.clone(),
            memo: record.memo.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
        }
    }
}

/// Sync state with the downstream accounting system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    #[default]
    Pending,
    Synced,
    Failed,
}

/// Identifying triplet of the record that caused a merge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingIdentity {
    pub check_number: Option<String>,
    pub amount: Option<String>,
    pub donor_name: Option<String>,
}

/// One merge event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEntry {
    pub timestamp: DateTime<Utc>,
    pub changed_fields: Vec<String>,
    pub incoming: IncomingIdentity,
}

impl MergeEntry {
    /// True when both entries record the same change from the same record,
    /// regardless of when it happened
    pub fn same_event(&self, other: &MergeEntry) -> bool {
        self.changed_fields == other.changed_fields && self.incoming == other.incoming
    }
}

/// Match metadata owned by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub method: MatchMethod,
    pub confidence: f64,
}

impl Default for MatchInfo {
    fn default() -> Self {
        Self {
            customer_id: None,
            customer_name: None,
            method: MatchMethod::None,
            confidence: 0.0,
        }
    }
}

/// A deduplicated donation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledDonation {
    pub identity_key: IdentityKey,
    pub internal_id: DonationId,
    pub fields: DonationFields,
    #[serde(rename = "match", default)]
    pub match_info: MatchInfo,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub merge_history: Vec<MergeEntry>,
    #[serde(default)]
    pub is_merged: bool,
    /// First-seen position; output is ordered by it
    #[serde(default)]
    pub sequence: u64,
}

impl ReconciledDonation {
    /// Creates a donation for a key seen for the first time
    pub fn new(identity_key: IdentityKey, fields: DonationFields, sequence: u64) -> Self {
        Self {
            internal_id: DonationId::from_identity_key(&identity_key),
            identity_key,
            fields,
            match_info: MatchInfo::default(),
            sync_status: SyncStatus::default(),
            merge_history: Vec::new(),
            is_merged: false,
            sequence,
        }
    }

    /// Appends an audit entry unless an identical event is already recorded
    ///
    /// Returns true when the entry was added.
    pub fn record_merge(&mut self, entry: MergeEntry) -> bool {
        if self.merge_history.iter().any(|e| e.same_event(&entry)) {
            return false;
        }
        self.merge_history.push(entry);
        self.is_merged = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(fields: &[&str], check: &str) -> MergeEntry {
        MergeEntry {
            timestamp: Utc::now(),
            changed_fields: fields.iter().map(|s| s.to_string()).collect(),
            incoming: IncomingIdentity {
                check_number: Some(check.to_string()),
                amount: Some("100.00".to_string()),
                donor_name: None,
            },
        }
    }

    #[test]
    fn test_new_donation_has_derived_id() {
        let key = IdentityKey::check("1234", "100.00");
        let donation = ReconciledDonation::new(key.clone(), DonationFields::default(), 0);
        assert_eq!(donation.internal_id, DonationId::from_identity_key(&key));
        assert!(!donation.is_merged);
        assert_eq!(donation.sync_status, SyncStatus::Pending);
    }

    #[test]
    fn test_record_merge_skips_identical_event() {
        let mut donation =
            ReconciledDonation::new(IdentityKey::check("1", "1.00"), DonationFields::default(), 0);

        assert!(donation.record_merge(entry(&["memo"], "1")));
        assert!(!donation.record_merge(entry(&["memo"], "1")));
        assert!(donation.record_merge(entry(&["memo", "city"], "1")));
        assert_eq!(donation.merge_history.len(), 2);
        assert!(donation.is_merged);
    }

    #[test]
    fn test_serde_roundtrip_preserves_metadata() {
        let mut donation =
            ReconciledDonation::new(IdentityKey::check("9", "5.00"), DonationFields::default(), 4);
        donation.sync_status = SyncStatus::Synced;
        donation.match_info.method = MatchMethod::Exact;

        let json = serde_json::to_string(&donation).unwrap();
        let back: ReconciledDonation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, donation);
    }
}
