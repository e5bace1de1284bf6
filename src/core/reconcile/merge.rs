//! Field-level merge of a later record into an existing donation

use super::normalize::is_placeholder;
use crate::domain::donation::MEMO_FIELD;
use crate::domain::{DonationFields, IncomingIdentity, MergeEntry, ReconciledDonation};
use chrono::Utc;

/// Separator between merged memo texts
pub const MEMO_SEPARATOR: &str = "; ";

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !is_placeholder(v))
}

/// New value for one field, or `None` to keep the existing one
fn merged_value(name: &str, existing: Option<&str>, incoming: Option<&str>) -> Option<String> {
    let incoming = filled(incoming)?;
    let Some(current) = filled(existing) else {
        return Some(incoming.to_string());
    };

    if name == MEMO_FIELD {
        if current.contains(incoming) {
            return None;
        }
        return Some(format!("{current}{MEMO_SEPARATOR}{incoming}"));
    }

    (incoming.chars().count() > current.chars().count()).then(|| incoming.to_string())
}

/// Merges `incoming` into `existing`
///
/// A field takes the incoming value when the existing one is blank or a
/// placeholder, or when the incoming text is strictly longer. Memos are
/// joined instead. Match info, sync status and the internal id are never
/// touched. A call that changes anything appends one audit entry listing
/// every changed field.
///
/// Returns the names of the changed fields.
pub fn synthesize(existing: &mut ReconciledDonation, incoming: &DonationFields) -> Vec<String> {
    let mut changed = Vec::new();
    let incoming_values = incoming.entries();

    for ((name, slot), (_, value)) in existing.fields.entries_mut().into_iter().zip(incoming_values) {
        if let Some(next) = merged_value(name, slot.as_deref(), value) {
            *slot = Some(next);
            changed.push(name.to_string());
        }
    }

    if !changed.is_empty() {
        existing.record_merge(MergeEntry {
            timestamp: Utc::now(),
            changed_fields: changed.clone(),
            incoming: IncomingIdentity {
                check_number: incoming.check_number.clone(),
                amount: incoming.amount.clone(),
                donor_name: incoming.donor_name.clone(),
            },
        });
        tracing::debug!(
            identity_key = %existing.identity_key,
            changed = ?changed,
            "Donation merged"
        );
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerId, IdentityKey, MatchMethod, SyncStatus};

    fn donation(fields: DonationFields) -> ReconciledDonation {
        ReconciledDonation::new(IdentityKey::check("1234", "100.00"), fields, 0)
    }

    #[test]
    fn test_placeholder_donor_replaced() {
        let mut existing = donation(DonationFields {
            donor_name: Some("N/A".into()),
            ..Default::default()
        });
        let changed = synthesize(
            &mut existing,
            &DonationFields {
                donor_name: Some("John".into()),
                ..Default::default()
            },
        );

        assert_eq!(changed, vec!["donor_name"]);
        assert_eq!(existing.fields.donor_name.as_deref(), Some("John"));
        assert_eq!(existing.merge_history.len(), 1);
        assert!(existing.is_merged);
    }

    #[test]
    fn test_memo_concatenates() {
        let mut existing = donation(DonationFields {
            memo: Some("A".into()),
            ..Default::default()
        });
        let incoming = DonationFields {
            memo: Some("B".into()),
            ..Default::default()
        };
        synthesize(&mut existing, &incoming);
        assert_eq!(existing.fields.memo.as_deref(), Some("A; B"));

        // Already present: no change, no new entry
        assert!(synthesize(&mut existing, &incoming).is_empty());
        assert_eq!(existing.merge_history.len(), 1);
    }

    #[test]
    fn test_longer_text_wins_shorter_does_not() {
        let mut existing = donation(DonationFields {
            address_line1: Some("12 Oak St".into()),
            city: Some("Springfield".into()),
            ..Default::default()
        });
        let changed = synthesize(
            &mut existing,
            &DonationFields {
                address_line1: Some("12 Oak Street".into()),
                city: Some("Spfld".into()),
                ..Default::default()
            },
        );

        assert_eq!(changed, vec!["address_line1"]);
        assert_eq!(existing.fields.city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_one_entry_for_many_fields() {
        let mut existing = donation(DonationFields::default());
        let changed = synthesize(
            &mut existing,
            &DonationFields {
                donor_name: Some("Jane".into()),
                city: Some("Austin".into()),
                memo: Some("Gala".into()),
                ..Default::default()
            },
        );
        assert_eq!(changed.len(), 3);
        assert_eq!(existing.merge_history.len(), 1);
        assert_eq!(existing.merge_history[0].changed_fields, changed);
    }

    #[test]
    fn test_placeholder_incoming_ignored() {
        let mut existing = donation(DonationFields {
            donor_name: Some("Jane".into()),
            ..Default::default()
        });
        let changed = synthesize(
            &mut existing,
            &DonationFields {
                donor_name: Some("unknown person".into()),
                memo: Some("N/A".into()),
                ..Default::default()
            },
        );
        // "unknown person" is real text, longer than "Jane"
        assert_eq!(changed, vec!["donor_name"]);
        assert!(existing.fields.memo.is_none());
    }

    #[test]
    fn test_engine_owned_fields_preserved() {
        let mut existing = donation(DonationFields::default());
        existing.match_info.customer_id = Some(CustomerId::new("c-1").unwrap());
        existing.match_info.method = MatchMethod::Exact;
        existing.sync_status = SyncStatus::Synced;
        let id = existing.internal_id.clone();

        synthesize(
            &mut existing,
            &DonationFields {
                donor_name: Some("Jane".into()),
                ..Default::default()
            },
        );

        assert_eq!(existing.internal_id, id);
        assert_eq!(existing.sync_status, SyncStatus::Synced);
        assert_eq!(existing.match_info.method, MatchMethod::Exact);
    }
}
