//! Identity key derivation

use super::normalize::{normalize_amount, normalize_check_number, normalize_date, normalize_donor};
use crate::domain::{DonationFields, IdentityKey};
use thiserror::Error;

/// A record that cannot be keyed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Missing amount; a donation needs an amount plus a check number or donor name")]
    MissingAmount,

    #[error("Missing donor name and check number")]
    MissingDonor,
}

/// Derives the deduplication key for `fields`
///
/// `CHECK:<check>:<amount>` when both normalize to a value, otherwise
/// `OTHER:<donor>:<amount>:<date>` with an empty date component when the
/// date is missing.
///
/// # Errors
///
/// [`IdentityError`] when neither shape can be built.
pub fn derive_identity_key(fields: &DonationFields) -> Result<IdentityKey, IdentityError> {
    let amount = normalize_amount(fields.amount.as_deref()).ok_or(IdentityError::MissingAmount)?;

    if let Some(check) = normalize_check_number(fields.check_number.as_deref()) {
        return Ok(IdentityKey::check(&check, &amount));
    }

    let donor = normalize_donor(fields.donor_name.as_deref()).ok_or(IdentityError::MissingDonor)?;
    let date = normalize_date(fields.date.as_deref()).unwrap_or_default();
    Ok(IdentityKey::other(&donor, &amount, &date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(donor: Option<&str>, amount: Option<&str>, check: Option<&str>, date: Option<&str>) -> DonationFields {
        DonationFields {
            donor_name: donor.map(String::from),
            amount: amount.map(String::from),
            check_number: check.map(String::from),
            date: date.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_key_preferred() {
        let key = derive_identity_key(&fields(Some("Jane"), Some("$100"), Some("0012"), None)).unwrap();
        assert_eq!(key.as_str(), "CHECK:12:100.00");
        assert!(key.is_check());
    }

    #[test]
    fn test_other_key_when_no_check() {
        let key = derive_identity_key(&fields(
            Some("Jane  Doe"),
            Some("75"),
            Some("N/A"),
            Some("03/14/2025"),
        ))
        .unwrap();
        assert_eq!(key.as_str(), "OTHER:jane doe:75.00:2025-03-14");
    }

    #[test]
    fn test_other_key_without_date() {
        let key = derive_identity_key(&fields(Some("Jane"), Some("5"), None, None)).unwrap();
        assert_eq!(key.as_str(), "OTHER:jane:5.00:");
    }

    #[test]
    fn test_insufficient_fields() {
        assert_eq!(
            derive_identity_key(&fields(Some("Jane"), None, Some("1"), None)),
            Err(IdentityError::MissingAmount)
        );
        assert_eq!(
            derive_identity_key(&fields(Some("unknown"), Some("10"), None, None)),
            Err(IdentityError::MissingDonor)
        );
    }
}
