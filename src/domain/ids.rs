//! Domain identifier types with validation
//!
//! Newtype wrappers keep batch ids, identity keys, donation ids and directory
//! customer ids from being mixed up.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Batch identifier
///
/// Deterministic: built from the document name and the unit it covers, so
/// planning the same documents twice yields the same ids.
///
/// # Examples
///
/// ```
/// use almoner::domain::ids::BatchId;
///
/// let id = BatchId::for_pages("march-deposits.pdf", 11, 20);
/// assert_eq!(id.as_str(), "march-deposits.pdf#p11-20");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(String);

impl BatchId {
    /// Creates a new BatchId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Batch ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Id for an inclusive, 1-based page range of a PDF
    pub fn for_pages(document_name: &str, start: u32, end: u32) -> Self {
        Self(format!("{document_name}#p{start}-{end}"))
    }

    /// Id for a whole-file unit (image or CSV)
    pub fn for_whole(document_name: &str, unit: &str) -> Self {
        Self(format!("{document_name}#{unit}"))
    }

    /// Returns the batch ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for BatchId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity key used to deduplicate donations
///
/// Two shapes exist:
/// - `CHECK:<check_number>:<amount>`
/// - `OTHER:<donor>:<amount>:<date>`
///
/// Components are expected to be normalized already; see
/// [`crate::core::reconcile::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Key for a donation identified by check number and amount
    pub fn check(check_number: &str, amount: &str) -> Self {
        Self(format!("CHECK:{check_number}:{amount}"))
    }

    /// Key for a donation identified by donor, amount and date
    pub fn other(donor: &str, amount: &str, date: &str) -> Self {
        Self(format!("OTHER:{donor}:{amount}:{date}"))
    }

    /// Parses a stored key, rejecting anything without a known prefix
    pub fn parse(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.starts_with("CHECK:") || key.starts_with("OTHER:") {
            Ok(Self(key))
        } else {
            Err(format!(
                "Invalid identity key '{key}'. Expected CHECK:<check>:<amount> or OTHER:<donor>:<amount>:<date>"
            ))
        }
    }

    /// True for keys built from a check number
    pub fn is_check(&self) -> bool {
        self.0.starts_with("CHECK:")
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<IdentityKey> for String {
    fn from(key: IdentityKey) -> Self {
        key.0
    }
}

/// Internal identifier of a reconciled donation
///
/// Derived from the identity key so the same donation gets the same id no
/// matter which run, or which batch completion order, produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DonationId(String);

impl DonationId {
    /// Stable id for an identity key: `don_` + 16 hex chars of SHA-256
    pub fn from_identity_key(key: &IdentityKey) -> Self {
        let digest = Sha256::digest(key.as_str().as_bytes());
        let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        Self(format!("don_{hex}"))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer identifier in the external directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a new CustomerId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Customer ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the customer ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CustomerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
