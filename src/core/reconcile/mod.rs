//! Donation reconciliation: normalization, identity keys and merging

pub mod engine;
pub mod identity;
pub mod merge;
pub mod normalize;

pub use engine::{DroppedRecord, ReconcileOutcome, ReconciliationEngine};
pub use identity::{derive_identity_key, IdentityError};
pub use merge::synthesize;
