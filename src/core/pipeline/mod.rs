//! End-to-end reconciliation runs

pub mod coordinator;
pub mod summary;

pub use coordinator::{MatchSettings, ReconcileCoordinator};
pub use summary::{
    DocumentPayload, IssueKind, ReconcileReport, ReconcileRequest, ReconcileResponse, RunIssue,
};
