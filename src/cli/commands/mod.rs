//! CLI command implementations
//!
//! Every command returns its process exit code:
//! 0 success, 1 completed with errors, 2 configuration error,
//! 4 collaborator initialisation failure, 5 fatal run error, 130 interrupted.

pub mod init;
pub mod match_cmd;
pub mod reconcile;
pub mod validate;
