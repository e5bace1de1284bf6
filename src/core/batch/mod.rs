//! Batch planning and bounded-concurrency orchestration

pub mod orchestrator;
pub mod planner;
pub mod summary;

pub use orchestrator::{BatchOrchestrator, OrchestratorSettings, DEFAULT_MAX_CONCURRENCY};
pub use planner::{BatchPlanner, PlanOutcome, PlanWarning, DEFAULT_PAGES_PER_BATCH};
pub use summary::{BatchError, BatchErrorKind, OrchestrationOutcome};
