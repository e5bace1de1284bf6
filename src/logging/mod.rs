//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with an `EnvFilter`
//! - Optional JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use almoner::logging::init_logging;
//! use almoner::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use almoner::log_retry_attempt;
///
/// log_retry_attempt!("extract a.pdf#p1-10", 2, 3, 2000u64, "503 Service Unavailable");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $retry:expr, $max_retries:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            operation = %$operation,
            retry = $retry,
            max_retries = $max_retries,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

/// Log the completion of one batch
///
/// # Example
///
/// ```no_run
/// use almoner::log_batch_progress;
///
/// log_batch_progress!(3, 12, "march.pdf#p21-30", true);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($processed:expr, $total:expr, $batch_id:expr, $success:expr) => {
        tracing::info!(
            processed = $processed,
            total = $total,
            batch_id = %$batch_id,
            success = $success,
            progress_pct = (if $total == 0 {
                100.0
            } else {
                $processed as f64 / $total as f64 * 100.0
            }),
            "Batch complete"
        );
    };
}

/// Log an error with context
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
