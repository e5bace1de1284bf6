//! Domain error types
//!
//! This module defines the error hierarchy for Almoner. Collaborator errors are
//! classified here (retryable vs fatal) so the retry layer never has to look at
//! third-party types.

use std::time::Duration;
use thiserror::Error;

/// Main Almoner error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ReconError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Extraction collaborator errors
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Directory / matching errors
    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    /// Batch planning errors
    #[error("Planning error: {0}")]
    Planning(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Errors returned by the extraction collaborator
///
/// Each variant knows whether it is worth retrying; see [`ExtractionError::is_retryable`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// The call did not complete within the per-call timeout
    #[error("Extraction timed out: {0}")]
    Timeout(String),

    /// Transport-level failure (DNS, refused connection, reset)
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Remote rate limit (HTTP 429)
    #[error("Rate limited by extraction service (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Local rate limiter wait exceeded the configured budget
    #[error("Throttled locally, next slot in {wait:?}")]
    Throttled { wait: Duration },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    Client { status: u16, message: String },

    /// Response could not be decoded into records
    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    /// Collaborator-specific failure with an explicit retry decision
    #[error("{message}")]
    Other { message: String, retryable: bool },
}

impl ExtractionError {
    /// Classify an HTTP-like status code into an extraction error
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => Self::RateLimited { retry_after: None },
            500..=599 => Self::Server { status, message },
            _ => Self::Client { status, message },
        }
    }

    /// Whether the failure is transient and the call may be attempted again
    ///
    /// Retryable: explicit flag, 429, 500/502/503/504, timeouts, connection
    /// failures and local throttling. Everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_)
            | Self::Connection(_)
            | Self::RateLimited { .. }
            | Self::Throttled { .. } => true,
            Self::Server { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            Self::Client { status, .. } => *status == 429,
            Self::MalformedResponse(_) => false,
            Self::Other { retryable, .. } => *retryable,
        }
    }

    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while resolving donors against the customer directory
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MatchError {
    /// The directory source could not be reached or refused the request
    #[error("Customer directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// The directory answered with something that is not a customer list
    #[error("Invalid customer directory response: {0}")]
    InvalidResponse(String),
}

/// Something the retry layer can ask "should I try again?"
pub trait Retryable {
    /// Whether another attempt may succeed
    fn is_retryable(&self) -> bool;

    /// Earliest point, from now, at which another attempt makes sense
    ///
    /// The retry layer never sleeps less than this.
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// False when the operation gave up before reaching the remote side, so
    /// the failure should not use up a retry
    fn consumes_attempt(&self) -> bool {
        true
    }
}

impl Retryable for ExtractionError {
    fn is_retryable(&self) -> bool {
        ExtractionError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { wait } => Some(*wait),
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    fn consumes_attempt(&self) -> bool {
        !matches!(self, Self::Throttled { .. })
    }
}

impl Retryable for MatchError {
    fn is_retryable(&self) -> bool {
        matches!(self, MatchError::DirectoryUnavailable(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        ReconError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        ReconError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ReconError {
    fn from(err: toml::de::Error) -> Self {
        ReconError::Configuration(format!("TOML parse error: {err}"))
    }
}
