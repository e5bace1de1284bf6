//! Configuration schema types
//!
//! Every section has serde defaults, so a file only needs the two collaborator
//! base URLs.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration, mapped from the TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlmonerConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Extraction collaborator and worker pool
    pub extraction: ExtractionConfig,

    /// Sliding-window call ceilings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry/backoff for extraction calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Customer directory source and snapshot cache
    pub directory: DirectoryConfig,

    /// Donor matching behaviour
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AlmonerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid setting
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.extraction.validate()?;
        self.rate_limit.validate()?;
        self.retry.validate()?;
        self.directory.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Extraction collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Base URL of the extraction service
    pub base_url: String,

    /// Bearer API key (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Per-call timeout in seconds
    #[serde(default = "default_extraction_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Worker pool size; the only concurrency knob
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Pages per PDF batch
    #[serde(default = "default_pages_per_batch")]
    pub pages_per_batch: u32,
}

impl ExtractionConfig {
    fn validate(&self) -> Result<(), String> {
        validate_base_url("extraction.base_url", &self.base_url)?;

        if self.timeout_seconds == 0 {
            return Err("extraction.timeout_seconds must be greater than 0".to_string());
        }

        if self.max_concurrency == 0 || self.max_concurrency > 100 {
            return Err(format!(
                "extraction.max_concurrency must be between 1 and 100, got {}",
                self.max_concurrency
            ));
        }

        if !(1..=500).contains(&self.pages_per_batch) {
            return Err(format!(
                "extraction.pages_per_batch must be between 1 and 500, got {}",
                self.pages_per_batch
            ));
        }

        Ok(())
    }

    /// Per-call timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Rate limit ceilings; an unset ceiling disables that window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub per_minute: Option<u32>,

    #[serde(default)]
    pub per_hour: Option<u32>,

    /// Longest a worker blocks on the limiter before the call is handed to
    /// retry backoff
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.per_minute == Some(0) {
            return Err("rate_limit.per_minute must be greater than 0 when set".to_string());
        }
        if self.per_hour == Some(0) {
            return Err("rate_limit.per_hour must be greater than 0 when set".to_string());
        }
        Ok(())
    }

    /// Wait budget as a Duration
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_seconds)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: None,
            per_hour: None,
            max_wait_seconds: default_max_wait_seconds(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Upper bound of the uniform random jitter in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries > 10 {
            return Err(format!(
                "retry.max_retries must be <= 10, got {}",
                self.max_retries
            ));
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(format!(
                "retry.max_delay_ms ({}) must be >= retry.initial_delay_ms ({})",
                self.max_delay_ms, self.initial_delay_ms
            ));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// Customer directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the directory service
    pub base_url: String,

    /// Bearer API key (optional)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Snapshot time-to-live in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Request timeout in seconds
    #[serde(default = "default_directory_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl DirectoryConfig {
    fn validate(&self) -> Result<(), String> {
        validate_base_url("directory.base_url", &self.base_url)?;

        if self.cache_ttl_seconds == 0 {
            return Err("directory.cache_ttl_seconds must be greater than 0".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("directory.timeout_seconds must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Snapshot TTL as a Duration
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// How extracted donors are resolved against the directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Ordered strategy cascade, first hit wins
    #[default]
    Cascade,
    /// Sequence-similarity scoring over every entry
    Similarity,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cascade => write!(f, "cascade"),
            Self::Similarity => write!(f, "similarity"),
        }
    }
}

/// Matching configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub mode: MatchMode,

    /// Abort the run when the directory cannot be fetched instead of
    /// continuing with every record unmatched
    #[serde(default)]
    pub fail_on_directory_error: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to rolling files
    #[serde(default)]
    pub local_enabled: bool,

    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// daily or hourly
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,

    #[serde(default = "default_local_max_size_mb")]
    pub local_max_size_mb: usize,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
            local_max_size_mb: default_local_max_size_mb(),
        }
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} cannot be empty"));
    }

    let parsed = url::Url::parse(value).map_err(|e| format!("{field} is not a valid URL: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("{field} must start with http:// or https://"));
    }

    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_extraction_timeout_seconds() -> u64 {
    120
}

fn default_max_concurrency() -> usize {
    10
}

fn default_pages_per_batch() -> u32 {
    10
}

fn default_max_wait_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_jitter_ms() -> u64 {
    250
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

fn default_directory_timeout_seconds() -> u64 {
    30
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

fn default_local_max_size_mb() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn extraction() -> ExtractionConfig {
        ExtractionConfig {
            base_url: "https://extract.example.org".to_string(),
            api_key: Some(secret_string("k".to_string())),
            timeout_seconds: 120,
            max_concurrency: 10,
            pages_per_batch: 10,
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_extraction_config_validation() {
        let mut config = extraction();
        assert!(config.validate().is_ok());

        config.max_concurrency = 0;
        assert!(config.validate().is_err());
        config.max_concurrency = 101;
        assert!(config.validate().is_err());

        config.max_concurrency = 10;
        config.pages_per_batch = 0;
        assert!(config.validate().is_err());
        config.pages_per_batch = 501;
        assert!(config.validate().is_err());

        config.pages_per_batch = 10;
        config.base_url = "ftp://extract.example.org".to_string();
        assert!(config.validate().is_err());
        config.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_validation() {
        let mut config = RetryConfig::default();
        assert!(config.validate().is_ok());

        config.max_retries = 11;
        assert!(config.validate().is_err());

        config.max_retries = 3;
        config.max_delay_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_zero_rejected() {
        let mut config = RateLimitConfig::default();
        assert!(config.validate().is_ok());

        config.per_minute = Some(0);
        assert!(config.validate().is_err());

        config.per_minute = Some(60);
        config.per_hour = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_directory_config_validation() {
        let mut config = DirectoryConfig {
            base_url: "http://localhost:9000".to_string(),
            api_key: None,
            cache_ttl_seconds: 300,
            timeout_seconds: 30,
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));

        config.cache_ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_match_mode_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: MatchMode,
        }

        let parsed: Wrapper = toml::from_str("mode = \"similarity\"").unwrap();
        assert_eq!(parsed.mode, MatchMode::Similarity);
        assert_eq!(MatchMode::default().to_string(), "cascade");
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_extraction_timeout_seconds(), 120);
        assert_eq!(default_max_concurrency(), 10);
        assert_eq!(default_pages_per_batch(), 10);
        assert_eq!(default_max_retries(), 3);
        assert_eq!(default_initial_delay_ms(), 1000);
        assert_eq!(default_max_delay_ms(), 30000);
        assert_eq!(default_jitter_ms(), 250);
        assert_eq!(default_cache_ttl_seconds(), 300);
    }
}
