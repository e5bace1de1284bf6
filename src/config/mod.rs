//! Configuration management for Almoner.
//!
//! # Overview
//!
//! Almoner uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ALMONER_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use almoner::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("almoner.toml")?;
//! println!("Extraction service: {}", config.extraction.base_url);
//! println!("Workers: {}", config.extraction.max_concurrency);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [extraction]
//! base_url = "https://extract.example.org"
//! api_key = "${ALMONER_EXTRACTION_KEY}"
//! max_concurrency = 10
//!
//! [rate_limit]
//! per_minute = 50
//!
//! [directory]
//! base_url = "https://books.example.org/api"
//! cache_ttl_seconds = 300
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{
    AlmonerConfig, ApplicationConfig, DirectoryConfig, ExtractionConfig, LoggingConfig,
    MatchMode, MatchingConfig, RateLimitConfig, RetryConfig,
};
pub use secret::{bearer_token, secret_string, secret_string_opt, SecretString, SecretValue};
