//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Almoner configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        match config.validate() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                println!();
                println!("Configuration Summary:");
                println!("  Log Level: {}", config.application.log_level);
                println!("  Extraction Service: {}", config.extraction.base_url);
                println!("  Workers: {}", config.extraction.max_concurrency);
                println!("  Pages per Batch: {}", config.extraction.pages_per_batch);
                println!("  Rate Limit: {}", describe_rate_limit(&config.rate_limit));
                println!(
                    "  Retries: {} (backoff {}ms..{}ms)",
                    config.retry.max_retries, config.retry.initial_delay_ms, config.retry.max_delay_ms
                );
                println!("  Customer Directory: {}", config.directory.base_url);
                println!("  Directory Cache TTL: {}s", config.directory.cache_ttl_seconds);
                println!("  Match Mode: {}", config.matching.mode);
                if config.logging.local_enabled {
                    println!("  File Logs: {}", config.logging.local_path);
                }
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2)
            }
        }
    }
}

fn describe_rate_limit(config: &crate::config::RateLimitConfig) -> String {
    match (config.per_minute, config.per_hour) {
        (None, None) => "unlimited".to_string(),
        (Some(m), None) => format!("{m}/minute"),
        (None, Some(h)) => format!("{h}/hour"),
        (Some(m), Some(h)) => format!("{m}/minute, {h}/hour"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use std::io::Write;

    #[test]
    fn test_describe_rate_limit() {
        let mut config = RateLimitConfig::default();
        config.per_minute = None;
        config.per_hour = None;
        assert_eq!(describe_rate_limit(&config), "unlimited");

        config.per_minute = Some(50);
        config.per_hour = Some(1000);
        assert_eq!(describe_rate_limit(&config), "50/minute, 1000/hour");
    }

    #[tokio::test]
    async fn test_validate_minimal_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[extraction]
base_url = "https://extract.example.org"

[directory]
base_url = "https://books.example.org/api"
"#
        )
        .unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("/nonexistent/almoner.toml")
            .await
            .unwrap();
        assert_eq!(code, 2);
    }
}
