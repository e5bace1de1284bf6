//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "almoner.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Almoner configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your service URLs", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set ALMONER_EXTRACTION_KEY");
                println!("     - Set ALMONER_DIRECTORY_KEY");
                println!("     - Uncomment the api_key lines that reference them");
                println!("  3. Validate configuration: almoner validate-config");
                println!("  4. Run: almoner reconcile deposits.pdf ledger.csv");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Almoner Configuration File
# Donation Reconciliation Pipeline

[application]
log_level = "info"

[extraction]
base_url = "https://extract.example.org"
# api_key = "${ALMONER_EXTRACTION_KEY}"
max_concurrency = 10
pages_per_batch = 10

[rate_limit]
per_minute = 50

[retry]
max_retries = 3

[directory]
base_url = "https://books.example.org/api"
# api_key = "${ALMONER_DIRECTORY_KEY}"
cache_ttl_seconds = 300

[matching]
mode = "cascade"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Almoner Configuration File
# Donation Reconciliation Pipeline
#
# This file contains all configuration options with examples and explanations.
#
# Any value may reference an environment variable as ${VAR_NAME}, and any
# setting may be overridden with ALMONER_<SECTION>_<KEY>, for example
# ALMONER_EXTRACTION_MAX_CONCURRENCY=4.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Extraction Service
# ============================================================================
[extraction]
# Base URL of the document extraction service; batches are POSTed to
# {base_url}/extract
base_url = "https://extract.example.org"

# Bearer token (use environment variable)
# api_key = "${ALMONER_EXTRACTION_KEY}"

# Per-call timeout in seconds
timeout_seconds = 120

# Batches in flight at once (1-100)
max_concurrency = 10

# Pages per batch when splitting PDF scans (1-500)
pages_per_batch = 10

# ============================================================================
# Rate Limiting
# ============================================================================
[rate_limit]
# Sliding-window ceilings on extraction calls; omit a key for no limit
per_minute = 50
# per_hour = 1000

# Longest a single call may wait for a slot before failing
max_wait_seconds = 30

# ============================================================================
# Retry / Backoff
# ============================================================================
[retry]
# Retries after the first attempt for transient failures (0-10)
max_retries = 3

# Exponential backoff: initial_delay_ms * 2^attempt, capped at max_delay_ms
initial_delay_ms = 1000
max_delay_ms = 30000

# Random jitter added to every delay
jitter_ms = 250

# ============================================================================
# Customer Directory
# ============================================================================
[directory]
# Base URL of the accounting system; customers are read from
# {base_url}/customers
base_url = "https://books.example.org/api"

# Bearer token (use environment variable)
# api_key = "${ALMONER_DIRECTORY_KEY}"

# How long a fetched directory snapshot stays fresh
cache_ttl_seconds = 300

# Request timeout in seconds
timeout_seconds = 30

# ============================================================================
# Matching
# ============================================================================
[matching]
# cascade: exact, contains, swapped, token, email and phone strategies,
#          then a direct directory lookup
# similarity: best fuzzy score over every entry, threshold 0.75
mode = "cascade"

# Abort the run when the directory cannot be fetched instead of leaving
# every donation unmatched
fail_on_directory_error = false

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily or hourly)
local_rotation = "daily"

# Maximum log file size in MB
local_max_size_mb = 100
"#
        .to_string()
    }
}
