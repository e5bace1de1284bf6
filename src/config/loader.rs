//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AlmonerConfig, MatchMode};
use super::secret::secret_string;
use crate::domain::errors::ReconError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AlmonerConfig
/// 4. Applies environment variable overrides (ALMONER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns `ReconError::Configuration` if any step fails.
///
/// # Examples
///
/// ```no_run
/// use almoner::config::loader::load_config;
///
/// let config = load_config("almoner.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AlmonerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ReconError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ReconError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Same as [`load_config`] but from an in-memory TOML document
pub fn load_config_str(contents: &str) -> Result<AlmonerConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AlmonerConfig = toml::from_str(&contents)
        .map_err(|e| ReconError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ReconError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left alone. Every missing variable is reported in one
/// error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ReconError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == name) {
                        missing_vars.push(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ReconError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Reads `name` and parses it, reporting a configuration error on bad values
fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            ReconError::Configuration(format!("Invalid value '{val}' for {name}"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using ALMONER_* prefix
///
/// Environment variables follow the pattern: ALMONER_<SECTION>_<KEY>
/// For example: ALMONER_EXTRACTION_BASE_URL, ALMONER_MATCHING_MODE
fn apply_env_overrides(config: &mut AlmonerConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("ALMONER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Extraction overrides
    if let Ok(val) = std::env::var("ALMONER_EXTRACTION_BASE_URL") {
        config.extraction.base_url = val;
    }
    if let Ok(val) = std::env::var("ALMONER_EXTRACTION_API_KEY") {
        config.extraction.api_key = Some(secret_string(val));
    }
    if let Some(v) = env_parsed("ALMONER_EXTRACTION_TIMEOUT_SECONDS")? {
        config.extraction.timeout_seconds = v;
    }
    if let Some(v) = env_parsed("ALMONER_EXTRACTION_MAX_CONCURRENCY")? {
        config.extraction.max_concurrency = v;
    }
    if let Some(v) = env_parsed("ALMONER_EXTRACTION_PAGES_PER_BATCH")? {
        config.extraction.pages_per_batch = v;
    }

    // Rate limit overrides
    if let Some(v) = env_parsed("ALMONER_RATE_LIMIT_PER_MINUTE")? {
        config.rate_limit.per_minute = Some(v);
    }
    if let Some(v) = env_parsed("ALMONER_RATE_LIMIT_PER_HOUR")? {
        config.rate_limit.per_hour = Some(v);
    }
    if let Some(v) = env_parsed("ALMONER_RATE_LIMIT_MAX_WAIT_SECONDS")? {
        config.rate_limit.max_wait_seconds = v;
    }

    // Retry overrides
    if let Some(v) = env_parsed("ALMONER_RETRY_MAX_RETRIES")? {
        config.retry.max_retries = v;
    }
    if let Some(v) = env_parsed("ALMONER_RETRY_INITIAL_DELAY_MS")? {
        config.retry.initial_delay_ms = v;
    }
    if let Some(v) = env_parsed("ALMONER_RETRY_MAX_DELAY_MS")? {
        config.retry.max_delay_ms = v;
    }
    if let Some(v) = env_parsed("ALMONER_RETRY_JITTER_MS")? {
        config.retry.jitter_ms = v;
    }

    // Directory overrides
    if let Ok(val) = std::env::var("ALMONER_DIRECTORY_BASE_URL") {
        config.directory.base_url = val;
    }
    if let Ok(val) = std::env::var("ALMONER_DIRECTORY_API_KEY") {
        config.directory.api_key = Some(secret_string(val));
    }
    if let Some(v) = env_parsed("ALMONER_DIRECTORY_CACHE_TTL_SECONDS")? {
        config.directory.cache_ttl_seconds = v;
    }
    if let Some(v) = env_parsed("ALMONER_DIRECTORY_TIMEOUT_SECONDS")? {
        config.directory.timeout_seconds = v;
    }

    // Matching overrides
    if let Ok(val) = std::env::var("ALMONER_MATCHING_MODE") {
        config.matching.mode = match val.to_lowercase().as_str() {
            "cascade" => MatchMode::Cascade,
            "similarity" => MatchMode::Similarity,
            other => {
                return Err(ReconError::Configuration(format!(
                    "Invalid value '{other}' for ALMONER_MATCHING_MODE. Must be one of: cascade, similarity"
                )))
            }
        };
    }
    if let Some(v) = env_parsed("ALMONER_MATCHING_FAIL_ON_DIRECTORY_ERROR")? {
        config.matching.fail_on_directory_error = v;
    }

    // Logging overrides
    if let Some(v) = env_parsed("ALMONER_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = v;
    }
    if let Ok(val) = std::env::var("ALMONER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("ALMONER_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
