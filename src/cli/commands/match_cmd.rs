//! Match command implementation
//!
//! Resolves one donor against the customer directory and prints the
//! match result as JSON.

use crate::adapters::directory::HttpDirectorySource;
use crate::config::{load_config, MatchMode};
use crate::core::directory::DirectoryCache;
use crate::core::matching::{CustomerMatcher, SearchTerms};
use crate::domain::{MatchError, MatchResult};
use clap::Args;
use std::sync::Arc;

/// Arguments for the match command
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Donor name as written on the source document
    pub name: String,

    /// Donor email address
    #[arg(long)]
    pub email: Option<String>,

    /// Donor phone number
    #[arg(long)]
    pub phone: Option<String>,

    /// Override the matching mode
    #[arg(long, value_enum)]
    pub mode: Option<MatchMode>,
}

impl MatchArgs {
    /// Execute the match command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(name = %self.name, "Matching donor");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let source = match HttpDirectorySource::new(&config.directory) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create directory source");
                eprintln!("Failed to initialize directory source: {e}");
                return Ok(4);
            }
        };

        let cache = Arc::new(DirectoryCache::new(Arc::new(source), config.directory.cache_ttl()));
        let matcher = CustomerMatcher::new(cache);
        let terms = self.terms();
        let mode = self.mode.unwrap_or(config.matching.mode);

        let result = match resolve(&matcher, &terms, mode).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Directory unavailable");
                eprintln!("Match failed: {e}");
                return Ok(5);
            }
        };

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(0)
    }

    fn terms(&self) -> SearchTerms {
        SearchTerms::new(self.name.as_str())
            .with_email(self.email.as_deref())
            .with_phone(self.phone.as_deref())
    }
}

async fn resolve(
    matcher: &CustomerMatcher,
    terms: &SearchTerms,
    mode: MatchMode,
) -> Result<MatchResult, MatchError> {
    match mode {
        MatchMode::Cascade => matcher.find_customer(terms).await,
        MatchMode::Similarity => {
            let snapshot = matcher.cache().get_all(true).await?;
            Ok(matcher.score(terms, &snapshot))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_carry_contact_details() {
        let args = MatchArgs {
            name: "  Smith, John ".to_string(),
            email: Some("john@smith.org".to_string()),
            phone: None,
            mode: None,
        };

        let terms = args.terms();
        assert_eq!(terms.text(), "Smith, John");
        assert_eq!(terms.email(), Some("john@smith.org"));
        assert_eq!(terms.phone(), None);
    }

    #[tokio::test]
    async fn test_missing_config_is_configuration_error() {
        let args = MatchArgs {
            name: "John Smith".to_string(),
            email: None,
            phone: None,
            mode: None,
        };

        let code = args.execute("/nonexistent/almoner.toml").await.unwrap();
        assert_eq!(code, 2);
    }
}
