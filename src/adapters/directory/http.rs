//! HTTP customer directory
//!
//! `GET {base_url}/customers` returns the whole directory as
//! `{"customers": [...]}`; `GET {base_url}/customers?name=<term>` returns a
//! single entry or 404.

use super::DirectorySource;
use crate::config::{bearer_token, DirectoryConfig};
use crate::domain::{DirectoryEntry, MatchError, ReconError, Result};
use async_trait::async_trait;
use reqwest::{header, Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct CustomersResponse {
    customers: Vec<DirectoryEntry>,
}

/// Customer directory reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpDirectorySource {
    client: Client,
    endpoint: String,
    authorization: Option<String>,
}

impl HttpDirectorySource {
    /// Creates a source from configuration
    ///
    /// # Errors
    ///
    /// `ReconError::Configuration` when the HTTP client cannot be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ReconError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/customers", config.base_url.trim_end_matches('/')),
            authorization: bearer_token(config.api_key.as_ref()),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.authorization {
            Some(auth) => request.header(header::AUTHORIZATION, auth),
            None => request,
        }
    }
}

#[async_trait]
impl DirectorySource for HttpDirectorySource {
    async fn fetch_all(&self) -> std::result::Result<Vec<DirectoryEntry>, MatchError> {
        let response = self
            .authorized(self.client.get(&self.endpoint))
            .send()
            .await
            .map_err(|e| MatchError::DirectoryUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MatchError::DirectoryUnavailable(format!(
                "GET customers failed with status {status}: {body}"
            )));
        }

        let parsed: CustomersResponse = response
            .json()
            .await
            .map_err(|e| MatchError::InvalidResponse(e.to_string()))?;

        tracing::debug!(entries = parsed.customers.len(), "Fetched customer directory");
        Ok(parsed.customers)
    }

    async fn lookup(&self, name: &str) -> std::result::Result<Option<DirectoryEntry>, MatchError> {
        let response = self
            .authorized(self.client.get(&self.endpoint).query(&[("name", name)]))
            .send()
            .await
            .map_err(|e| MatchError::DirectoryUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<DirectoryEntry>()
                .await
                .map(Some)
                .map_err(|e| MatchError::InvalidResponse(e.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(MatchError::DirectoryUnavailable(format!(
                    "Customer lookup failed with status {status}: {body}"
                )))
            }
        }
    }
}
