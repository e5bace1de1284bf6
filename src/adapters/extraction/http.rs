//! HTTP extraction client
//!
//! `POST {base_url}/extract` with the batch content as base64 JSON. The
//! response is `{"records": [...]}`.

use super::ExtractionClient;
use crate::config::{bearer_token, ExtractionConfig};
use crate::domain::{
    BatchContent, ExtractionError, PageRange, RawExtractedRecord, ReconError, Result,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{header, Client, ClientBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    batch_id: &'a str,
    document_name: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_range: Option<PageRange>,
    content_base64: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    records: Vec<RawExtractedRecord>,
}

/// Extraction service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpExtractionClient {
    client: Client,
    endpoint: String,
    authorization: Option<String>,
}

impl HttpExtractionClient {
    /// Creates a client from configuration
    ///
    /// # Errors
    ///
    /// `ReconError::Configuration` when the HTTP client cannot be built.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ReconError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/extract", config.base_url.trim_end_matches('/')),
            authorization: bearer_token(config.api_key.as_ref()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(e: reqwest::Error) -> ExtractionError {
    if e.is_timeout() {
        ExtractionError::Timeout(e.to_string())
    } else {
        ExtractionError::Connection(e.to_string())
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl ExtractionClient for HttpExtractionClient {
    async fn extract(
        &self,
        content: &BatchContent,
    ) -> std::result::Result<Vec<RawExtractedRecord>, ExtractionError> {
        let body = ExtractRequest {
            batch_id: content.batch_id.as_str(),
            document_name: &content.document_name,
            kind: content.kind.as_str(),
            page_range: content.page_range,
            content_base64: general_purpose::STANDARD.encode(content.data.as_slice()),
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(auth) = &self.authorization {
            request = request.header(header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractionError::RateLimited {
                retry_after: retry_after(&response),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::from_status(status.as_u16(), body));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        let parsed: ExtractResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        tracing::debug!(
            batch_id = %content.batch_id,
            records = parsed.records.len(),
            "Extraction service responded"
        );

        Ok(parsed.records)
    }
}
