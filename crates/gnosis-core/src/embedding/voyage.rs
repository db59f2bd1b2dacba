//! Voyage AI embedding client
//!
//! Talks to `POST {base_url}/embeddings` with bearer auth. The embedding
//! mode travels as `input_type` so the provider can pick query or document
//! geometry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, error};

use crate::config::{EmbeddingConfig, VOYAGE_API_KEY_VAR};
use crate::error::{Error, Result};

use super::gateway::{EmbeddingGateway, validate_batch};
use super::types::{EmbeddingMode, EmbeddingRequest, EmbeddingResponse, EmbeddingVector};

/// Voyage embedding client
///
/// Cheap to clone and safe to share; the inner reqwest client pools
/// connections.
#[derive(Clone)]
pub struct VoyageClient {
    http_client: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
    dimension: usize,
}

impl std::fmt::Debug for VoyageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoyageClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl VoyageClient {
    /// Create a client from configuration and an API key
    pub fn new(config: &EmbeddingConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::ConfigError(format!(
                "{} is required for embeddings",
                VOYAGE_API_KEY_VAR
            )));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            dimension: config.dimension,
        })
    }

    async fn request_embeddings(
        &self,
        texts: &[String],
        mode: EmbeddingMode,
    ) -> Result<Vec<EmbeddingVector>> {
        let url = format!("{}/embeddings", self.base_url);
        let request = EmbeddingRequest {
            input: texts.to_vec(),
            model: self.model.clone(),
            input_type: mode,
        };

        debug!(
            model = %self.model,
            count = texts.len(),
            mode = %mode,
            "Sending embedding request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Failed to generate embeddings: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => Error::embedding(format!(
                    "Failed to generate embeddings: unauthorized, check {}",
                    VOYAGE_API_KEY_VAR
                )),
                429 => Error::embedding(format!(
                    "Failed to generate embeddings: rate limited: {}",
                    body
                )),
                _ => Error::embedding(format!(
                    "Failed to generate embeddings: HTTP {}: {}",
                    status, body
                )),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            Error::embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        debug!(
            tokens = parsed.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "Embedding response received"
        );

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingGateway for VoyageClient {
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> Result<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let result = self
            .request_embeddings(texts, mode)
            .await
            .and_then(|vectors| validate_batch(texts.len(), self.dimension, vectors));

        if let Err(e) = &result {
            error!(error = %e, count = texts.len(), mode = %mode, "Embedding failed");
        }
        result
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
