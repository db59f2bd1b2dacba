//! Chat completion client for OpenAI-compatible providers
//!
//! Provides an async HTTP client with:
//! - Chat completions with optional structured output
//! - Status-specific error messages
//!
//! Requests are sent exactly once; failures surface immediately as
//! inference errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::model::GenerativeModel;
use super::types::{ChatRequest, ChatResponse, LlmResponse, Message, ResponseFormat};

/// Chat completion client
///
/// Cheap to clone and safe to share across concurrent requests; it holds no
/// per-request state.
#[derive(Clone)]
pub struct LlmClient {
    /// HTTP client for making requests
    http_client: HttpClient,
    /// LLM configuration (model, temperature, etc.)
    config: LlmConfig,
    /// API key for authentication
    api_key: String,
    /// Base URL for the API
    base_url: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

/// Builder for creating an LlmClient
#[derive(Default)]
pub struct LlmClientBuilder {
    config: Option<LlmConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl LlmClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LLM configuration
    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the base URL from the configuration
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Override the request timeout
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the LlmClient
    pub fn build(self) -> Result<LlmClient> {
        let config = self.config.unwrap_or_default();
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigError("LLM API key is required".to_string()))?;

        let timeout_secs = self.timeout_secs.unwrap_or(config.timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| config.base_url.clone())
            .trim_end_matches('/')
            .to_string();

        Ok(LlmClient {
            http_client,
            config,
            api_key,
            base_url,
        })
    }
}

impl LlmClient {
    /// Create a new LlmClient with the given configuration and API key
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        LlmClientBuilder::new()
            .config(config)
            .api_key(api_key)
            .build()
    }

    /// Create a new builder for LlmClient
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::new()
    }

    /// Get the model from configuration
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Make a chat completion request
    ///
    /// When `format` is given the provider is asked to constrain its output
    /// to that format.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        format: Option<ResponseFormat>,
    ) -> Result<LlmResponse> {
        let mut request = ChatRequest::new(&self.config.model, messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        if let Some(format) = format {
            request = request.with_response_format(format);
        }

        self.send_request(&request).await
    }

    /// Send a single request to the API
    async fn send_request(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            structured = request.response_format.is_some(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::inference(format!("Model request timed out: {}", e))
                } else {
                    Error::inference(format!("Model request failed: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            return Err(error_for_status(status, response).await);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::inference(format!("Failed to parse response: {}", e)))?;

        LlmResponse::from_chat_response(chat_response)
            .ok_or_else(|| Error::inference("Empty response from model"))
    }
}

#[async_trait]
impl GenerativeModel for LlmClient {
    async fn generate(
        &self,
        messages: Vec<Message>,
        format: Option<ResponseFormat>,
    ) -> Result<LlmResponse> {
        self.complete(messages, format).await
    }

    fn model_name(&self) -> &str {
        self.model()
    }
}

/// Map an unsuccessful response onto an inference error
async fn error_for_status(status: reqwest::StatusCode, response: reqwest::Response) -> Error {
    let body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 => Error::inference(format!(
            "Unauthorized: invalid API key. Set the {} environment variable.",
            crate::config::CEREBRAS_API_KEY_VAR
        )),
        429 => Error::inference(format!("Rate limited by model provider: {}", body)),
        400 => Error::inference(format!("Bad request: {}", body)),
        404 => Error::inference(format!("Model not found or endpoint unavailable: {}", body)),
        500..=599 => Error::inference(format!("Server error ({}): {}", status, body)),
        _ => Error::inference(format!("HTTP error {}: {}", status, body)),
    }
}
