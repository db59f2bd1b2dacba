//! Embedding types and the Voyage wire format

use serde::{Deserialize, Serialize};

/// Fixed-dimension vector produced by the embedding gateway
pub type EmbeddingVector = Vec<f32>;

/// Embedding mode forwarded to the provider as `input_type`
///
/// Providers may tune nearest-neighbor geometry per mode, so query and
/// document embeddings of the same text are not required to be equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Text that will be stored and searched against
    Document,
    /// Text used to search
    Query,
}

impl EmbeddingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingMode::Document => "document",
            EmbeddingMode::Query => "query",
        }
    }
}

impl std::fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body for the embeddings endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    /// Input texts, embedded in order
    pub input: Vec<String>,
    /// Model identifier (e.g., "voyage-3")
    pub model: String,
    /// Embedding mode
    pub input_type: EmbeddingMode,
}

/// A single embedding from the API response
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    /// Index of this embedding in the batch
    pub index: usize,
    /// The embedding vector
    pub embedding: Vec<f32>,
}

/// Usage information for embeddings
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response from the embeddings API
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    /// List of embeddings
    pub data: Vec<EmbeddingData>,
    /// Model used for the embeddings
    #[serde(default)]
    pub model: Option<String>,
    /// Token usage information
    pub usage: Option<EmbeddingUsage>,
}
