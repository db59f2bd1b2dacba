//! Error types for Gnosis

use thiserror::Error;

/// Result type alias using Gnosis' Error
pub type Result<T> = std::result::Result<T, Error>;

/// Machine-readable error codes
pub mod codes {
    pub const EMBEDDING_FAILED: &str = "EMBEDDING_FAILED";
    pub const VECTOR_STORE_INIT_FAILED: &str = "VECTOR_STORE_INIT_FAILED";
    pub const VECTOR_SEARCH_FAILED: &str = "VECTOR_SEARCH_FAILED";
    pub const VECTOR_STORE_FAILED: &str = "VECTOR_STORE_FAILED";
    pub const INFERENCE_FAILED: &str = "INFERENCE_FAILED";
    pub const INVALID_INPUT: &str = "INVALID_INPUT";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Gnosis error types
///
/// The three service kinds (`Embedding`, `VectorStore`, `Inference`) are never
/// retried inside the core; they propagate unchanged to the workflow boundary.
#[derive(Error, Debug)]
pub enum Error {
    // Service errors
    #[error("{message}")]
    Embedding { message: String, code: &'static str },

    #[error("{message}")]
    VectorStore { message: String, code: &'static str },

    #[error("{message}")]
    Inference { message: String, code: &'static str },

    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Config errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Embedding provider failure
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: codes::EMBEDDING_FAILED,
        }
    }

    /// Collection bootstrap failure
    pub fn vector_store_init(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
            code: codes::VECTOR_STORE_INIT_FAILED,
        }
    }

    /// Nearest-neighbor query failure
    pub fn vector_search(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
            code: codes::VECTOR_SEARCH_FAILED,
        }
    }

    /// Write failure
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
            code: codes::VECTOR_STORE_FAILED,
        }
    }

    /// Generative model failure
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
            code: codes::INFERENCE_FAILED,
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Embedding { code, .. }
            | Self::VectorStore { code, .. }
            | Self::Inference { code, .. } => code,
            Self::InvalidInput(_) => codes::INVALID_INPUT,
            Self::ConfigError(_) => codes::CONFIG_ERROR,
        }
    }

    /// Whether the error belongs to the "service unavailable" class
    pub fn is_service_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Embedding { .. } | Self::VectorStore { .. } | Self::Inference { .. }
        )
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Embedding { .. } => {
                Some("Check VOYAGE_API_KEY and run `gnosis health`".to_string())
            }
            Self::VectorStore { .. } => {
                Some("Check that Qdrant is reachable with `gnosis health`".to_string())
            }
            Self::Inference { .. } => Some("Check CEREBRAS_API_KEY and retry".to_string()),
            Self::ConfigError(_) => Some("gnosis config list".to_string()),
            Self::InvalidInput(_) => None,
        }
    }
}
