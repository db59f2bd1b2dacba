//! Embedding gateway
//!
//! Architecture follows the trait + impl + mock pattern:
//! - `EmbeddingGateway` trait: async, batched, mode-aware embedding
//! - `VoyageClient`: HTTP implementation for the Voyage AI API
//! - `MockEmbeddingGateway`: deterministic gateway for tests and offline runs

mod gateway;
mod mock;
mod types;
mod voyage;

pub use gateway::{EmbeddingGateway, validate_batch};
pub use mock::MockEmbeddingGateway;
pub use types::{
    EmbeddingData, EmbeddingMode, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
    EmbeddingVector,
};
pub use voyage::VoyageClient;
