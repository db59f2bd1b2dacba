//! Gnosis Core Library
//!
//! This crate provides the core of Gnosis, a semantic mind-mapping engine:
//! - Embedding gateway (Voyage AI, deterministic mock)
//! - Concept index (Qdrant REST, in-memory)
//! - Similarity routing between a topic and existing context
//! - Graph generation through an OpenAI-compatible chat model
//! - Expansion workflows (seed, expand, check similarity, health)
//! - Configuration with environment-only secrets

pub mod config;
pub mod embedding;
pub mod error;
pub mod expansion;
pub mod graph;
pub mod index;
pub mod llm;
pub mod services;
pub mod similarity;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::embedding::{EmbeddingGateway, EmbeddingMode};
    pub use crate::error::{Error, Result};
    pub use crate::expansion::{ExpansionService, HealthReport, HealthStatus};
    pub use crate::graph::{ConceptEdge, ConceptNode, ExpansionResult, NodeType, SeedResult};
    pub use crate::index::ConceptIndex;
    pub use crate::services::Services;
    pub use crate::similarity::{SimilarityResult, SuggestedAction};
}

#[cfg(test)]
mod llm_tests;
