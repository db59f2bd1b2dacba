//! Concept index records

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingVector;
use crate::graph::NodeType;

/// A nearest-neighbor hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredConcept {
    /// Store record id (not the graph node id)
    pub id: String,
    pub label: String,
    pub score: f32,
}

/// Metadata stored alongside a concept vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMetadata {
    pub reason: Option<String>,
    pub node_type: NodeType,
    /// Graph node id the record was written for
    pub node_id: Option<String>,
}

impl ConceptMetadata {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            reason: None,
            node_type,
            node_id: None,
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }
}

/// A concept waiting to be written
#[derive(Debug, Clone)]
pub struct NewConcept {
    pub label: String,
    pub vector: EmbeddingVector,
    pub metadata: ConceptMetadata,
}

impl NewConcept {
    pub fn new(label: impl Into<String>, vector: EmbeddingVector, metadata: ConceptMetadata) -> Self {
        Self {
            label: label.into(),
            vector,
            metadata,
        }
    }
}

/// Payload persisted with every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptPayload {
    pub label: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
}

impl ConceptPayload {
    pub fn new(label: impl Into<String>, metadata: ConceptMetadata) -> Self {
        Self {
            label: label.into(),
            reason: metadata.reason,
            node_type: metadata.node_type,
            node_id: metadata.node_id,
        }
    }
}

/// A record owned by the concept index
#[derive(Debug, Clone, PartialEq)]
pub struct StoredConcept {
    /// Server-generated UUID v4
    pub id: String,
    pub vector: EmbeddingVector,
    pub payload: ConceptPayload,
}
