//! Graph node and edge types

use serde::{Deserialize, Serialize};

/// Maximum node id length
pub const MAX_NODE_ID_LEN: usize = 100;
/// Maximum node label length
pub const MAX_LABEL_LEN: usize = 200;
/// Maximum relevance reason length
pub const MAX_REASON_LEN: usize = 500;
/// Maximum edge label length
pub const MAX_EDGE_LABEL_LEN: usize = 100;

/// Origin of a concept node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Seeded by the user
    Root,
    /// Proposed by the generative model
    Generated,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Root => "root",
            NodeType::Generated => "generated",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the concept graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptNode {
    /// Kebab-case identifier
    pub id: String,
    /// Human-readable label
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Why this concept relates to its anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ConceptNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            node_type,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// A directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptEdge {
    pub source: String,
    pub target: String,
    /// Relationship description (e.g. "is part of")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ConceptEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Output of one expansion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionResult {
    pub nodes: Vec<ConceptNode>,
    pub edges: Vec<ConceptEdge>,
    pub reasoning: String,
}

/// Output of seeding a root concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedResult {
    pub node: ConceptNode,
    pub reasoning: String,
}

/// Derive a kebab-case node id from a topic
///
/// Lower-cases the topic and replaces spaces and underscores with hyphens.
/// `"Quantum Computing"` and `"quantum_computing"` both become
/// `"quantum-computing"`.
pub fn derive_node_id(topic: &str) -> String {
    topic.to_lowercase().replace([' ', '_'], "-")
}

/// Truncate to at most `max` characters on a char boundary
pub(crate) fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
