//! Concept graph types and expansion
//!
//! Nodes and edges returned to callers, plus the [`GraphGenerator`] that
//! asks a generative model for new concepts around a topic.

mod generator;
mod types;

pub use generator::{GraphGenerator, MAX_EXPANSIONS};
pub use types::{
    ConceptEdge, ConceptNode, ExpansionResult, MAX_EDGE_LABEL_LEN, MAX_LABEL_LEN,
    MAX_NODE_ID_LEN, MAX_REASON_LEN, NodeType, SeedResult, derive_node_id,
};
