//! Concept index
//!
//! A vector-searchable store of previously seen concepts. Two backends:
//! [`QdrantIndex`] over the Qdrant REST API and [`InMemoryConceptIndex`]
//! for offline runs.

mod memory;
mod qdrant;
mod store;
mod types;

pub use memory::InMemoryConceptIndex;
pub use qdrant::QdrantIndex;
pub use store::ConceptIndex;
pub use types::{ConceptMetadata, ConceptPayload, NewConcept, ScoredConcept, StoredConcept};

/// Number of neighbors retrieved before an expansion
pub const RETRIEVAL_LIMIT: usize = 10;
