//! ConceptIndex trait definition
//!
//! Abstracts over vector index backends (Qdrant, in-memory).

use async_trait::async_trait;

use crate::embedding::EmbeddingVector;
use crate::error::{Error, Result};

use super::types::{ConceptMetadata, NewConcept, ScoredConcept};

/// Vector-searchable store of previously seen concepts
///
/// Records are append-only: `upsert` always inserts a fresh record and there
/// is no update-by-label. Every fallible operation reports
/// [`Error::VectorStore`]; a failed search returns no results.
#[async_trait]
pub trait ConceptIndex: Send + Sync {
    /// Create the backing collection if it does not exist yet.
    ///
    /// Idempotent and safe to call concurrently.
    async fn ensure_ready(&self) -> Result<()>;

    /// Nearest neighbors of `vector`, best first, at most `limit` hits.
    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredConcept>>;

    /// Insert every record in one request, returning their new ids in order.
    ///
    /// Either all records are written or the call fails.
    async fn upsert_batch(&self, concepts: Vec<NewConcept>) -> Result<Vec<String>>;

    /// Insert a single record and return its new id.
    async fn upsert(
        &self,
        label: &str,
        vector: EmbeddingVector,
        metadata: ConceptMetadata,
    ) -> Result<String> {
        self.upsert_batch(vec![NewConcept::new(label, vector, metadata)])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::vector_store("Failed to store concept: no id returned"))
    }

    /// True iff the backing store answers a trivial read.
    async fn health_check(&self) -> bool;
}

/// Reject non-positive search limits
pub(crate) fn check_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidInput(
            "search limit must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
