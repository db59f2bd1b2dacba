//! In-process concept index
//!
//! Brute-force cosine search over an append-only list. Used for `--local`
//! runs and tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::similarity::cosine_similarity;

use super::store::{ConceptIndex, check_limit};
use super::types::{ConceptPayload, NewConcept, ScoredConcept, StoredConcept};

/// Concept index held entirely in memory
#[derive(Debug)]
pub struct InMemoryConceptIndex {
    dimension: usize,
    records: RwLock<Vec<StoredConcept>>,
}

impl InMemoryConceptIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of every stored record, in insertion order
    pub async fn records(&self) -> Vec<StoredConcept> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConceptIndex for InMemoryConceptIndex {
    async fn ensure_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredConcept>> {
        check_limit(limit)?;
        if vector.len() != self.dimension {
            return Err(Error::vector_search(format!(
                "Failed to search similar concepts: dimension mismatch (expected {}, got {})",
                self.dimension,
                vector.len()
            )));
        }

        let records = self.records.read().await;
        let mut hits: Vec<ScoredConcept> = records
            .iter()
            .map(|r| ScoredConcept {
                id: r.id.clone(),
                label: r.payload.label.clone(),
                score: cosine_similarity(vector, &r.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        debug!(hits = hits.len(), total = records.len(), "In-memory search");
        Ok(hits)
    }

    async fn upsert_batch(&self, concepts: Vec<NewConcept>) -> Result<Vec<String>> {
        // Validate the whole batch before taking the write lock
        if let Some(bad) = concepts.iter().find(|c| c.vector.len() != self.dimension) {
            return Err(Error::vector_store(format!(
                "Failed to store concept '{}': dimension mismatch (expected {}, got {})",
                bad.label,
                self.dimension,
                bad.vector.len()
            )));
        }

        let mut records = self.records.write().await;
        let mut ids = Vec::with_capacity(concepts.len());
        for concept in concepts {
            let id = Uuid::new_v4().to_string();
            records.push(StoredConcept {
                id: id.clone(),
                payload: ConceptPayload::new(concept.label, concept.metadata),
                vector: concept.vector,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn health_check(&self) -> bool {
        true
    }
}
