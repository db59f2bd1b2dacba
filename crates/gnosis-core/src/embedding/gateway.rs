//! EmbeddingGateway trait definition

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::{EmbeddingMode, EmbeddingVector};

/// Converts text into fixed-dimension vectors.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// requests as `Arc<dyn EmbeddingGateway>`. Failures surface immediately as
/// [`Error::Embedding`]; nothing is retried.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    /// Embed `texts` in `mode`, one vector per text, in input order.
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> Result<Vec<EmbeddingVector>>;

    /// Embed a single text as a one-item batch.
    async fn embed_one(&self, text: &str, mode: EmbeddingMode) -> Result<EmbeddingVector> {
        self.embed(&[text.to_string()], mode)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("Embedding provider returned no vectors"))
    }

    /// Dimension of every vector this gateway produces.
    fn dimension(&self) -> usize;

    /// Name of the embedding model, for logging.
    fn model_name(&self) -> &str;
}

/// Check a provider batch against the request that produced it.
pub fn validate_batch(
    expected: usize,
    dimension: usize,
    vectors: Vec<EmbeddingVector>,
) -> Result<Vec<EmbeddingVector>> {
    if vectors.is_empty() {
        return Err(Error::embedding(
            "Failed to generate embeddings: provider returned an empty vector list",
        ));
    }

    if vectors.len() != expected {
        return Err(Error::embedding(format!(
            "Failed to generate embeddings: expected {} vectors, got {}",
            expected,
            vectors.len()
        )));
    }

    if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dimension) {
        return Err(Error::embedding(format!(
            "Failed to generate embeddings: dimension mismatch at index {}: expected {}, got {}",
            i,
            dimension,
            v.len()
        )));
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_batch_accepts_matching() {
        let vectors = vec![vec![0.0; 4], vec![1.0; 4]];
        assert_eq!(validate_batch(2, 4, vectors).unwrap().len(), 2);
    }

    #[test]
    fn test_validate_batch_rejects_empty() {
        let err = validate_batch(1, 4, vec![]).unwrap_err();
        assert_eq!(err.code(), "EMBEDDING_FAILED");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_validate_batch_rejects_count_mismatch() {
        let err = validate_batch(3, 4, vec![vec![0.0; 4]]).unwrap_err();
        assert!(err.to_string().contains("expected 3 vectors, got 1"));
    }

    #[test]
    fn test_validate_batch_rejects_dimension_mismatch() {
        let err = validate_batch(2, 4, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }
}
