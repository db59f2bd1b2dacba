//! Deterministic embedding gateway for tests and offline runs
//!
//! Texts registered with [`MockEmbeddingGateway::with_vector`] map to their
//! fixed vectors; every other text is hashed into a unit vector, so the same
//! text always yields the same embedding.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::gateway::EmbeddingGateway;
use super::types::{EmbeddingMode, EmbeddingVector};

/// Deterministic mock embedding gateway.
#[derive(Debug)]
pub struct MockEmbeddingGateway {
    dimension: usize,
    fixed: HashMap<String, EmbeddingVector>,
    fail: bool,
    calls: Mutex<Vec<(Vec<String>, EmbeddingMode)>>,
}

impl MockEmbeddingGateway {
    /// Create a mock producing vectors of `dimension` floats
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fixed: HashMap::new(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Pin the vector returned for `text`
    pub fn with_vector(mut self, text: impl Into<String>, vector: EmbeddingVector) -> Self {
        self.fixed.insert(text.into(), vector);
        self
    }

    /// Make every call fail with an embedding error
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Every batch seen so far, with its mode
    pub fn calls(&self) -> Vec<(Vec<String>, EmbeddingMode)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn hash_to_embedding(&self, text: &str) -> EmbeddingVector {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut hash = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            let value = (hash as f64 / u64::MAX as f64) * 2.0 - 1.0;
            embedding.push(value as f32);

            let mut h = DefaultHasher::new();
            hash.hash(&mut h);
            hash = h.finish();
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingGateway for MockEmbeddingGateway {
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> Result<Vec<EmbeddingVector>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((texts.to_vec(), mode));
        }

        if self.fail {
            return Err(Error::embedding(
                "Failed to generate embeddings: provider unavailable",
            ));
        }

        Ok(texts
            .iter()
            .map(|t| {
                self.fixed
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| self.hash_to_embedding(t))
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-hash-embedding"
    }
}
