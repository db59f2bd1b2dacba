//! Expansion workflows
//!
//! Composes the embedding gateway, concept index, graph generator and
//! similarity router into the four user-facing operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::embedding::{EmbeddingGateway, EmbeddingMode};
use crate::error::{Error, Result};
use crate::graph::{ConceptNode, ExpansionResult, GraphGenerator, NodeType, SeedResult};
use crate::index::{ConceptIndex, ConceptMetadata, NewConcept, RETRIEVAL_LIMIT};
use crate::similarity::{self, SimilarityResult};

use super::health::{EMBEDDING_SERVICE, HealthReport, VECTOR_STORE_SERVICE};
use super::validator::InputValidator;

/// Reason recorded on every seeded root node
pub const SEED_REASON: &str = "User-provided seed topic";

/// Text embedded by the embedding health probe
const HEALTH_PROBE_TEXT: &str = "health check";

/// User-facing expansion workflows
///
/// Holds shared handles only; one instance serves any number of concurrent
/// requests.
#[derive(Clone)]
pub struct ExpansionService {
    embedder: Arc<dyn EmbeddingGateway>,
    index: Arc<dyn ConceptIndex>,
    generator: Option<GraphGenerator>,
}

impl ExpansionService {
    /// Create a service that can seed, check similarity and report health
    pub fn new(embedder: Arc<dyn EmbeddingGateway>, index: Arc<dyn ConceptIndex>) -> Self {
        Self {
            embedder,
            index,
            generator: None,
        }
    }

    /// Enable expansion
    pub fn with_generator(mut self, generator: GraphGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Make sure the concept index can accept writes
    pub async fn ensure_ready(&self) -> Result<()> {
        self.index.ensure_ready().await
    }

    /// Create and persist a root node for `topic`
    pub async fn seed(&self, topic: &str) -> Result<SeedResult> {
        InputValidator::validate_topic(topic)?;
        let node_id = InputValidator::derived_node_id(topic)?;
        info!(topic, "Seeding topic");

        let result = self.seed_inner(topic, node_id).await;
        if let Err(e) = &result {
            error!(topic, code = e.code(), error = %e, "Seed failed");
        }
        result
    }

    async fn seed_inner(&self, topic: &str, node_id: String) -> Result<SeedResult> {
        let node = ConceptNode::new(node_id, topic, NodeType::Root)
            .with_reason(SEED_REASON);

        let vector = self.embedder.embed_one(topic, EmbeddingMode::Document).await?;

        let metadata = ConceptMetadata::new(NodeType::Root)
            .with_reason(node.reason.clone())
            .with_node_id(node.id.clone());
        self.index.upsert(topic, vector, metadata).await?;

        info!(topic, node_id = %node.id, "Seeded topic");
        Ok(SeedResult {
            node,
            reasoning: format!(
                "Created root node for '{}' and stored in vector database.",
                topic
            ),
        })
    }

    /// Generate and persist `num_expansions` concepts related to `topic`
    ///
    /// Either every generated node is persisted or none is.
    pub async fn expand(
        &self,
        topic: &str,
        context: &[String],
        num_expansions: usize,
        source_node_id: Option<&str>,
    ) -> Result<ExpansionResult> {
        InputValidator::validate_topic(topic)?;
        InputValidator::validate_context(context, 0)?;
        InputValidator::validate_num_expansions(num_expansions)?;
        match source_node_id {
            Some(id) => InputValidator::validate_source_node_id(id)?,
            None => {
                InputValidator::derived_node_id(topic)?;
            }
        }

        let generator = self.generator.as_ref().ok_or_else(|| {
            Error::ConfigError(
                "expansion needs a generative model; set CEREBRAS_API_KEY".to_string(),
            )
        })?;

        info!(topic, num_expansions, "Expanding topic");

        let result = self
            .expand_inner(generator, topic, context, num_expansions, source_node_id)
            .await;
        if let Err(e) = &result {
            error!(topic, code = e.code(), error = %e, "Expansion failed");
        }
        result
    }

    async fn expand_inner(
        &self,
        generator: &GraphGenerator,
        topic: &str,
        context: &[String],
        num_expansions: usize,
        source_node_id: Option<&str>,
    ) -> Result<ExpansionResult> {
        let query = self.embedder.embed_one(topic, EmbeddingMode::Query).await?;
        let retrieved = self.index.search(&query, RETRIEVAL_LIMIT).await?;

        let result = generator
            .expand(topic, context, &retrieved, num_expansions, source_node_id)
            .await?;

        let mut batch = Vec::with_capacity(result.nodes.len());
        for node in &result.nodes {
            let vector = self
                .embedder
                .embed_one(&node.label, EmbeddingMode::Query)
                .await?;
            let metadata = ConceptMetadata::new(node.node_type)
                .with_reason(node.reason.clone())
                .with_node_id(node.id.clone());
            batch.push(NewConcept::new(node.label.clone(), vector, metadata));
        }
        self.index.upsert_batch(batch).await?;

        info!(
            topic,
            nodes = result.nodes.len(),
            retrieved = retrieved.len(),
            "Expanded topic"
        );
        Ok(result)
    }

    /// Decide whether `topic` belongs with `context` or starts a new graph
    pub async fn check_similarity(
        &self,
        topic: &str,
        context: &[String],
        threshold: f32,
    ) -> Result<SimilarityResult> {
        InputValidator::validate_topic(topic)?;
        InputValidator::validate_context(context, 1)?;
        similarity::check_threshold(threshold)?;

        let result = self.check_similarity_inner(topic, context, threshold).await;
        if let Err(e) = &result {
            error!(topic, code = e.code(), error = %e, "Similarity check failed");
        }
        result
    }

    async fn check_similarity_inner(
        &self,
        topic: &str,
        context: &[String],
        threshold: f32,
    ) -> Result<SimilarityResult> {
        let query = self.embedder.embed_one(topic, EmbeddingMode::Query).await?;
        let vectors = self.embedder.embed(context, EmbeddingMode::Document).await?;

        let labelled: Vec<(String, Vec<f32>)> = context.iter().cloned().zip(vectors).collect();
        let result = similarity::route(&query, &labelled, threshold)?;

        info!(
            topic,
            score = result.similarity_score,
            related = result.is_related,
            action = %result.suggested_action,
            closest = ?result.closest_match,
            "Similarity check"
        );
        Ok(result)
    }

    /// Probe every dependency; never fails
    pub async fn health(&self) -> HealthReport {
        let embedding_up = match self
            .embedder
            .embed_one(HEALTH_PROBE_TEXT, EmbeddingMode::Query)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "Embedding health probe failed");
                false
            }
        };
        let index_up = self.index.health_check().await;

        HealthReport::from_services(BTreeMap::from([
            (EMBEDDING_SERVICE.to_string(), embedding_up),
            (VECTOR_STORE_SERVICE.to_string(), index_up),
        ]))
    }
}
