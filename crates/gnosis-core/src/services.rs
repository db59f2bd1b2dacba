//! Process-scoped service container
//!
//! Builds one handle per external client from configuration at startup.
//! Handles are shared through `Arc` by every workflow call.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{CEREBRAS_API_KEY_VAR, Config, VOYAGE_API_KEY_VAR};
use crate::embedding::{EmbeddingGateway, MockEmbeddingGateway, VoyageClient};
use crate::error::{Error, Result};
use crate::expansion::ExpansionService;
use crate::graph::GraphGenerator;
use crate::index::{ConceptIndex, InMemoryConceptIndex, QdrantIndex};
use crate::llm::{GenerativeModel, LlmClient};

/// Shared client handles
#[derive(Clone)]
pub struct Services {
    pub embedder: Arc<dyn EmbeddingGateway>,
    pub index: Arc<dyn ConceptIndex>,
    /// Absent when no generative model key is configured
    pub model: Option<Arc<dyn GenerativeModel>>,
}

impl Services {
    /// Assemble services from explicit handles
    pub fn new(
        embedder: Arc<dyn EmbeddingGateway>,
        index: Arc<dyn ConceptIndex>,
        model: Option<Arc<dyn GenerativeModel>>,
    ) -> Self {
        Self {
            embedder,
            index,
            model,
        }
    }

    /// Connect to the configured Voyage, Qdrant and Cerebras endpoints
    pub fn from_config(config: &Config) -> Result<Self> {
        let voyage_key = config
            .embedding
            .resolved_api_key()
            .map_err(config_error)?
            .ok_or_else(|| {
                Error::ConfigError(format!("{} is not set", VOYAGE_API_KEY_VAR))
            })?;
        let embedder = VoyageClient::new(&config.embedding, voyage_key)?;
        info!(model = %config.embedding.model, "Initialized embedding client");

        let qdrant_key = config
            .vector_store
            .resolved_api_key()
            .map_err(config_error)?;
        let index = QdrantIndex::new(
            &config.vector_store,
            qdrant_key,
            config.embedding.dimension,
        )?;
        info!(url = %config.vector_store.url, collection = %config.vector_store.collection, "Initialized vector store client");

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(index),
            Self::model_from_config(config)?,
        ))
    }

    /// Offline services: hashing embedder and in-memory index
    ///
    /// The generative model is still remote and only built when its key is
    /// present.
    pub fn local(config: &Config) -> Result<Self> {
        info!(dimension = config.embedding.dimension, "Using local services");
        Ok(Self::new(
            Arc::new(MockEmbeddingGateway::new(config.embedding.dimension)),
            Arc::new(InMemoryConceptIndex::new(config.embedding.dimension)),
            Self::model_from_config(config)?,
        ))
    }

    fn model_from_config(config: &Config) -> Result<Option<Arc<dyn GenerativeModel>>> {
        match config.llm.resolved_api_key().map_err(config_error)? {
            Some(key) => {
                let client = LlmClient::new(config.llm.clone(), key)?;
                info!(model = %client.model(), "Initialized LLM client");
                let model: Arc<dyn GenerativeModel> = Arc::new(client);
                Ok(Some(model))
            }
            None => {
                debug!("{} not set, expansion disabled", CEREBRAS_API_KEY_VAR);
                Ok(None)
            }
        }
    }

    /// Workflow facade over these handles
    pub fn expansion_service(&self) -> ExpansionService {
        let service = ExpansionService::new(self.embedder.clone(), self.index.clone());
        match &self.model {
            Some(model) => service.with_generator(GraphGenerator::new(model.clone())),
            None => service,
        }
    }
}

fn config_error(e: anyhow::Error) -> Error {
    Error::ConfigError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_services_report_healthy() {
        let services = Services::new(
            Arc::new(MockEmbeddingGateway::new(8)),
            Arc::new(InMemoryConceptIndex::new(8)),
            None,
        );
        let report = services.expansion_service().health().await;
        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn test_expand_without_model_is_config_error() {
        let services = Services::new(
            Arc::new(MockEmbeddingGateway::new(8)),
            Arc::new(InMemoryConceptIndex::new(8)),
            None,
        );
        let err = services
            .expansion_service()
            .expand("Philosophy", &[], 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
