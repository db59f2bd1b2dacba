//! Qdrant concept index over the REST API
//!
//! Endpoints used:
//! - `GET /collections` (existence check, health)
//! - `PUT /collections/{name}` (cosine collection at the embedding dimension)
//! - `POST /collections/{name}/points/query` (nearest neighbors)
//! - `PUT /collections/{name}/points?wait=true` (batched insert)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::VectorStoreConfig;
use crate::error::{Error, Result};

use super::store::{ConceptIndex, check_limit};
use super::types::{ConceptPayload, NewConcept, ScoredConcept};

/// Qdrant-backed concept index
///
/// Cheap to clone and safe to share across concurrent requests.
#[derive(Clone)]
pub struct QdrantIndex {
    http_client: HttpClient,
    url: String,
    collection: String,
    api_key: Option<String>,
    dimension: usize,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("url", &self.url)
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .finish()
    }
}

/// Qdrant wraps every answer in `{"result": ..., "status": ...}`
#[derive(Debug, Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionsResult {
    collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Debug, Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<PointStruct>,
}

#[derive(Debug, Serialize)]
struct PointStruct {
    id: String,
    vector: Vec<f32>,
    payload: ConceptPayload,
}

impl QdrantIndex {
    /// Create an index handle; no request is made until first use
    pub fn new(
        config: &VectorStoreConfig,
        api_key: Option<String>,
        dimension: usize,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            api_key,
            dimension,
        })
    }

    /// Name of the backing collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http_client
            .request(method, format!("{}{}", self.url, path));
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    async fn list_collections(&self) -> std::result::Result<Vec<String>, String> {
        let response = self
            .request(reqwest::Method::GET, "/collections")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }

        let parsed: QdrantResponse<CollectionsResult> =
            response.json().await.map_err(|e| e.to_string())?;
        Ok(parsed
            .result
            .collections
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    async fn create_collection(&self) -> std::result::Result<(), String> {
        let body = CreateCollection {
            vectors: VectorParams {
                size: self.dimension,
                distance: "Cosine",
            },
        };

        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}", self.collection),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        // A concurrent creator won the race
        if status == reqwest::StatusCode::CONFLICT {
            debug!(collection = %self.collection, "Collection already exists");
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {}: {}", status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl ConceptIndex for QdrantIndex {
    async fn ensure_ready(&self) -> Result<()> {
        let existing = self.list_collections().await.map_err(|e| {
            error!(error = %e, "Failed to ensure collection");
            Error::vector_store_init(format!("Failed to initialize vector store: {}", e))
        })?;

        if existing.iter().any(|name| name == &self.collection) {
            return Ok(());
        }

        info!(collection = %self.collection, dimension = self.dimension, "Creating collection");
        self.create_collection().await.map_err(|e| {
            error!(error = %e, "Failed to create collection");
            Error::vector_store_init(format!("Failed to initialize vector store: {}", e))
        })
    }

    async fn search(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredConcept>> {
        check_limit(limit)?;
        debug!(limit, "Searching for similar concepts");

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/collections/{}/points/query", self.collection),
            )
            .json(&QueryRequest {
                query: vector,
                limit,
                with_payload: true,
            })
            .send()
            .await
            .map_err(|e| Error::vector_search(format!("Failed to search similar concepts: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_search(format!(
                "Failed to search similar concepts: HTTP {}: {}",
                status, body
            )));
        }

        let parsed: QdrantResponse<QueryResult> = response.json().await.map_err(|e| {
            Error::vector_search(format!("Failed to search similar concepts: {}", e))
        })?;

        let mut hits: Vec<ScoredConcept> = parsed
            .result
            .points
            .into_iter()
            .map(|point| ScoredConcept {
                id: point_id_to_string(&point.id),
                label: point
                    .payload
                    .as_ref()
                    .and_then(|p| p.get("label"))
                    .and_then(|l| l.as_str())
                    .unwrap_or_default()
                    .to_string(),
                score: point.score,
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn upsert_batch(&self, concepts: Vec<NewConcept>) -> Result<Vec<String>> {
        if concepts.is_empty() {
            return Ok(Vec::new());
        }

        let points: Vec<PointStruct> = concepts
            .into_iter()
            .map(|c| PointStruct {
                id: Uuid::new_v4().to_string(),
                payload: ConceptPayload::new(c.label, c.metadata),
                vector: c.vector,
            })
            .collect();
        let ids: Vec<String> = points.iter().map(|p| p.id.clone()).collect();

        debug!(count = points.len(), "Storing concepts");

        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/collections/{}/points?wait=true", self.collection),
            )
            .json(&UpsertRequest { points })
            .send()
            .await
            .map_err(|e| Error::vector_store(format!("Failed to store concept: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Failed to store concepts");
            return Err(Error::vector_store(format!(
                "Failed to store concept: HTTP {}: {}",
                status, body
            )));
        }

        Ok(ids)
    }

    async fn health_check(&self) -> bool {
        self.list_collections().await.is_ok()
    }
}

/// Qdrant point ids are either UUID strings or unsigned integers
fn point_id_to_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_to_string() {
        assert_eq!(
            point_id_to_string(&serde_json::json!("0b9a6f3e-1111-4d2a-9c1e-0123456789ab")),
            "0b9a6f3e-1111-4d2a-9c1e-0123456789ab"
        );
        assert_eq!(point_id_to_string(&serde_json::json!(42)), "42");
    }

    #[test]
    fn test_create_collection_body() {
        let body = CreateCollection {
            vectors: VectorParams {
                size: 1024,
                distance: "Cosine",
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"vectors": {"size": 1024, "distance": "Cosine"}})
        );
    }

    #[test]
    fn test_debug_omits_api_key() {
        let index = QdrantIndex::new(
            &VectorStoreConfig::default(),
            Some("qdrant-secret".to_string()),
            1024,
        )
        .unwrap();
        let debug = format!("{:?}", index);
        assert!(debug.contains("gnosis_concepts"));
        assert!(!debug.contains("qdrant-secret"));
    }
}
