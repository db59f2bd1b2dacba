//! Concept expansion using a generative model
//!
//! Asks the model for new concept nodes around a topic, validates the
//! structured answer and pins every edge to the expansion anchor.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::index::ScoredConcept;
use crate::llm::{GenerativeModel, Message, ResponseFormat};

use super::types::{
    ConceptEdge, ConceptNode, ExpansionResult, MAX_EDGE_LABEL_LEN, MAX_LABEL_LEN,
    MAX_NODE_ID_LEN, MAX_REASON_LEN, NodeType, derive_node_id, truncate_chars,
};

/// Largest number of nodes one expansion may request
pub const MAX_EXPANSIONS: usize = 20;

/// Retrieved labels shown to the model
const MAX_RETRIEVED_IN_PROMPT: usize = 5;

/// Generates new graph nodes and edges for a topic
#[derive(Clone)]
pub struct GraphGenerator {
    model: Arc<dyn GenerativeModel>,
}

impl GraphGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Propose `count` new concepts related to `topic`
    ///
    /// Every edge in the result has `anchor_id` as its source, or the id
    /// derived from `topic` when no anchor is given.
    pub async fn expand(
        &self,
        topic: &str,
        context: &[String],
        retrieved: &[ScoredConcept],
        count: usize,
        anchor_id: Option<&str>,
    ) -> Result<ExpansionResult> {
        if !(1..=MAX_EXPANSIONS).contains(&count) {
            return Err(Error::InvalidInput(format!(
                "num_expansions must be between 1 and {}, got {}",
                MAX_EXPANSIONS, count
            )));
        }

        let anchor = match anchor_id {
            Some(id) => id.to_string(),
            None => derive_node_id(topic),
        };
        if anchor.is_empty() || anchor.chars().count() > MAX_NODE_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "anchor node id must be 1 to {} characters",
                MAX_NODE_ID_LEN
            )));
        }

        debug!(
            topic,
            count,
            anchor = %anchor,
            model = self.model.model_name(),
            "Expanding topic"
        );

        let messages = vec![
            Message::system(EXPANSION_SYSTEM_PROMPT),
            Message::user(build_expansion_prompt(topic, context, retrieved, count, &anchor)),
        ];

        let response = self
            .model
            .generate(
                messages,
                Some(ResponseFormat::json_schema("expansion", expansion_schema())),
            )
            .await
            .map_err(|e| match e {
                Error::Inference { .. } => e,
                other => Error::inference(format!("Failed to expand topic: {}", other)),
            })?;

        let result = parse_expansion_response(&response.content, count, &anchor)?;

        info!(
            topic,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            "Generated expansion"
        );

        Ok(result)
    }
}

fn build_expansion_prompt(
    topic: &str,
    context: &[String],
    retrieved: &[ScoredConcept],
    count: usize,
    anchor: &str,
) -> String {
    let context_str = if context.is_empty() {
        "none".to_string()
    } else {
        context.join(", ")
    };

    let similar_str = if retrieved.is_empty() {
        "none yet".to_string()
    } else {
        retrieved
            .iter()
            .take(MAX_RETRIEVED_IN_PROMPT)
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"Expand this topic into new related concepts.

Topic to expand: {topic}
Current context/path: {context}
Similar concepts already in the graph: {similar}

Generate exactly {count} new, diverse concepts related to this topic. Each concept should:
1. Be genuinely connected to the topic
2. Not duplicate existing similar concepts
3. Cover a different aspect of the topic
4. Be specific enough to be interesting but general enough to expand further

For each node:
- id: a unique kebab-case identifier
- label: a human-readable label (2-4 words)
- type: "generated"
- reason: a brief explanation of how this concept relates to the topic

For each edge:
- source: exactly "{anchor}"
- target: the new node's id
- label: the relationship (e.g. "relates to", "is part of", "enables")

All edges must have source="{anchor}".

Also give overall reasoning for your choices.

Return JSON:
{{
    "nodes": [{{"id": "...", "label": "...", "type": "generated", "reason": "..."}}],
    "edges": [{{"source": "{anchor}", "target": "...", "label": "..."}}],
    "reasoning": "..."
}}"#,
        topic = topic,
        context = context_str,
        similar = similar_str,
        count = count,
        anchor = anchor,
    )
}

/// JSON schema the model output is constrained to
fn expansion_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "nodes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "label": {"type": "string"},
                        "type": {"type": "string", "enum": ["generated"]},
                        "reason": {"type": "string"}
                    },
                    "required": ["id", "label", "type", "reason"],
                    "additionalProperties": false
                }
            },
            "edges": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "source": {"type": "string"},
                        "target": {"type": "string"},
                        "label": {"type": "string"}
                    },
                    "required": ["source", "target", "label"],
                    "additionalProperties": false
                }
            },
            "reasoning": {"type": "string"}
        },
        "required": ["nodes", "edges", "reasoning"],
        "additionalProperties": false
    })
}

/// Raw model output before validation
#[derive(Debug, Deserialize)]
struct ModelExpansion {
    nodes: Vec<ModelNode>,
    #[serde(default)]
    edges: Vec<ModelEdge>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
struct ModelNode {
    #[serde(default)]
    id: String,
    #[serde(default)]
    label: String,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelEdge {
    #[serde(default)]
    source: Option<String>,
    target: String,
    #[serde(default)]
    label: Option<String>,
}

/// Validate model output and enforce the anchor as the only edge source
fn parse_expansion_response(response: &str, count: usize, anchor: &str) -> Result<ExpansionResult> {
    let json_str = extract_json_from_response(response);

    let raw: ModelExpansion = serde_json::from_str(&json_str).map_err(|e| {
        warn!(error = %e, "Failed to parse expansion response as JSON");
        Error::inference(format!("Failed to expand topic: invalid response: {}", e))
    })?;

    if raw.nodes.len() > count {
        warn!(
            requested = count,
            returned = raw.nodes.len(),
            "Model returned extra nodes, dropping"
        );
    } else if raw.nodes.len() < count {
        warn!(
            requested = count,
            returned = raw.nodes.len(),
            "Model returned fewer nodes than requested"
        );
    }

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(count.min(raw.nodes.len()));
    for node in raw.nodes.into_iter().take(count) {
        let id = node.id.trim().to_string();
        let label = node.label.trim();

        if id.is_empty() {
            return Err(Error::inference(
                "Failed to expand topic: node with empty id",
            ));
        }
        if id.chars().count() > MAX_NODE_ID_LEN {
            return Err(Error::inference(format!(
                "Failed to expand topic: node id longer than {} characters",
                MAX_NODE_ID_LEN
            )));
        }
        if label.is_empty() {
            return Err(Error::inference(format!(
                "Failed to expand topic: node '{}' has an empty label",
                id
            )));
        }
        if !seen.insert(id.clone()) {
            return Err(Error::inference(format!(
                "Failed to expand topic: duplicate node id '{}'",
                id
            )));
        }

        if node.node_type.as_deref() == Some("root") {
            debug!(id = %id, "Coercing root-typed node to generated");
        }

        let mut concept = ConceptNode::new(
            id,
            truncate_chars(label, MAX_LABEL_LEN),
            NodeType::Generated,
        );
        if let Some(reason) = node.reason.filter(|r| !r.trim().is_empty()) {
            concept = concept.with_reason(truncate_chars(&reason, MAX_REASON_LEN));
        }
        nodes.push(concept);
    }

    let edges: Vec<ConceptEdge> = raw
        .edges
        .into_iter()
        .filter_map(|edge| {
            let target = edge.target.trim();
            if !seen.contains(target) {
                warn!(target, "Dropping edge to unknown node");
                return None;
            }
            if edge.source.as_deref() != Some(anchor) {
                debug!(source = ?edge.source, anchor, "Rewriting edge source");
            }
            let mut rewritten = ConceptEdge::new(anchor, target);
            if let Some(label) = edge.label.filter(|l| !l.trim().is_empty()) {
                rewritten = rewritten.with_label(truncate_chars(&label, MAX_EDGE_LABEL_LEN));
            }
            Some(rewritten)
        })
        .collect();

    Ok(ExpansionResult {
        nodes,
        edges,
        reasoning: raw.reasoning,
    })
}

/// Extract JSON from a response that might contain markdown or other text
fn extract_json_from_response(response: &str) -> String {
    // Fenced json block first
    if let Some(start) = response.find("```json") {
        let json_start = start + 7;
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim().to_string();
        }
    }

    // Any fenced block
    if let Some(start) = response.find("```") {
        let potential_start = start + 3;
        if let Some(newline) = response[potential_start..].find('\n') {
            let json_start = potential_start + newline + 1;
            if let Some(end) = response[json_start..].find("```") {
                return response[json_start..json_start + end].trim().to_string();
            }
        }
    }

    // Bare object
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return response[start..=end].to_string();
        }
    }

    response.to_string()
}

/// System prompt for topic expansion
const EXPANSION_SYSTEM_PROMPT: &str = r#"You are a knowledge graph expansion assistant. Given a topic, you propose related concepts that together form an interesting semantic mind map.

Guidelines:
1. Prefer concepts that open new directions over near-synonyms
2. Keep labels short and specific
3. Give every concept a one-sentence reason
4. Never reuse an id within one answer

Return valid JSON only, with no additional text or explanation."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Model returning a fixed answer and recording prompts
    struct ScriptedModel {
        answer: std::result::Result<String, String>,
        prompts: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn answering(content: &str) -> Self {
            Self {
                answer: Ok(content.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                answer: Err(message.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(
            &self,
            messages: Vec<Message>,
            _format: Option<ResponseFormat>,
        ) -> Result<LlmResponse> {
            self.prompts.lock().unwrap().push(messages);
            match &self.answer {
                Ok(content) => Ok(LlmResponse::text("scripted", content.clone())),
                Err(message) => Err(Error::inference(message.clone())),
            }
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn scripted_generator(model: ScriptedModel) -> (GraphGenerator, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        (GraphGenerator::new(model.clone()), model)
    }

    const THREE_NODES: &str = r#"{
        "nodes": [
            {"id": "ethics", "label": "Ethics", "type": "generated", "reason": "moral philosophy"},
            {"id": "logic", "label": "Logic", "type": "root", "reason": "valid reasoning"},
            {"id": "metaphysics", "label": "Metaphysics", "type": "generated", "reason": "nature of reality"}
        ],
        "edges": [
            {"source": "philosophy", "target": "ethics", "label": "includes"},
            {"source": "logic", "target": "metaphysics", "label": "informs"},
            {"source": "philosophy", "target": "logic", "label": "includes"}
        ],
        "reasoning": "Three classic branches"
    }"#;

    #[tokio::test]
    async fn test_edges_are_rewritten_to_anchor() {
        let (generator, _) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        let result = generator
            .expand("Philosophy", &[], &[], 3, None)
            .await
            .unwrap();

        assert_eq!(result.nodes.len(), 3);
        assert_eq!(result.edges.len(), 3);
        assert!(result.edges.iter().all(|e| e.source == "philosophy"));
        assert_eq!(result.reasoning, "Three classic branches");
    }

    #[tokio::test]
    async fn test_explicit_anchor_wins() {
        let (generator, _) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        let result = generator
            .expand("Ethics", &[], &[], 3, Some("node-42"))
            .await
            .unwrap();

        assert!(result.edges.iter().all(|e| e.source == "node-42"));
    }

    #[tokio::test]
    async fn test_root_nodes_coerced_to_generated() {
        let (generator, _) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        let result = generator
            .expand("Philosophy", &[], &[], 3, None)
            .await
            .unwrap();

        assert!(
            result
                .nodes
                .iter()
                .all(|n| n.node_type == NodeType::Generated)
        );
    }

    #[tokio::test]
    async fn test_extra_nodes_and_orphan_edges_dropped() {
        let (generator, _) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        let result = generator
            .expand("Philosophy", &[], &[], 2, None)
            .await
            .unwrap();

        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["ethics", "logic"]);
        // The edge to metaphysics no longer has a target
        assert_eq!(result.edges.len(), 2);
        assert!(result.edges.iter().all(|e| e.target != "metaphysics"));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let answer = r#"{
            "nodes": [
                {"id": "ethics", "label": "Ethics", "type": "generated", "reason": "a"},
                {"id": "ethics", "label": "Morality", "type": "generated", "reason": "b"}
            ],
            "edges": [],
            "reasoning": "dup"
        }"#;
        let (generator, _) = scripted_generator(ScriptedModel::answering(answer));
        let err = generator
            .expand("Philosophy", &[], &[], 2, None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INFERENCE_FAILED");
        assert!(err.to_string().contains("duplicate node id"));
    }

    #[tokio::test]
    async fn test_empty_label_is_rejected() {
        let answer = r#"{"nodes": [{"id": "x", "label": " ", "type": "generated"}], "edges": [], "reasoning": ""}"#;
        let (generator, _) = scripted_generator(ScriptedModel::answering(answer));
        let err = generator
            .expand("Philosophy", &[], &[], 1, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INFERENCE_FAILED");
    }

    #[tokio::test]
    async fn test_fenced_response_is_accepted() {
        let answer = format!("Here you go:\n```json\n{}\n```\nEnjoy.", THREE_NODES);
        let (generator, _) = scripted_generator(ScriptedModel::answering(&answer));
        let result = generator
            .expand("Philosophy", &[], &[], 3, None)
            .await
            .unwrap();
        assert_eq!(result.nodes.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_is_inference_error() {
        let (generator, _) = scripted_generator(ScriptedModel::answering("I cannot help with that."));
        let err = generator
            .expand("Philosophy", &[], &[], 3, None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INFERENCE_FAILED");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let (generator, _) = scripted_generator(ScriptedModel::failing("upstream timed out"));
        let err = generator
            .expand("Philosophy", &[], &[], 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Inference { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_count_bounds() {
        let (generator, model) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        for count in [0, 21] {
            let err = generator
                .expand("Philosophy", &[], &[], count, None)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_anchor_is_rejected() {
        let (generator, model) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        let topic = "b".repeat(150);

        let err = generator
            .expand(&topic, &[], &[], 3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_contents() {
        let (generator, model) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        let retrieved: Vec<ScoredConcept> = (0..7)
            .map(|i| ScoredConcept {
                id: format!("r{}", i),
                label: format!("Known {}", i),
                score: 0.9,
            })
            .collect();
        let context = vec!["Science".to_string(), "Physics".to_string()];

        generator
            .expand("Quantum Computing", &context, &retrieved, 3, None)
            .await
            .unwrap();

        let prompts = model.prompts.lock().unwrap();
        let user = &prompts[0][1].content;
        assert!(user.contains("Topic to expand: Quantum Computing"));
        assert!(user.contains("Current context/path: Science, Physics"));
        assert!(user.contains("Known 4"));
        assert!(!user.contains("Known 5"));
        assert!(user.contains("exactly 3 new"));
        assert!(user.contains(r#"source="quantum-computing""#));
    }

    #[tokio::test]
    async fn test_prompt_placeholders_when_empty() {
        let (generator, model) = scripted_generator(ScriptedModel::answering(THREE_NODES));
        generator
            .expand("Philosophy", &[], &[], 3, None)
            .await
            .unwrap();

        let prompts = model.prompts.lock().unwrap();
        let user = &prompts[0][1].content;
        assert!(user.contains("Current context/path: none\n"));
        assert!(user.contains("Similar concepts already in the graph: none yet"));
    }

    #[test]
    fn test_extract_json_from_response() {
        assert_eq!(
            extract_json_from_response("prefix {\"a\": 1} suffix"),
            "{\"a\": 1}"
        );
        assert_eq!(
            extract_json_from_response("```\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(extract_json_from_response("no json"), "no json");
    }
}
