//! Similarity routing
//!
//! Decides whether a topic belongs to an existing graph (`expand`) or should
//! start a new one (`new_root`) by comparing its embedding against labelled
//! context embeddings.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default relatedness threshold
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Grow the existing graph
    Expand,
    /// Start a separate graph
    NewRoot,
}

impl SuggestedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::Expand => "expand",
            SuggestedAction::NewRoot => "new_root",
        }
    }
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a similarity check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub is_related: bool,
    /// Best score, in [0, 1]
    pub similarity_score: f32,
    /// Label of the best-scoring context entry
    pub closest_match: Option<String>,
    pub suggested_action: SuggestedAction,
}

/// Compute cosine similarity between two vectors
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

/// Reject thresholds outside [0, 1]
pub fn check_threshold(threshold: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(Error::InvalidInput(format!(
            "threshold must be between 0 and 1, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Route `query` against labelled context embeddings
///
/// Scores are clamped to [0, 1]. Ties keep the first context entry. The
/// threshold comparison is inclusive.
pub fn route(
    query: &[f32],
    context: &[(String, Vec<f32>)],
    threshold: f32,
) -> Result<SimilarityResult> {
    check_threshold(threshold)?;

    let mut scored: Vec<(&str, f32)> = context
        .iter()
        .map(|(label, vector)| {
            (
                label.as_str(),
                cosine_similarity(query, vector).clamp(0.0, 1.0),
            )
        })
        .collect();

    // sort_by is stable, so equal scores keep context order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (closest_match, similarity_score) = match scored.first() {
        Some((label, score)) => (Some(label.to_string()), *score),
        None => (None, 0.0),
    };

    let is_related = similarity_score >= threshold;
    Ok(SimilarityResult {
        is_related,
        similarity_score,
        closest_match,
        suggested_action: if is_related {
            SuggestedAction::Expand
        } else {
            SuggestedAction::NewRoot
        },
    })
}
