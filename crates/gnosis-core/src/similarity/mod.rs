//! Similarity routing between a topic and existing context

mod router;

pub use router::{
    DEFAULT_THRESHOLD, SimilarityResult, SuggestedAction, check_threshold, cosine_similarity,
    route,
};
