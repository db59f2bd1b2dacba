//! Expansion orchestration
//!
//! The user-facing workflows: seed, expand, check similarity and health.

mod health;
mod service;
mod validator;

pub use health::{EMBEDDING_SERVICE, HealthReport, HealthStatus, VECTOR_STORE_SERVICE};
pub use service::{ExpansionService, SEED_REASON};
pub use validator::{InputValidator, MAX_CONTEXT_ITEMS, MAX_TOPIC_LEN};
