//! Generative model abstraction
//!
//! The graph generator talks to the model through this trait so the concrete
//! provider can be swapped or scripted in tests.

use async_trait::async_trait;

use crate::error::Result;

use super::types::{LlmResponse, Message, ResponseFormat};

/// A black-box generative model
///
/// Implementations must be shareable across concurrent requests through
/// `Arc<dyn GenerativeModel>`. Failures are reported as inference errors.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run one completion over `messages`, optionally constrained to `format`
    async fn generate(
        &self,
        messages: Vec<Message>,
        format: Option<ResponseFormat>,
    ) -> Result<LlmResponse>;

    /// Name of the underlying model, for logging
    fn model_name(&self) -> &str;
}
