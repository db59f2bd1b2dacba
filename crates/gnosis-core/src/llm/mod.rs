//! LLM integration - OpenAI-compatible chat completions
//!
//! This module provides:
//! - HTTP client for chat completions (Cerebras by default)
//! - Request/response types matching the OpenAI wire format
//! - Structured output through JSON schema response formats
//! - The `GenerativeModel` seam used by the graph generator

mod client;
mod model;
mod types;

pub use client::{LlmClient, LlmClientBuilder};
pub use model::GenerativeModel;
pub use types::{
    ChatRequest, ChatResponse, Choice, FinishReason, JsonSchemaFormat, LlmResponse, Message,
    MessageRole, ResponseFormat, Usage,
};
