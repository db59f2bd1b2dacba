//! Workflow input validation
//!
//! Validates the user-supplied inputs of seed, expand and similarity checks
//! before any external service is called.

use crate::error::{Error, Result};
use crate::graph::{MAX_EXPANSIONS, MAX_NODE_ID_LEN, derive_node_id};

/// Maximum topic length in characters
pub const MAX_TOPIC_LEN: usize = 200;
/// Maximum number of context entries
pub const MAX_CONTEXT_ITEMS: usize = 50;

/// Validator for workflow inputs
pub struct InputValidator;

impl InputValidator {
    /// Validate a topic
    ///
    /// Rules:
    /// - Must not be blank
    /// - Must be 200 characters or less
    pub fn validate_topic(topic: &str) -> Result<()> {
        if topic.trim().is_empty() {
            return Err(Error::InvalidInput("topic cannot be empty".to_string()));
        }

        if topic.chars().count() > MAX_TOPIC_LEN {
            return Err(Error::InvalidInput(format!(
                "topic must be {} characters or less",
                MAX_TOPIC_LEN
            )));
        }

        Ok(())
    }

    /// Validate an exploration path or comparison set
    ///
    /// `min_items` is 0 for expansion and 1 for similarity checks.
    pub fn validate_context(context: &[String], min_items: usize) -> Result<()> {
        if context.len() < min_items {
            return Err(Error::InvalidInput(format!(
                "context must contain at least {} item(s)",
                min_items
            )));
        }

        if context.len() > MAX_CONTEXT_ITEMS {
            return Err(Error::InvalidInput(format!(
                "context must contain {} items or less, got {}",
                MAX_CONTEXT_ITEMS,
                context.len()
            )));
        }

        Ok(())
    }

    pub fn validate_num_expansions(count: usize) -> Result<()> {
        if !(1..=MAX_EXPANSIONS).contains(&count) {
            return Err(Error::InvalidInput(format!(
                "num_expansions must be between 1 and {}, got {}",
                MAX_EXPANSIONS, count
            )));
        }
        Ok(())
    }

    /// Validate an explicit expansion anchor
    pub fn validate_source_node_id(id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidInput(
                "source_node_id cannot be empty".to_string(),
            ));
        }

        if id.chars().count() > MAX_NODE_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "source_node_id must be {} characters or less",
                MAX_NODE_ID_LEN
            )));
        }

        Ok(())
    }

    /// Derive the node id for `topic`, rejecting ids over the length cap
    pub fn derived_node_id(topic: &str) -> Result<String> {
        let id = derive_node_id(topic);
        if id.chars().count() > MAX_NODE_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "topic yields a node id longer than {} characters; pass a shorter topic or an explicit source_node_id",
                MAX_NODE_ID_LEN
            )));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_topic() {
        assert!(InputValidator::validate_topic("Philosophy").is_ok());
        assert!(InputValidator::validate_topic(&"a".repeat(200)).is_ok());
        assert!(InputValidator::validate_topic("").is_err());
        assert!(InputValidator::validate_topic("   ").is_err());
        assert!(InputValidator::validate_topic(&"a".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_context() {
        let fifty: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let fifty_one: Vec<String> = (0..51).map(|i| i.to_string()).collect();

        assert!(InputValidator::validate_context(&[], 0).is_ok());
        assert!(InputValidator::validate_context(&[], 1).is_err());
        assert!(InputValidator::validate_context(&fifty, 1).is_ok());
        assert!(InputValidator::validate_context(&fifty_one, 0).is_err());
    }

    #[test]
    fn test_validate_num_expansions() {
        assert!(InputValidator::validate_num_expansions(1).is_ok());
        assert!(InputValidator::validate_num_expansions(20).is_ok());
        assert!(InputValidator::validate_num_expansions(0).is_err());
        assert!(InputValidator::validate_num_expansions(21).is_err());
    }

    #[test]
    fn test_validate_source_node_id() {
        assert!(InputValidator::validate_source_node_id("philosophy").is_ok());
        assert!(InputValidator::validate_source_node_id("").is_err());
        assert!(InputValidator::validate_source_node_id(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_derived_node_id_length() {
        assert_eq!(
            InputValidator::derived_node_id("Quantum Computing").unwrap(),
            "quantum-computing"
        );
        assert!(InputValidator::derived_node_id(&"a".repeat(100)).is_ok());
        assert!(matches!(
            InputValidator::derived_node_id(&"a".repeat(101)),
            Err(Error::InvalidInput(_))
        ));
    }
}
