//! Argument checks for the API boundary.
//!
//! The store itself accepts whatever it is given; callers run these first.

use super::node::NodeId;
use crate::CoreError;

/// Trimmed node name, rejecting blank input
pub fn validate_node_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError("Student name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trimmed connection label, rejecting self-connections and blank labels
pub fn validate_connection(from: NodeId, to: NodeId, label: &str) -> Result<String, CoreError> {
    if from == to {
        return Err(CoreError::ValidationError(format!(
            "Node {} cannot be connected to itself",
            from
        )));
    }
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError("Common interest must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_blank_rejected() {
        assert_eq!(validate_node_name("  Alice ").unwrap(), "Alice");
        assert!(matches!(validate_node_name("   "), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn self_connection_and_blank_label_rejected() {
        let (a, b) = (NodeId::new(), NodeId::new());
        assert_eq!(validate_connection(a, b, " soccer ").unwrap(), "soccer");
        assert!(validate_connection(a, a, "soccer").is_err());
        assert!(validate_connection(a, b, "").is_err());
    }
}
