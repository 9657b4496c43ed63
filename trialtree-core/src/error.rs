//! Error types for trialtree core operations

use crate::NodeId;
use thiserror::Error;

/// Arena tree errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {node} does not exist in this tree")]
    UnknownNode { node: NodeId },

    #[error("Cannot attach below node {node} ('{label}'): it does not descend")]
    CannotDescend { node: NodeId, label: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read options: {reason}")]
    Malformed { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_error_display_cannot_descend() {
        let err = TreeError::CannotDescend {
            node: NodeId::new(3),
            label: "$".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Cannot attach"));
        assert!(msg.contains("#3"));
        assert!(msg.contains("'$'"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "tolerance".to_string(),
            value: "-1".to_string(),
            reason: "must be a non-negative number".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("tolerance"));
        assert!(msg.contains("-1"));
        assert!(msg.contains("non-negative"));
    }
}
