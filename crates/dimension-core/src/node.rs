//! Node identification
//!
//! TigerStyle: Validated identifiers, stable across restarts.

use crate::constants::NODE_ID_LENGTH_BYTES_MAX;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a mesh node
///
/// Node IDs are operator-supplied and must be stable across restarts for the
/// same physical node; membership history (keepalives, death records) is
/// keyed by them.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new NodeId with validation
    ///
    /// # Errors
    /// Returns error if id is empty, too long, or contains characters other
    /// than alphanumerics, dashes, underscores and dots.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        // TigerStyle: Explicit validation
        if id.is_empty() {
            return Err(Error::InvalidNodeId {
                id: id.clone(),
                reason: "node ID cannot be empty".into(),
            });
        }

        if id.len() > NODE_ID_LENGTH_BYTES_MAX {
            return Err(Error::InvalidNodeId {
                id: id.clone(),
                reason: format!(
                    "node ID length {} exceeds limit {}",
                    id.len(),
                    NODE_ID_LENGTH_BYTES_MAX
                ),
            });
        }

        let valid = id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');

        if !valid {
            return Err(Error::InvalidNodeId {
                id: id.clone(),
                reason: "node ID contains invalid characters".into(),
            });
        }

        Ok(Self(id))
    }

    /// Create a NodeId without validation (for internal use)
    ///
    /// # Safety
    /// Caller must ensure the ID is valid.
    #[doc(hidden)]
    pub fn new_unchecked(id: String) -> Self {
        debug_assert!(!id.is_empty());
        debug_assert!(id.len() <= NODE_ID_LENGTH_BYTES_MAX);
        Self(id)
    }

    /// Get the node ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_valid() {
        let id = NodeId::new("node-1").unwrap();
        assert_eq!(id.as_str(), "node-1");
        assert_eq!(format!("{}", id), "node-1");
    }

    #[test]
    fn test_node_id_invalid_empty() {
        let result = NodeId::new("");
        assert!(matches!(result, Err(Error::InvalidNodeId { .. })));
    }

    #[test]
    fn test_node_id_invalid_chars() {
        let result = NodeId::new("node/1");
        assert!(matches!(result, Err(Error::InvalidNodeId { .. })));
    }

    #[test]
    fn test_node_id_too_long() {
        let long = "a".repeat(NODE_ID_LENGTH_BYTES_MAX + 1);
        let result = NodeId::new(long);
        assert!(matches!(result, Err(Error::InvalidNodeId { .. })));
    }

    #[test]
    fn test_node_id_ordering_is_lexicographic() {
        let a = NodeId::new("alpha").unwrap();
        let b = NodeId::new("bravo").unwrap();
        assert!(a < b);
    }
}
