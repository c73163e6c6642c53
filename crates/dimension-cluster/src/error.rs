//! Cluster error types
//!
//! TigerStyle: Explicit error variants with context.

use dimension_core::NodeId;
use thiserror::Error;

/// Membership and gossip errors
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Cluster already started
    #[error("cluster already started")]
    AlreadyStarted,

    /// Cluster not started
    #[error("cluster not started")]
    NotStarted,

    /// Node not reachable
    #[error("node {node_id} not reachable: {reason}")]
    NodeUnreachable { node_id: String, reason: String },

    /// Remote call timed out
    #[error("call to {node_id} timed out after {timeout_ms}ms")]
    RpcTimeout { node_id: String, timeout_ms: u64 },

    /// The registry update queue has shut down
    #[error("membership update queue closed")]
    QueueClosed,

    /// A wire message failed validation at the boundary
    #[error("invalid wire message: {reason}")]
    InvalidMessage { reason: String },

    /// Core validation error
    #[error("core error: {0}")]
    Core(#[from] dimension_core::Error),

    /// Internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ClusterError {
    /// Create a node unreachable error
    pub fn node_unreachable(node_id: &NodeId, reason: impl Into<String>) -> Self {
        Self::NodeUnreachable {
            node_id: node_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an RPC timeout error
    pub fn rpc_timeout(node_id: &NodeId, timeout_ms: u64) -> Self {
        Self::RpcTimeout {
            node_id: node_id.to_string(),
            timeout_ms,
        }
    }

    /// Check if this error is retriable
    ///
    /// Gossip retries unreachable peers via the debounce loop; boundary
    /// validation failures are never retried.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::NodeUnreachable { .. } | Self::RpcTimeout { .. }
        )
    }
}

/// Result type for cluster operations
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
