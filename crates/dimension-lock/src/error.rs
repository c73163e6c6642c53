//! Lock error types

use crate::orchestrator::LockRefusal;
use dimension_cluster::ClusterError;
use thiserror::Error;

/// Errors from the lock coordinator and orchestrator
#[derive(Error, Debug)]
pub enum LockError {
    /// A quorum member refused the request
    #[error("peer {peer} refused: {refusal}")]
    Refused { peer: String, refusal: LockRefusal },

    /// A quorum member could not be reached
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    /// Transport-level failure
    #[error("cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// A wire message failed validation at the boundary
    #[error("invalid lock message: {reason}")]
    InvalidMessage { reason: String },

    /// Internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl LockError {
    /// Whether retrying the whole acquisition later may succeed
    ///
    /// Refusals clear once the competing holder finishes or its lease
    /// lapses; unreachable peers may come back.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Refused { .. } | Self::PeerUnreachable { .. } => true,
            Self::Cluster(e) => e.is_retriable(),
            Self::InvalidMessage { .. } | Self::Internal { .. } => false,
        }
    }
}

/// Result type for lock operations
pub type LockResult<T> = std::result::Result<T, LockError>;
