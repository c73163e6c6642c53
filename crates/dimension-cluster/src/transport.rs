//! Node transport abstraction
//!
//! All mesh traffic goes through the `Transport` trait so membership and
//! locking logic never touch sockets directly. Production binds an HTTP
//! transport; tests wire nodes together through `MemoryMesh` and flip
//! links down to simulate partitions.

use crate::error::{ClusterError, ClusterResult};
use async_trait::async_trait;
use bytes::Bytes;
use dimension_core::NodeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sends a request to one peer and awaits its response
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send `body` to `target` at `path`, returning the response body
    async fn send(&self, target: &NodeId, path: &str, body: Bytes) -> ClusterResult<Bytes>;
}

/// Provides the local node's current neighbour set
///
/// The mesh is partially connected; gossip and quorum selection only ever
/// talk to neighbours.
#[async_trait]
pub trait Neighbours: Send + Sync + std::fmt::Debug {
    /// Peers this node pushes gossip to
    async fn neighbours(&self) -> Vec<NodeId>;

    /// Route cost to a peer; lower is nearer. Unknown peers are distant.
    async fn route_cost(&self, id: &NodeId) -> u32;
}

/// Handles requests arriving at a node
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle a request from `from` at `path`
    async fn handle(&self, from: &NodeId, path: &str, body: Bytes) -> ClusterResult<Bytes>;
}

/// Fixed neighbour set with per-peer route costs
#[derive(Debug, Default)]
pub struct StaticNeighbours {
    peers: RwLock<Vec<NodeId>>,
    costs: RwLock<HashMap<NodeId, u32>>,
}

impl StaticNeighbours {
    /// Create with the given peers, all at cost zero
    pub fn new(peers: Vec<NodeId>) -> Self {
        Self {
            peers: RwLock::new(peers),
            costs: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the neighbour list
    pub async fn set_peers(&self, peers: Vec<NodeId>) {
        *self.peers.write().await = peers;
    }

    /// Set the route cost for a peer
    pub async fn set_cost(&self, id: NodeId, cost: u32) {
        self.costs.write().await.insert(id, cost);
    }
}

#[async_trait]
impl Neighbours for StaticNeighbours {
    async fn neighbours(&self) -> Vec<NodeId> {
        self.peers.read().await.clone()
    }

    async fn route_cost(&self, id: &NodeId) -> u32 {
        self.costs.read().await.get(id).copied().unwrap_or(u32::MAX)
    }
}

/// In-memory mesh hub connecting `MemoryTransport`s
///
/// Registered handlers receive requests directly; marking a node down
/// severs every link to it, simulating a crash or partition.
#[derive(Default)]
pub struct MemoryMesh {
    handlers: RwLock<HashMap<NodeId, Arc<dyn RequestHandler>>>,
    down: RwLock<HashSet<NodeId>>,
}

impl std::fmt::Debug for MemoryMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMesh").finish_non_exhaustive()
    }
}

impl MemoryMesh {
    /// Create an empty mesh
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attach a node's request handler
    pub async fn register(&self, id: NodeId, handler: Arc<dyn RequestHandler>) {
        self.handlers.write().await.insert(id, handler);
    }

    /// Detach a node entirely
    pub async fn unregister(&self, id: &NodeId) {
        self.handlers.write().await.remove(id);
    }

    /// Mark a node unreachable (or reachable again)
    pub async fn set_down(&self, id: &NodeId, down: bool) {
        let mut set = self.down.write().await;
        if down {
            set.insert(id.clone());
        } else {
            set.remove(id);
        }
    }

    async fn dispatch(
        &self,
        from: &NodeId,
        target: &NodeId,
        path: &str,
        body: Bytes,
    ) -> ClusterResult<Bytes> {
        if self.down.read().await.contains(target) {
            return Err(ClusterError::node_unreachable(target, "link down"));
        }
        let handler = self
            .handlers
            .read()
            .await
            .get(target)
            .cloned()
            .ok_or_else(|| ClusterError::node_unreachable(target, "not registered"))?;
        handler.handle(from, path, body).await
    }
}

/// One node's endpoint on a `MemoryMesh`
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    mesh: Arc<MemoryMesh>,
    local: NodeId,
}

impl MemoryTransport {
    /// Create an endpoint for `local` on the given mesh
    pub fn new(mesh: Arc<MemoryMesh>, local: NodeId) -> Self {
        Self { mesh, local }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, target: &NodeId, path: &str, body: Bytes) -> ClusterResult<Bytes> {
        if self.mesh.down.read().await.contains(&self.local) {
            return Err(ClusterError::node_unreachable(target, "local link down"));
        }
        self.mesh.dispatch(&self.local, target, path, body).await
    }
}
