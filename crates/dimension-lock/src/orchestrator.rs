//! Distributed lock orchestration
//!
//! Acquisition is a two-phase handshake run by the requesting node:
//! prevent on the local coordinator and every quorum member, then
//! promote every prevention to a lock. Any refusal or unreachable peer
//! aborts the attempt and rolls back what was already granted. Release
//! is best effort and never fails: a preventing peer that cannot be told
//! will shed its reservation through the lease, and a locked one
//! surfaces through status.

use crate::coordinator::{LockCoordinator, PreventOutcome, TransitionOutcome};
use crate::error::{LockError, LockResult};
use crate::locker::{Applicant, LockState};
use crate::quorum::{select_quorum, PeerDescriptor};
use crate::scope::Scope;
use async_trait::async_trait;
use bytes::Bytes;
use dimension_cluster::{ClusterError, ClusterResult, RequestHandler, Transport};
use dimension_core::{Datemark, LockConfig, NodeId, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Path for prevention requests
pub const PATH_LOCKER_PREVENT: &str = "/locker/prevent";

/// Path for lock confirmations
pub const PATH_LOCKER_LOCK: &str = "/locker/lock";

/// Path for releases
pub const PATH_LOCKER_UNLOCK: &str = "/locker/unlock";

/// Phase-one request: ask a peer to move a scope to PREVENTING
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventRequest {
    /// Scope to prevent
    pub scope: Scope,

    /// Requesting applicant
    pub applicant: Applicant,

    /// The applicant's catalog version datemark
    pub datemark: Datemark,
}

/// Lock confirmation or release request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// Scope to transition
    pub scope: Scope,

    /// Requesting applicant; must hold the scope
    pub applicant: Applicant,
}

/// The protocol verb a refusal is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockAction {
    /// Phase-one reservation
    Prevent,

    /// Promotion of PREVENTING to LOCKED
    Lock,

    /// Release
    Unlock,
}

impl std::fmt::Display for LockAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockAction::Prevent => f.write_str("prevent"),
            LockAction::Lock => f.write_str("lock"),
            LockAction::Unlock => f.write_str("unlock"),
        }
    }
}

/// Why a peer refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalReason {
    /// The scope (or a higher-priority one) is busy
    Busy,

    /// The applicant's catalog view is older than the peer's
    Stale,

    /// The applicant does not hold the scope it tried to transition
    NotHolder,
}

/// A peer's refusal, carried back to the requester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRefusal {
    /// Scope that caused the refusal (may be a higher-priority one)
    pub scope: Scope,

    /// That scope's state on the refusing peer
    pub state: LockState,

    /// Verb that was refused
    pub action: LockAction,

    /// Refusal category
    pub reason: RefusalReason,
}

impl std::fmt::Display for LockRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} refused: {:?} on {} ({})",
            self.action, self.reason, self.scope, self.state
        )
    }
}

/// Reply to a prevent, lock, or unlock request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockReply {
    /// Whether the request was granted
    pub granted: bool,

    /// Refusal detail when not granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<LockRefusal>,
}

impl LockReply {
    fn granted() -> Self {
        Self {
            granted: true,
            refusal: None,
        }
    }

    fn refused(refusal: LockRefusal) -> Self {
        Self {
            granted: false,
            refusal: Some(refusal),
        }
    }
}

/// Sends lock protocol requests to peers
///
/// Seam for tests: the orchestrator is exercised against a scripted
/// client, production wires `TransportLockClient`.
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Phase one on one peer
    async fn prevent(&self, peer: &NodeId, request: &PreventRequest) -> LockResult<LockReply>;

    /// Phase two on one peer
    async fn lock(&self, peer: &NodeId, request: &TransitionRequest) -> LockResult<LockReply>;

    /// Release on one peer
    async fn unlock(&self, peer: &NodeId, request: &TransitionRequest) -> LockResult<LockReply>;
}

/// Supplies lock-quorum candidates
///
/// Backed by the catalog's peer table in production, filtered against
/// the membership registry's alive set; descriptors carry the ages and
/// route costs quorum selection needs.
#[async_trait]
pub trait PeerDirectory: Send + Sync + std::fmt::Debug {
    /// Current alive candidates, excluding the local node
    async fn candidates(&self) -> Vec<PeerDescriptor>;
}

/// A granted distributed lock
///
/// Holds the quorum that granted it; pass it back to `release`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockGrant {
    /// Locked scope
    pub scope: Scope,

    /// Holder
    pub applicant: Applicant,

    /// Remote quorum members that granted the lock
    pub peers: Vec<NodeId>,
}

/// `LockClient` over the node transport
///
/// Every call runs under the RPC timeout so a hung peer cannot stall
/// the handshake; an elapsed call surfaces as `ClusterError::RpcTimeout`.
#[derive(Debug, Clone)]
pub struct TransportLockClient {
    transport: Arc<dyn Transport>,
    rpc_timeout_ms: u64,
}

impl TransportLockClient {
    /// Create a client over the given transport
    pub fn new(transport: Arc<dyn Transport>, rpc_timeout_ms: u64) -> Self {
        assert!(rpc_timeout_ms > 0, "RPC timeout must be positive");

        Self {
            transport,
            rpc_timeout_ms,
        }
    }

    async fn call<R: Serialize>(
        &self,
        peer: &NodeId,
        path: &str,
        request: &R,
    ) -> LockResult<LockReply> {
        let body = serde_json::to_vec(request).map_err(|e| LockError::Internal {
            message: format!("encode lock request: {e}"),
        })?;
        let send = self.transport.send(peer, path, Bytes::from(body));
        let reply = tokio::time::timeout(Duration::from_millis(self.rpc_timeout_ms), send)
            .await
            .map_err(|_| ClusterError::rpc_timeout(peer, self.rpc_timeout_ms))?
            .map_err(|e| LockError::PeerUnreachable {
                peer: peer.to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_slice(&reply).map_err(|e| LockError::InvalidMessage {
            reason: format!("lock reply: {e}"),
        })
    }
}

#[async_trait]
impl LockClient for TransportLockClient {
    async fn prevent(&self, peer: &NodeId, request: &PreventRequest) -> LockResult<LockReply> {
        self.call(peer, PATH_LOCKER_PREVENT, request).await
    }

    async fn lock(&self, peer: &NodeId, request: &TransitionRequest) -> LockResult<LockReply> {
        self.call(peer, PATH_LOCKER_LOCK, request).await
    }

    async fn unlock(&self, peer: &NodeId, request: &TransitionRequest) -> LockResult<LockReply> {
        self.call(peer, PATH_LOCKER_UNLOCK, request).await
    }
}

/// Routes transport requests to the local coordinator
pub struct LockHandler {
    coordinator: Arc<LockCoordinator>,
}

impl LockHandler {
    /// Wrap a coordinator for request dispatch
    pub fn new(coordinator: Arc<LockCoordinator>) -> Self {
        Self { coordinator }
    }

    async fn handle_prevent(&self, request: PreventRequest) -> LockReply {
        match self
            .coordinator
            .prevent(request.scope, &request.applicant, request.datemark)
            .await
        {
            PreventOutcome::Accepted => LockReply::granted(),
            PreventOutcome::Busy { scope, state } => LockReply::refused(LockRefusal {
                scope,
                state,
                action: LockAction::Prevent,
                reason: RefusalReason::Busy,
            }),
            PreventOutcome::Stale { .. } => LockReply::refused(LockRefusal {
                scope: request.scope,
                state: LockState::Unlocked,
                action: LockAction::Prevent,
                reason: RefusalReason::Stale,
            }),
        }
    }

    async fn handle_transition(&self, request: TransitionRequest, action: LockAction) -> LockReply {
        let outcome = match action {
            LockAction::Lock => {
                self.coordinator
                    .lock(request.scope, &request.applicant)
                    .await
            }
            LockAction::Unlock => {
                self.coordinator
                    .unlock(request.scope, &request.applicant)
                    .await
            }
            LockAction::Prevent => unreachable!("prevent carries its own request type"),
        };
        match outcome {
            TransitionOutcome::Accepted => LockReply::granted(),
            TransitionOutcome::Denied { state, .. } => LockReply::refused(LockRefusal {
                scope: request.scope,
                state,
                action,
                reason: RefusalReason::NotHolder,
            }),
        }
    }
}

#[async_trait]
impl RequestHandler for LockHandler {
    async fn handle(&self, from: &NodeId, path: &str, body: Bytes) -> ClusterResult<Bytes> {
        let reply = match path {
            PATH_LOCKER_PREVENT => {
                let request: PreventRequest =
                    serde_json::from_slice(&body).map_err(|e| ClusterError::InvalidMessage {
                        reason: format!("prevent request: {e}"),
                    })?;
                debug!(%from, scope = %request.scope, "prevent request");
                self.handle_prevent(request).await
            }
            PATH_LOCKER_LOCK | PATH_LOCKER_UNLOCK => {
                let request: TransitionRequest =
                    serde_json::from_slice(&body).map_err(|e| ClusterError::InvalidMessage {
                        reason: format!("transition request: {e}"),
                    })?;
                let action = if path == PATH_LOCKER_LOCK {
                    LockAction::Lock
                } else {
                    LockAction::Unlock
                };
                debug!(%from, scope = %request.scope, %action, "transition request");
                self.handle_transition(request, action).await
            }
            other => {
                return Err(ClusterError::InvalidMessage {
                    reason: format!("unknown path {other}"),
                })
            }
        };
        let body = serde_json::to_vec(&reply).map_err(|e| ClusterError::Internal {
            message: format!("encode lock reply: {e}"),
        })?;
        Ok(Bytes::from(body))
    }
}

/// Runs the two-phase handshake against a quorum
pub struct LockOrchestrator {
    local: NodeId,
    coordinator: Arc<LockCoordinator>,
    client: Arc<dyn LockClient>,
    directory: Arc<dyn PeerDirectory>,
    config: LockConfig,
    time: Arc<dyn TimeProvider>,
}

impl LockOrchestrator {
    /// Create an orchestrator for the local node
    pub fn new(
        local: NodeId,
        coordinator: Arc<LockCoordinator>,
        client: Arc<dyn LockClient>,
        directory: Arc<dyn PeerDirectory>,
        config: LockConfig,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            local,
            coordinator,
            client,
            directory,
            config,
            time,
        }
    }

    /// Acquire a mesh-wide lock on `scope`
    ///
    /// Prevention runs locally first, then sequentially across the
    /// quorum; the first refusal or unreachable peer aborts and rolls
    /// back everything already prevented. The lock phase then promotes
    /// every prevention; a failure there unlocks best effort.
    pub async fn acquire(
        &self,
        scope: Scope,
        applicant: &Applicant,
        datemark: Datemark,
    ) -> LockResult<LockGrant> {
        let peers = select_quorum(
            &self.directory.candidates().await,
            self.config.quorum_size_min,
            self.config.adult_age_ms,
            self.time.now_ms(),
        );
        info!(%scope, %applicant, quorum = peers.len(), "acquiring lock");

        // Phase one: local prevention first; failing fast here costs no
        // remote traffic.
        match self.coordinator.prevent(scope, applicant, datemark).await {
            PreventOutcome::Accepted => {}
            PreventOutcome::Busy { scope, state } => {
                return Err(LockError::Refused {
                    peer: self.local.to_string(),
                    refusal: LockRefusal {
                        scope,
                        state,
                        action: LockAction::Prevent,
                        reason: RefusalReason::Busy,
                    },
                });
            }
            PreventOutcome::Stale { .. } => {
                return Err(LockError::Refused {
                    peer: self.local.to_string(),
                    refusal: LockRefusal {
                        scope,
                        state: LockState::Unlocked,
                        action: LockAction::Prevent,
                        reason: RefusalReason::Stale,
                    },
                });
            }
        }

        let request = PreventRequest {
            scope,
            applicant: applicant.clone(),
            datemark,
        };
        let mut prevented: Vec<NodeId> = Vec::new();
        for peer in &peers {
            match self.client.prevent(peer, &request).await {
                Ok(reply) if reply.granted => prevented.push(peer.clone()),
                Ok(reply) => {
                    let refusal = reply.refusal.unwrap_or(LockRefusal {
                        scope,
                        state: LockState::Unlocked,
                        action: LockAction::Prevent,
                        reason: RefusalReason::Busy,
                    });
                    warn!(%peer, %refusal, "prevention refused, rolling back");
                    self.rollback(scope, applicant, &prevented).await;
                    return Err(LockError::Refused {
                        peer: peer.to_string(),
                        refusal,
                    });
                }
                Err(error) => {
                    warn!(%peer, %error, "peer unreachable during prevention, rolling back");
                    self.rollback(scope, applicant, &prevented).await;
                    return Err(error);
                }
            }
        }

        // Phase two: promote every prevention.
        if self.coordinator.lock(scope, applicant).await != TransitionOutcome::Accepted {
            // Our own prevention lapsed mid-handshake.
            self.rollback(scope, applicant, &prevented).await;
            return Err(LockError::Internal {
                message: "local prevention lost before lock phase".into(),
            });
        }

        let transition = TransitionRequest {
            scope,
            applicant: applicant.clone(),
        };
        for peer in &peers {
            let failed = match self.client.lock(peer, &transition).await {
                Ok(reply) if reply.granted => None,
                Ok(reply) => Some(LockError::Refused {
                    peer: peer.to_string(),
                    refusal: reply.refusal.unwrap_or(LockRefusal {
                        scope,
                        state: LockState::Unlocked,
                        action: LockAction::Lock,
                        reason: RefusalReason::NotHolder,
                    }),
                }),
                Err(error) => Some(error),
            };
            if let Some(error) = failed {
                warn!(%peer, %error, "lock phase failed, unlocking");
                // Some peers are locked, the rest still prevent; unlock
                // releases either state.
                self.rollback(scope, applicant, &peers).await;
                return Err(error);
            }
        }

        info!(%scope, %applicant, quorum = peers.len(), "lock acquired");
        Ok(LockGrant {
            scope,
            applicant: applicant.clone(),
            peers,
        })
    }

    /// Release a granted lock everywhere, best effort
    ///
    /// Never fails: unreachable peers are logged and left to their
    /// lease or to operator attention via status.
    pub async fn release(&self, grant: &LockGrant) {
        info!(scope = %grant.scope, applicant = %grant.applicant, "releasing lock");
        self.rollback(grant.scope, &grant.applicant, &grant.peers)
            .await;
    }

    async fn rollback(&self, scope: Scope, applicant: &Applicant, peers: &[NodeId]) {
        if self.coordinator.unlock(scope, applicant).await != TransitionOutcome::Accepted {
            warn!(%scope, %applicant, "local unlock denied during rollback");
        }
        let request = TransitionRequest {
            scope,
            applicant: applicant.clone(),
        };
        for peer in peers {
            match self.client.unlock(peer, &request).await {
                Ok(reply) if reply.granted => {}
                Ok(reply) => {
                    warn!(%peer, refusal = ?reply.refusal, "unlock refused during rollback")
                }
                Err(error) => warn!(%peer, %error, "unlock not delivered during rollback"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::FixedCatalogVersion;
    use dimension_core::WallClockTime;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn node(id: &str) -> NodeId {
        NodeId::new(id).unwrap()
    }

    fn applicant(id: &str) -> Applicant {
        Applicant::new(id)
    }

    #[derive(Debug)]
    struct StaticDirectory(Vec<PeerDescriptor>);

    #[async_trait]
    impl PeerDirectory for StaticDirectory {
        async fn candidates(&self) -> Vec<PeerDescriptor> {
            self.0.clone()
        }
    }

    fn adult(id: &str) -> PeerDescriptor {
        PeerDescriptor {
            id: node(id),
            created: Datemark::from_ms(0),
            modified: Datemark::from_ms(0),
            route_cost: 1,
            ignore_on_lock: false,
        }
    }

    /// Scripted peer behavior, recording every call
    #[derive(Default)]
    struct FakeLockClient {
        refuse_prevent: Mutex<HashMap<NodeId, LockRefusal>>,
        unreachable: Mutex<std::collections::HashSet<NodeId>>,
        calls: Mutex<Vec<(NodeId, LockAction)>>,
    }

    impl FakeLockClient {
        fn refuse(&self, peer: &str) {
            self.refuse_prevent.lock().unwrap().insert(
                node(peer),
                LockRefusal {
                    scope: Scope::Catalog,
                    state: LockState::Preventing,
                    action: LockAction::Prevent,
                    reason: RefusalReason::Busy,
                },
            );
        }

        fn cut(&self, peer: &str) {
            self.unreachable.lock().unwrap().insert(node(peer));
        }

        fn calls(&self) -> Vec<(NodeId, LockAction)> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, peer: &NodeId, action: LockAction) -> LockResult<()> {
            self.calls.lock().unwrap().push((peer.clone(), action));
            if self.unreachable.lock().unwrap().contains(peer) {
                return Err(LockError::PeerUnreachable {
                    peer: peer.to_string(),
                    reason: "cut".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LockClient for FakeLockClient {
        async fn prevent(&self, peer: &NodeId, _request: &PreventRequest) -> LockResult<LockReply> {
            self.record(peer, LockAction::Prevent)?;
            if let Some(refusal) = self.refuse_prevent.lock().unwrap().get(peer) {
                return Ok(LockReply::refused(refusal.clone()));
            }
            Ok(LockReply::granted())
        }

        async fn lock(&self, peer: &NodeId, _request: &TransitionRequest) -> LockResult<LockReply> {
            self.record(peer, LockAction::Lock)?;
            Ok(LockReply::granted())
        }

        async fn unlock(
            &self,
            peer: &NodeId,
            _request: &TransitionRequest,
        ) -> LockResult<LockReply> {
            self.record(peer, LockAction::Unlock)?;
            Ok(LockReply::granted())
        }
    }

    fn orchestrator(
        client: Arc<FakeLockClient>,
        peers: Vec<PeerDescriptor>,
    ) -> (LockOrchestrator, Arc<LockCoordinator>) {
        let time: Arc<dyn TimeProvider> = Arc::new(WallClockTime::new());
        let coordinator = LockCoordinator::new(
            LockConfig::for_testing(),
            Arc::new(FixedCatalogVersion::default()),
            time.clone(),
        );
        let orchestrator = LockOrchestrator::new(
            node("local"),
            coordinator.clone(),
            client,
            Arc::new(StaticDirectory(peers)),
            LockConfig::for_testing(),
            time,
        );
        (orchestrator, coordinator)
    }

    #[tokio::test]
    async fn test_acquire_locks_quorum_and_self() {
        let client = Arc::new(FakeLockClient::default());
        let (orchestrator, coordinator) =
            orchestrator(client.clone(), vec![adult("b"), adult("c")]);

        let grant = orchestrator
            .acquire(Scope::Catalog, &applicant("op-1"), Datemark::from_ms(1))
            .await
            .unwrap();

        assert_eq!(grant.peers.len(), 2);
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Locked
        );
        let locks = client
            .calls()
            .iter()
            .filter(|(_, action)| *action == LockAction::Lock)
            .count();
        assert_eq!(locks, 2);
    }

    #[tokio::test]
    async fn test_refusal_rolls_back_earlier_grants() {
        let client = Arc::new(FakeLockClient::default());
        client.refuse("c");
        let (orchestrator, coordinator) =
            orchestrator(client.clone(), vec![adult("b"), adult("c")]);

        let result = orchestrator
            .acquire(Scope::Catalog, &applicant("op-1"), Datemark::from_ms(1))
            .await;

        assert!(matches!(result, Err(LockError::Refused { .. })));
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Unlocked
        );
        // b was prevented, then unlocked; c was never told to unlock a
        // prevention it refused.
        let calls = client.calls();
        assert!(calls.contains(&(node("b"), LockAction::Unlock)));
        assert!(!calls.contains(&(node("c"), LockAction::Unlock)));
    }

    #[tokio::test]
    async fn test_unreachable_peer_rolls_back() {
        let client = Arc::new(FakeLockClient::default());
        client.cut("c");
        let (orchestrator, coordinator) =
            orchestrator(client.clone(), vec![adult("b"), adult("c")]);

        let result = orchestrator
            .acquire(Scope::Catalog, &applicant("op-1"), Datemark::from_ms(1))
            .await;

        assert!(matches!(result, Err(LockError::PeerUnreachable { .. })));
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Unlocked
        );
    }

    #[tokio::test]
    async fn test_release_unlocks_everywhere_and_never_fails() {
        let client = Arc::new(FakeLockClient::default());
        let (orchestrator, coordinator) =
            orchestrator(client.clone(), vec![adult("b"), adult("c")]);

        let grant = orchestrator
            .acquire(Scope::Catalog, &applicant("op-1"), Datemark::from_ms(1))
            .await
            .unwrap();

        // One peer vanishes before release; release still completes.
        client.cut("c");
        orchestrator.release(&grant).await;

        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Unlocked
        );
        assert!(client.calls().contains(&(node("b"), LockAction::Unlock)));
    }

    #[tokio::test]
    async fn test_acquire_with_empty_quorum_locks_locally() {
        let client = Arc::new(FakeLockClient::default());
        let (orchestrator, coordinator) = orchestrator(client.clone(), vec![]);

        let grant = orchestrator
            .acquire(Scope::Upgrade, &applicant("op-1"), Datemark::from_ms(1))
            .await
            .unwrap();
        assert!(grant.peers.is_empty());
        assert_eq!(coordinator.state_of(Scope::Upgrade).await, LockState::Locked);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_peer_times_out_and_rolls_back() {
        use dimension_cluster::{MemoryMesh, MemoryTransport};

        // A peer that accepts the request and never answers.
        struct HangingHandler;

        #[async_trait]
        impl RequestHandler for HangingHandler {
            async fn handle(
                &self,
                _from: &NodeId,
                _path: &str,
                _body: Bytes,
            ) -> ClusterResult<Bytes> {
                std::future::pending().await
            }
        }

        let mesh = MemoryMesh::new();
        mesh.register(node("b"), Arc::new(HangingHandler)).await;
        let transport = Arc::new(MemoryTransport::new(mesh, node("local")));
        let client = Arc::new(TransportLockClient::new(transport, 50));

        let time: Arc<dyn TimeProvider> = Arc::new(WallClockTime::new());
        let coordinator = LockCoordinator::new(
            LockConfig::for_testing(),
            Arc::new(FixedCatalogVersion::default()),
            time.clone(),
        );
        let orchestrator = LockOrchestrator::new(
            node("local"),
            coordinator.clone(),
            client,
            Arc::new(StaticDirectory(vec![adult("b")])),
            LockConfig::for_testing(),
            time,
        );

        let result = orchestrator
            .acquire(Scope::Catalog, &applicant("op-1"), Datemark::from_ms(1))
            .await;
        assert!(matches!(
            result,
            Err(LockError::Cluster(ClusterError::RpcTimeout { .. }))
        ));
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Unlocked
        );
    }

    #[tokio::test]
    async fn test_local_busy_scope_refuses_without_remote_calls() {
        let client = Arc::new(FakeLockClient::default());
        let (orchestrator, coordinator) = orchestrator(client.clone(), vec![adult("b")]);

        coordinator
            .prevent(Scope::Catalog, &applicant("op-0"), Datemark::from_ms(1))
            .await;

        let result = orchestrator
            .acquire(Scope::Catalog, &applicant("op-1"), Datemark::from_ms(1))
            .await;
        assert!(matches!(result, Err(LockError::Refused { .. })));
        assert!(client.calls().is_empty());
    }
}
