//! Cross-node locking over an in-memory mesh

use async_trait::async_trait;
use dimension_cluster::{MemoryMesh, MemoryTransport};
use dimension_core::{Datemark, LockConfig, NodeId, TimeProvider, WallClockTime};
use dimension_lock::{
    Applicant, FixedCatalogVersion, LockCoordinator, LockError, LockHandler, LockOrchestrator,
    LockState, PeerDescriptor, PeerDirectory, Scope, TransportLockClient,
};
use std::sync::Arc;

fn node(id: &str) -> NodeId {
    NodeId::new(id).unwrap()
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

struct LockNode {
    coordinator: Arc<LockCoordinator>,
    orchestrator: LockOrchestrator,
}

async fn spawn_node(mesh: &Arc<MemoryMesh>, id: &str, peers: Vec<&str>) -> LockNode {
    let local = node(id);
    let time: Arc<dyn TimeProvider> = Arc::new(WallClockTime::new());
    let coordinator = LockCoordinator::new(
        LockConfig::for_testing(),
        Arc::new(FixedCatalogVersion::default()),
        time.clone(),
    );
    mesh.register(local.clone(), Arc::new(LockHandler::new(coordinator.clone())))
        .await;

    let transport = Arc::new(MemoryTransport::new(mesh.clone(), local.clone()));
    let orchestrator = LockOrchestrator::new(
        local,
        coordinator.clone(),
        Arc::new(TransportLockClient::new(transport, 1_000)),
        Arc::new(StaticDirectory(peers.into_iter().map(adult).collect())),
        LockConfig::for_testing(),
        time,
    );
    LockNode {
        coordinator,
        orchestrator,
    }
}

#[tokio::test]
async fn test_lock_spans_three_nodes() {
    let mesh = MemoryMesh::new();
    let a = spawn_node(&mesh, "a", vec!["b", "c"]).await;
    let b = spawn_node(&mesh, "b", vec!["a", "c"]).await;
    let c = spawn_node(&mesh, "c", vec!["a", "b"]).await;

    let op = Applicant::new("op-1");
    let grant = a
        .orchestrator
        .acquire(Scope::Catalog, &op, Datemark::from_ms(1))
        .await
        .unwrap();

    assert_eq!(a.coordinator.state_of(Scope::Catalog).await, LockState::Locked);
    assert_eq!(b.coordinator.state_of(Scope::Catalog).await, LockState::Locked);
    assert_eq!(c.coordinator.state_of(Scope::Catalog).await, LockState::Locked);

    a.orchestrator.release(&grant).await;
    assert_eq!(a.coordinator.state_of(Scope::Catalog).await, LockState::Unlocked);
    assert_eq!(b.coordinator.state_of(Scope::Catalog).await, LockState::Unlocked);
    assert_eq!(c.coordinator.state_of(Scope::Catalog).await, LockState::Unlocked);
}

#[tokio::test]
async fn test_competing_acquisitions_exclude_each_other() {
    let mesh = MemoryMesh::new();
    let a = spawn_node(&mesh, "a", vec!["b", "c"]).await;
    let b = spawn_node(&mesh, "b", vec!["a", "c"]).await;
    let _c = spawn_node(&mesh, "c", vec!["a", "b"]).await;

    let grant = a
        .orchestrator
        .acquire(Scope::Catalog, &Applicant::new("op-a"), Datemark::from_ms(1))
        .await
        .unwrap();

    let result = b
        .orchestrator
        .acquire(Scope::Catalog, &Applicant::new("op-b"), Datemark::from_ms(1))
        .await;
    assert!(matches!(result, Err(LockError::Refused { .. })));
    // b's failed attempt must not have disturbed the held lock.
    assert_eq!(b.coordinator.state_of(Scope::Catalog).await, LockState::Locked);

    a.orchestrator.release(&grant).await;
    let grant = b
        .orchestrator
        .acquire(Scope::Catalog, &Applicant::new("op-b"), Datemark::from_ms(1))
        .await
        .unwrap();
    b.orchestrator.release(&grant).await;
}

#[tokio::test]
async fn test_partitioned_peer_aborts_acquisition() {
    let mesh = MemoryMesh::new();
    let a = spawn_node(&mesh, "a", vec!["b", "c"]).await;
    let b = spawn_node(&mesh, "b", vec!["a", "c"]).await;
    let _c = spawn_node(&mesh, "c", vec!["a", "b"]).await;
    mesh.set_down(&node("c"), true).await;

    let result = a
        .orchestrator
        .acquire(Scope::Catalog, &Applicant::new("op-a"), Datemark::from_ms(1))
        .await;
    assert!(result.is_err());

    // The prevention on b was rolled back.
    assert_eq!(b.coordinator.state_of(Scope::Catalog).await, LockState::Unlocked);
    assert_eq!(a.coordinator.state_of(Scope::Catalog).await, LockState::Unlocked);
}
