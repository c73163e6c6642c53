//! Cluster lifecycle
//!
//! `Cluster` owns the background tasks of one mesh node:
//!
//! - consumer: drains the registry queue and applies side effects
//! - sweeper: fires due zombie timers back into the queue
//! - keepalive: announces this node's own liveness on an interval
//! - disseminator: pushes buffered changes to neighbours
//!
//! `start` spawns them, `stop` signals shutdown, awaits them, then
//! broadcasts a best-effort leave notice.

use crate::error::{ClusterError, ClusterResult};
use crate::event::EventBus;
use crate::gossip::Disseminator;
use crate::registry::{MembershipRegistry, TimerAction, UpdateReceiver};
use crate::timers::ZombieTimerSet;
use crate::transport::{Neighbours, RequestHandler, Transport};
use crate::wire::{
    GossipPush, JoinRequest, JoinResponse, LeaveNotice, MemberRecord, PATH_CLUSTER,
    PATH_CLUSTER_IN, PATH_CLUSTER_OUT,
};
use async_trait::async_trait;
use bytes::Bytes;
use dimension_core::{ClusterConfig, NodeId, TimeProvider};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle state of the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Stopped,
    Running,
    ShuttingDown,
}

/// One node's membership engine
pub struct Cluster {
    local: NodeId,
    config: ClusterConfig,
    registry: MembershipRegistry,
    timers: Arc<ZombieTimerSet>,
    gossip: Arc<Disseminator>,
    events: EventBus,
    transport: Arc<dyn Transport>,
    neighbours: Arc<dyn Neighbours>,
    time: Arc<dyn TimeProvider>,
    state: RwLock<RunState>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    rx: Mutex<Option<UpdateReceiver>>,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

impl Cluster {
    /// Create a stopped cluster for the given node
    pub fn new(
        local: NodeId,
        config: ClusterConfig,
        transport: Arc<dyn Transport>,
        neighbours: Arc<dyn Neighbours>,
        time: Arc<dyn TimeProvider>,
    ) -> Arc<Self> {
        let (registry, rx) = MembershipRegistry::new(local.clone());
        let timers = Arc::new(ZombieTimerSet::new(config.zombie_threshold_ms));
        let gossip = Disseminator::new(
            local.clone(),
            transport.clone(),
            neighbours.clone(),
            time.clone(),
            config.gossip_debounce_ms,
            config.rpc_timeout_ms,
        );
        let (shutdown_tx, _) = broadcast::channel(4);

        Arc::new(Self {
            local,
            config,
            registry,
            timers,
            gossip,
            events: EventBus::new(),
            transport,
            neighbours,
            time,
            state: RwLock::new(RunState::Stopped),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
            rx: Mutex::new(Some(rx)),
        })
    }

    /// Local node identity
    pub fn local_id(&self) -> &NodeId {
        &self.local
    }

    /// Membership event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Live members, including this node
    pub async fn alive_set(&self) -> HashSet<NodeId> {
        self.registry.alive_set().await
    }

    /// Peers under zombie suspicion
    pub async fn zombie_set(&self) -> HashSet<NodeId> {
        self.registry.zombie_set().await
    }

    /// Whether a node is currently a live member
    pub async fn contains_alive(&self, id: &NodeId) -> bool {
        self.registry.contains_alive(id).await
    }

    /// The registry, for submitting updates directly
    pub fn registry(&self) -> &MembershipRegistry {
        &self.registry
    }

    /// Start the background tasks
    pub async fn start(self: &Arc<Self>) -> ClusterResult<()> {
        {
            let mut state = self.state.write().await;
            if *state != RunState::Stopped {
                return Err(ClusterError::AlreadyStarted);
            }
            *state = RunState::Running;
        }

        let rx = self
            .rx
            .lock()
            .await
            .take()
            .ok_or(ClusterError::Internal {
                message: "update receiver already consumed".into(),
            })?;

        let mut tasks = self.tasks.lock().await;
        tasks.push(tokio::spawn(
            self.clone().run_consumer(rx, self.shutdown_tx.subscribe()),
        ));
        tasks.push(tokio::spawn(
            self.clone().run_sweeper(self.shutdown_tx.subscribe()),
        ));
        tasks.push(tokio::spawn(
            self.clone().run_keepalive(self.shutdown_tx.subscribe()),
        ));
        tasks.push(tokio::spawn(
            self.gossip.clone().run(self.shutdown_tx.subscribe()),
        ));

        info!(node = %self.local, "cluster started");
        Ok(())
    }

    /// Stop the background tasks and announce departure
    pub async fn stop(self: &Arc<Self>) -> ClusterResult<()> {
        {
            let mut state = self.state.write().await;
            if *state != RunState::Running {
                return Err(ClusterError::NotStarted);
            }
            *state = RunState::ShuttingDown;
        }

        let _ = self.shutdown_tx.send(());
        let mut tasks = self.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        drop(tasks);

        // No suspicion may fire on a stopped node.
        self.timers.clear();

        self.broadcast_leave().await;

        *self.state.write().await = RunState::Stopped;
        info!(node = %self.local, "cluster stopped");
        Ok(())
    }

    /// Join the mesh through a seed peer
    ///
    /// Sends our keepalive, then merges the seed's full view into the
    /// registry. Anti-entropy: one join catches a rejoining node up on
    /// everything it missed.
    pub async fn join(&self, seed: &NodeId) -> ClusterResult<JoinResponse> {
        let request = JoinRequest {
            keepalive: self.time.now_datemark(),
            routes: Vec::new(),
        };
        let body = serde_json::to_vec(&request).map_err(|e| ClusterError::Internal {
            message: format!("encode join request: {e}"),
        })?;

        let reply = self
            .transport
            .send(seed, PATH_CLUSTER_IN, Bytes::from(body))
            .await?;
        let response: JoinResponse =
            serde_json::from_slice(&reply).map_err(|e| ClusterError::InvalidMessage {
                reason: format!("join response: {e}"),
            })?;

        let updates = response
            .cluster
            .iter()
            .cloned()
            .map(MemberRecord::into_update)
            .collect();
        self.registry.submit_batch(updates).await?;

        info!(node = %self.local, %seed, members = response.cluster.len(), "joined mesh");
        Ok(response)
    }

    /// Handle an incoming gossip push
    pub async fn handle_gossip(&self, from: &NodeId, push: GossipPush) -> ClusterResult<()> {
        debug!(%from, records = push.cluster.len(), "gossip received");
        let updates = push
            .cluster
            .into_iter()
            .map(MemberRecord::into_update)
            .collect();
        self.registry.submit_batch(updates).await
    }

    /// Handle an incoming join request
    pub async fn handle_join(
        &self,
        from: &NodeId,
        request: JoinRequest,
    ) -> ClusterResult<JoinResponse> {
        info!(%from, "join request");
        self.registry
            .submit(MemberRecord {
                id: from.clone(),
                keepalive: request.keepalive,
                death: false,
            }
            .into_update())
            .await?;

        Ok(JoinResponse {
            cluster: self.registry.snapshot(self.time.now_datemark()).await,
            neighbours: self.neighbours.neighbours().await,
        })
    }

    /// Handle an incoming leave notice
    pub async fn handle_leave(&self, from: &NodeId, notice: LeaveNotice) -> ClusterResult<()> {
        info!(%from, "leave notice");
        self.registry
            .submit(MemberRecord {
                id: from.clone(),
                keepalive: notice.death,
                death: true,
            }
            .into_update())
            .await
    }

    /// Best-effort leave broadcast to every neighbour
    async fn broadcast_leave(&self) {
        let notice = LeaveNotice {
            death: self.time.now_datemark(),
        };
        let body = match serde_json::to_vec(&notice) {
            Ok(body) => Bytes::from(body),
            Err(_) => return,
        };
        for peer in self.neighbours.neighbours().await {
            if peer == self.local {
                continue;
            }
            if let Err(error) = self
                .transport
                .send(&peer, PATH_CLUSTER_OUT, body.clone())
                .await
            {
                debug!(%peer, %error, "leave notice not delivered");
            }
        }
    }

    /// Drain the update queue, applying side effects in order
    async fn run_consumer(
        self: Arc<Self>,
        mut rx: UpdateReceiver,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            let update = tokio::select! {
                update = rx.recv() => match update {
                    Some(update) => update,
                    None => return,
                },
                _ = shutdown.recv() => return,
            };

            let node = update.id.clone();
            let outcome = self.registry.apply(update).await;

            match outcome.timer {
                TimerAction::Arm { keepalive } => {
                    self.timers.arm(node.clone(), keepalive, self.time.now_ms());
                }
                TimerAction::Cancel => self.timers.cancel(&node),
                TimerAction::None => {}
            }
            if let Some(record) = outcome.disseminate {
                self.gossip.buffer_record(record);
            }
            if let Some(event) = outcome.event {
                self.events.publish(event);
            }
        }
    }

    /// Fire due zombie timers back into the update queue
    async fn run_sweeper(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            let now_ms = self.time.now_ms();
            let sleep_ms = self
                .timers
                .next_due_ms()
                .map(|due| due.saturating_sub(now_ms))
                .unwrap_or(self.config.zombie_threshold_ms)
                .clamp(1, self.config.zombie_threshold_ms);

            tokio::select! {
                _ = self.time.sleep_ms(sleep_ms) => {}
                _ = shutdown.recv() => return,
            }

            for due in self.timers.pop_due(self.time.now_ms()) {
                let update = crate::entry::LivenessUpdate::zombie_suspicion(
                    due.node,
                    due.armed_keepalive,
                );
                if self.registry.submit(update).await.is_err() {
                    return;
                }
            }
        }
    }

    /// Announce this node's own liveness on an interval
    ///
    /// The record goes straight to the disseminator: our own registry
    /// drops self-updates, but neighbours need the fresh datemark.
    async fn run_keepalive(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        loop {
            self.gossip.buffer_record(MemberRecord {
                id: self.local.clone(),
                keepalive: self.time.now_datemark(),
                death: false,
            });

            tokio::select! {
                _ = self.time.sleep_ms(self.config.keepalive_interval_ms) => {}
                _ = shutdown.recv() => return,
            }
        }
    }
}

/// Routes transport requests to cluster handlers by path
pub struct ClusterHandler {
    cluster: Arc<Cluster>,
}

impl ClusterHandler {
    /// Wrap a cluster for request dispatch
    pub fn new(cluster: Arc<Cluster>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl RequestHandler for ClusterHandler {
    async fn handle(&self, from: &NodeId, path: &str, body: Bytes) -> ClusterResult<Bytes> {
        match path {
            PATH_CLUSTER => {
                let push: GossipPush =
                    serde_json::from_slice(&body).map_err(|e| ClusterError::InvalidMessage {
                        reason: format!("gossip push: {e}"),
                    })?;
                self.cluster.handle_gossip(from, push).await?;
                Ok(Bytes::from_static(b"{}"))
            }
            PATH_CLUSTER_IN => {
                let request: JoinRequest =
                    serde_json::from_slice(&body).map_err(|e| ClusterError::InvalidMessage {
                        reason: format!("join request: {e}"),
                    })?;
                let response = self.cluster.handle_join(from, request).await?;
                let body = serde_json::to_vec(&response).map_err(|e| ClusterError::Internal {
                    message: format!("encode join response: {e}"),
                })?;
                Ok(Bytes::from(body))
            }
            PATH_CLUSTER_OUT => {
                let notice: LeaveNotice =
                    serde_json::from_slice(&body).map_err(|e| ClusterError::InvalidMessage {
                        reason: format!("leave notice: {e}"),
                    })?;
                self.cluster.handle_leave(from, notice).await?;
                Ok(Bytes::from_static(b"{}"))
            }
            other => {
                warn!(path = other, "unknown cluster path");
                Err(ClusterError::InvalidMessage {
                    reason: format!("unknown path {other}"),
                })
            }
        }
    }
}
