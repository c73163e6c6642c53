//! Membership registry
//!
//! `MembershipState` is the synchronous merge core: it applies one
//! `LivenessUpdate` at a time and reports what changed. All mutation
//! funnels through a single bounded queue consumed by one task, so merges
//! never race and last-writer-wins is decided purely by datemark.
//!
//! `MembershipRegistry` is the async shell around it: submitters enqueue,
//! readers take a read lock, and the cluster's consumer task is the only
//! writer.

use crate::entry::{LivenessUpdate, MemberEntry, UpdateKind};
use crate::error::{ClusterError, ClusterResult};
use crate::event::MemberEvent;
use crate::wire::MemberRecord;
use dimension_core::{Datemark, NodeId, DIMENSION_NODES_COUNT_MAX, REGISTRY_QUEUE_DEPTH_MAX};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Timer side effect of applying an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// No timer change
    None,

    /// Arm the zombie timer against this keepalive
    Arm { keepalive: Datemark },

    /// Cancel any pending zombie timer
    Cancel,
}

/// Everything an applied update asks the shell to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Event to publish, if the update changed observable liveness
    pub event: Option<MemberEvent>,

    /// Record to hand to the disseminator, if peers should learn of this
    pub disseminate: Option<MemberRecord>,

    /// Zombie timer side effect
    pub timer: TimerAction,
}

impl ApplyOutcome {
    fn noop() -> Self {
        Self {
            event: None,
            disseminate: None,
            timer: TimerAction::None,
        }
    }
}

/// Synchronous membership merge core
///
/// Holds no clock and spawns nothing; every decision is a pure function
/// of the stored entries and the incoming update.
#[derive(Debug)]
pub struct MembershipState {
    self_id: NodeId,
    members: HashMap<NodeId, MemberEntry>,
}

impl MembershipState {
    /// Create an empty view for the given local node
    pub fn new(self_id: NodeId) -> Self {
        Self {
            self_id,
            members: HashMap::new(),
        }
    }

    /// Local node identity
    pub fn self_id(&self) -> &NodeId {
        &self.self_id
    }

    /// Apply one update and report its side effects
    ///
    /// Updates about the local node are dropped: a node is the sole
    /// authority on its own liveness, so relayed self-records (including
    /// stale death notices from a previous incarnation) never land.
    pub fn apply(&mut self, update: LivenessUpdate) -> ApplyOutcome {
        if update.id == self.self_id {
            debug!(node = %update.id, "dropping update about self");
            return ApplyOutcome::noop();
        }

        match update.kind {
            UpdateKind::Keepalive { keepalive } => self.apply_keepalive(update.id, keepalive),
            UpdateKind::Death { keepalive } => self.apply_death(update.id, keepalive),
            UpdateKind::ZombieSuspicion { armed_keepalive } => {
                self.apply_suspicion(update.id, armed_keepalive)
            }
        }
    }

    fn apply_keepalive(&mut self, id: NodeId, keepalive: Datemark) -> ApplyOutcome {
        match self.members.get_mut(&id) {
            None => {
                if self.members.len() >= DIMENSION_NODES_COUNT_MAX {
                    warn!(node = %id, "membership view full, dropping new peer");
                    return ApplyOutcome::noop();
                }
                self.members
                    .insert(id.clone(), MemberEntry::new_alive(id.clone(), keepalive));
                ApplyOutcome {
                    event: Some(MemberEvent::New(id.clone())),
                    disseminate: Some(MemberRecord {
                        id,
                        keepalive,
                        death: false,
                    }),
                    timer: TimerAction::Arm { keepalive },
                }
            }
            Some(entry) => {
                // Last writer wins; equal datemarks carry no new evidence.
                if keepalive <= entry.keepalive {
                    return ApplyOutcome::noop();
                }
                let was_dead = entry.death;
                let was_zombie = entry.zombie;
                entry.keepalive = keepalive;
                entry.death = false;
                entry.zombie = false;

                let event = if was_dead {
                    Some(MemberEvent::New(id.clone()))
                } else if was_zombie {
                    Some(MemberEvent::Alive(id.clone()))
                } else {
                    None
                };
                ApplyOutcome {
                    event,
                    disseminate: Some(MemberRecord {
                        id,
                        keepalive,
                        death: false,
                    }),
                    timer: TimerAction::Arm { keepalive },
                }
            }
        }
    }

    fn apply_death(&mut self, id: NodeId, keepalive: Datemark) -> ApplyOutcome {
        match self.members.get_mut(&id) {
            None => {
                if self.members.len() >= DIMENSION_NODES_COUNT_MAX {
                    warn!(node = %id, "membership view full, dropping death record");
                    return ApplyOutcome::noop();
                }
                // First sighting through a death notice still creates the
                // row so later gossip about the peer merges correctly.
                self.members
                    .insert(id.clone(), MemberEntry::new_dead(id.clone(), keepalive));
                ApplyOutcome {
                    event: Some(MemberEvent::Death(id.clone())),
                    disseminate: Some(MemberRecord {
                        id,
                        keepalive,
                        death: true,
                    }),
                    timer: TimerAction::None,
                }
            }
            Some(entry) => {
                if entry.death && keepalive <= entry.keepalive {
                    return ApplyOutcome::noop();
                }
                entry.keepalive = keepalive;
                entry.death = true;
                entry.zombie = false;

                ApplyOutcome {
                    event: Some(MemberEvent::Death(id.clone())),
                    disseminate: Some(MemberRecord {
                        id,
                        keepalive,
                        death: true,
                    }),
                    timer: TimerAction::Cancel,
                }
            }
        }
    }

    fn apply_suspicion(&mut self, id: NodeId, armed_keepalive: Datemark) -> ApplyOutcome {
        let Some(entry) = self.members.get_mut(&id) else {
            return ApplyOutcome::noop();
        };
        // The timer only counts if nothing happened since it was armed.
        if entry.death || entry.zombie || entry.keepalive != armed_keepalive {
            return ApplyOutcome::noop();
        }
        entry.zombie = true;

        // Suspicion is local judgement: no dissemination.
        ApplyOutcome {
            event: Some(MemberEvent::Zombie(id)),
            disseminate: None,
            timer: TimerAction::None,
        }
    }

    /// Ids of peers currently considered alive, plus the local node
    pub fn alive_set(&self) -> HashSet<NodeId> {
        let mut alive: HashSet<NodeId> = self
            .members
            .values()
            .filter(|e| e.is_alive())
            .map(|e| e.id.clone())
            .collect();
        alive.insert(self.self_id.clone());
        alive
    }

    /// Ids of peers currently under zombie suspicion
    pub fn zombie_set(&self) -> HashSet<NodeId> {
        self.members
            .values()
            .filter(|e| e.zombie)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Whether a node is a live member (the local node always is)
    pub fn contains_alive(&self, id: &NodeId) -> bool {
        if *id == self.self_id {
            return true;
        }
        self.members.get(id).is_some_and(|e| e.is_alive())
    }

    /// Look up a peer's entry
    pub fn get(&self, id: &NodeId) -> Option<&MemberEntry> {
        self.members.get(id)
    }

    /// Number of known peers, not counting the local node
    pub fn peer_count(&self) -> usize {
        self.members.len()
    }

    /// Full view as wire records, with a synthetic fresh record for self
    ///
    /// Used to answer joins: the joiner learns everything this node knows,
    /// including that this node is alive as of `now`.
    pub fn snapshot(&self, now: Datemark) -> Vec<MemberRecord> {
        let mut records: Vec<MemberRecord> = self
            .members
            .values()
            .map(|e| MemberRecord {
                id: e.id.clone(),
                keepalive: e.keepalive,
                death: e.death,
            })
            .collect();
        records.push(MemberRecord {
            id: self.self_id.clone(),
            keepalive: now,
            death: false,
        });
        records
    }
}

/// Async shell: bounded submission queue plus read access
///
/// Cloning is cheap; all clones share one state and one queue.
#[derive(Debug, Clone)]
pub struct MembershipRegistry {
    state: Arc<RwLock<MembershipState>>,
    tx: mpsc::Sender<LivenessUpdate>,
}

/// Receiving half of the registry's update queue
pub type UpdateReceiver = mpsc::Receiver<LivenessUpdate>;

impl MembershipRegistry {
    /// Create a registry and the receiver its consumer task drains
    pub fn new(self_id: NodeId) -> (Self, UpdateReceiver) {
        let (tx, rx) = mpsc::channel(REGISTRY_QUEUE_DEPTH_MAX);
        let registry = Self {
            state: Arc::new(RwLock::new(MembershipState::new(self_id))),
            tx,
        };
        (registry, rx)
    }

    /// Enqueue one update
    ///
    /// Applies backpressure when the queue is full; fails only after the
    /// consumer has shut down.
    pub async fn submit(&self, update: LivenessUpdate) -> ClusterResult<()> {
        self.tx
            .send(update)
            .await
            .map_err(|_| ClusterError::QueueClosed)
    }

    /// Enqueue a batch of updates in order
    pub async fn submit_batch(&self, updates: Vec<LivenessUpdate>) -> ClusterResult<()> {
        for update in updates {
            self.submit(update).await?;
        }
        Ok(())
    }

    /// Apply one update against the shared state
    ///
    /// Called only by the consumer task; everything else submits.
    pub(crate) async fn apply(&self, update: LivenessUpdate) -> ApplyOutcome {
        self.state.write().await.apply(update)
    }

    /// Live members, including the local node
    pub async fn alive_set(&self) -> HashSet<NodeId> {
        self.state.read().await.alive_set()
    }

    /// Peers under zombie suspicion
    pub async fn zombie_set(&self) -> HashSet<NodeId> {
        self.state.read().await.zombie_set()
    }

    /// Whether a node is currently a live member
    pub async fn contains_alive(&self, id: &NodeId) -> bool {
        self.state.read().await.contains_alive(id)
    }

    /// Number of known peers
    pub async fn peer_count(&self) -> usize {
        self.state.read().await.peer_count()
    }

    /// Wire snapshot of the full view
    pub async fn snapshot(&self, now: Datemark) -> Vec<MemberRecord> {
        self.state.read().await.snapshot(now)
    }
}
