//! Dimension Cluster
//!
//! Membership, failure detection, and gossip for the Dimension peer mesh.
//!
//! # Architecture
//!
//! Every liveness observation becomes a `LivenessUpdate` funnelled through
//! one bounded queue into `MembershipState`, the synchronous merge core.
//! Merges are last-writer-wins by datemark; the applied outcome drives the
//! zombie timer set, the gossip disseminator, and the event bus. `Cluster`
//! owns the background tasks and the wire handlers.
//!
//! Zombie suspicion is local judgement and never gossiped; death and
//! keepalive records spread through debounced neighbour pushes.

pub mod cluster;
pub mod entry;
pub mod error;
pub mod event;
pub mod gossip;
pub mod registry;
pub mod timers;
pub mod transport;
pub mod wire;

pub use cluster::{Cluster, ClusterHandler};
pub use entry::{LivenessUpdate, MemberEntry, UpdateKind};
pub use error::{ClusterError, ClusterResult};
pub use event::{EventBus, MemberEvent};
pub use gossip::Disseminator;
pub use registry::{ApplyOutcome, MembershipRegistry, MembershipState, TimerAction};
pub use timers::{DueSuspicion, ZombieTimerSet};
pub use transport::{
    MemoryMesh, MemoryTransport, Neighbours, RequestHandler, StaticNeighbours, Transport,
};
pub use wire::{
    GossipPush, JoinRequest, JoinResponse, LeaveNotice, MemberRecord, PATH_CLUSTER,
    PATH_CLUSTER_IN, PATH_CLUSTER_OUT,
};
