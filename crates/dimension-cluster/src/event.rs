//! Membership change events
//!
//! The registry consumer publishes an event for every observable liveness
//! transition. Subscribers (the lock layer, operators, tests) receive them
//! over a broadcast channel; a slow subscriber lags, it never blocks the
//! registry.

use dimension_core::{NodeId, EVENT_BUS_DEPTH_MAX};
use tokio::sync::broadcast;
use tracing::debug;

/// A liveness transition observed by the membership registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberEvent {
    /// Peer entered the mesh (first sighting, or resurrection after death)
    New(NodeId),

    /// Peer recovered from zombie suspicion
    Alive(NodeId),

    /// Peer fell silent past the zombie threshold
    Zombie(NodeId),

    /// Peer departed permanently
    Death(NodeId),
}

impl MemberEvent {
    /// The peer this event is about
    pub fn node(&self) -> &NodeId {
        match self {
            Self::New(id) | Self::Alive(id) | Self::Zombie(id) | Self::Death(id) => id,
        }
    }
}

impl std::fmt::Display for MemberEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New(id) => write!(f, "new({id})"),
            Self::Alive(id) => write!(f, "alive({id})"),
            Self::Zombie(id) => write!(f, "zombie({id})"),
            Self::Death(id) => write!(f, "death({id})"),
        }
    }
}

/// Broadcast fan-out for membership events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MemberEvent>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUS_DEPTH_MAX);
        Self { tx }
    }

    /// Subscribe to membership events from this point forward
    pub fn subscribe(&self) -> broadcast::Receiver<MemberEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: MemberEvent) {
        debug!(%event, "membership event");
        let _ = self.tx.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
