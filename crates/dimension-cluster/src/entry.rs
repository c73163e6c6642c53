//! Membership entries and liveness updates
//!
//! A `MemberEntry` is one row of this node's view of the mesh. Rows are
//! only ever mutated by the registry consumer task, which applies
//! `LivenessUpdate`s one at a time in arrival order.

use dimension_core::{Datemark, NodeId};

/// One peer's liveness row in the local membership view
///
/// Invariant: `death` and `zombie` are never both true. Death clears
/// suspicion; suspicion is never raised on a dead entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    /// Stable peer identity
    pub id: NodeId,

    /// Datemark of the newest liveness evidence seen for this peer
    pub keepalive: Datemark,

    /// Peer announced (or was gossiped as) permanently departed
    pub death: bool,

    /// Peer is suspected dead: no fresh keepalive within the zombie threshold
    pub zombie: bool,
}

impl MemberEntry {
    /// Create a fresh alive entry
    pub fn new_alive(id: NodeId, keepalive: Datemark) -> Self {
        Self {
            id,
            keepalive,
            death: false,
            zombie: false,
        }
    }

    /// Create an entry for a peer first seen through a death notice
    pub fn new_dead(id: NodeId, keepalive: Datemark) -> Self {
        Self {
            id,
            keepalive,
            death: true,
            zombie: false,
        }
    }

    /// Whether this peer currently counts as a live mesh member
    pub fn is_alive(&self) -> bool {
        !self.death && !self.zombie
    }
}

/// A single mutation request for the membership registry
///
/// Updates from every source (local keepalive timer, gossip, join, leave,
/// zombie timer expiry) funnel through one queue so that merges never race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessUpdate {
    /// Peer the update is about
    pub id: NodeId,

    /// What kind of evidence arrived
    pub kind: UpdateKind,
}

/// The kinds of liveness evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// Fresh heartbeat evidence, direct or relayed
    Keepalive { keepalive: Datemark },

    /// Departure notice; `keepalive` is the datemark of the notice itself
    Death { keepalive: Datemark },

    /// A zombie timer fired. Only valid if the entry's keepalive still
    /// equals the one the timer was armed against.
    ZombieSuspicion { armed_keepalive: Datemark },
}

impl LivenessUpdate {
    /// Convenience constructor for heartbeat evidence
    pub fn keepalive(id: NodeId, keepalive: Datemark) -> Self {
        Self {
            id,
            kind: UpdateKind::Keepalive { keepalive },
        }
    }

    /// Convenience constructor for a departure notice
    pub fn death(id: NodeId, keepalive: Datemark) -> Self {
        Self {
            id,
            kind: UpdateKind::Death { keepalive },
        }
    }

    /// Convenience constructor for a fired zombie timer
    pub fn zombie_suspicion(id: NodeId, armed_keepalive: Datemark) -> Self {
        Self {
            id,
            kind: UpdateKind::ZombieSuspicion { armed_keepalive },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_alive_flags() {
        let id = NodeId::new("peer-1").unwrap();
        let entry = MemberEntry::new_alive(id.clone(), Datemark::from_ms(1_000));
        assert!(entry.is_alive());

        let dead = MemberEntry::new_dead(id, Datemark::from_ms(1_000));
        assert!(!dead.is_alive());
        assert!(!dead.zombie);
    }
}
