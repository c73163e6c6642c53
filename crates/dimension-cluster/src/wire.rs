//! Wire messages for membership and gossip
//!
//! All mesh traffic is JSON over the node transport. Datemarks serialize
//! as their fixed 20-byte wire string, so payloads sort and compare the
//! same on every peer.

use crate::entry::LivenessUpdate;
use dimension_core::{Datemark, NodeId};
use serde::{Deserialize, Serialize};

/// Path for gossip pushes
pub const PATH_CLUSTER: &str = "/cluster";

/// Path for join requests
pub const PATH_CLUSTER_IN: &str = "/cluster_in";

/// Path for leave notices
pub const PATH_CLUSTER_OUT: &str = "/cluster_out";

/// One peer's liveness as carried on the wire
///
/// Zombie suspicion is deliberately absent: it is a local judgement,
/// re-derived independently by every node, never gossiped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Peer identity
    pub id: NodeId,

    /// Newest liveness evidence the sender holds for this peer
    pub keepalive: Datemark,

    /// Whether the sender believes this peer departed permanently
    #[serde(default)]
    pub death: bool,
}

impl MemberRecord {
    /// Convert a received record into a registry update
    pub fn into_update(self) -> LivenessUpdate {
        if self.death {
            LivenessUpdate::death(self.id, self.keepalive)
        } else {
            LivenessUpdate::keepalive(self.id, self.keepalive)
        }
    }
}

/// Gossip push: a batch of membership records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipPush {
    /// Records being disseminated
    pub cluster: Vec<MemberRecord>,
}

/// Request sent by a node (re)entering the mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// The joiner's current keepalive datemark
    pub keepalive: Datemark,

    /// Route advertisements for the routing layer; opaque here
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<serde_json::Value>,
}

/// Response to a join: the receiver's full membership view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    /// Snapshot of every known member, including the responder itself
    pub cluster: Vec<MemberRecord>,

    /// The responder's current neighbour set, for mesh discovery
    pub neighbours: Vec<NodeId>,
}

/// Notice sent by a node departing the mesh gracefully
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveNotice {
    /// Datemark of the departure; merges like any death record
    pub death: Datemark,
}
