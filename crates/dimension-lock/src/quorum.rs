//! Quorum selection
//!
//! Picks which peers must co-grant a lock. Selection is a pure function
//! of the candidate descriptors and `now_ms`; the orchestrator always
//! adds the local node on top of what is selected here. The result is a
//! bounded, topologically diverse sample, not a majority set.
//!
//! Rules, in order:
//! 1. Peers flagged `ignore_on_lock` never participate.
//! 2. Only adults: peers in the mesh long enough to have a settled view.
//!    A mesh with no adults at all (early bootstrap) falls back to the
//!    longest-standing candidates.
//! 3. Spread over the topology: one representative per distinct route
//!    cost, nearest cost first. Within a cost the most recently modified
//!    peer wins (it has the freshest catalog), then lexicographic id for
//!    determinism.
//! 4. If distinct costs cannot fill the quorum, pad with the remaining
//!    adults, earliest created first.

use dimension_core::{Datemark, NodeId};
use std::collections::HashSet;

/// A lock-quorum candidate as described by the peer directory
///
/// Candidates are expected to be currently-alive mesh members; liveness
/// filtering happens in the directory, against the membership registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDescriptor {
    /// Peer identity
    pub id: NodeId,

    /// When the peer first entered the mesh
    pub created: Datemark,

    /// When the peer's catalog entry last changed
    pub modified: Datemark,

    /// Route cost from the local node; lower is nearer
    pub route_cost: u32,

    /// Peer asked to be left out of lock quorums
    pub ignore_on_lock: bool,
}

fn by_created(a: &&PeerDescriptor, b: &&PeerDescriptor) -> std::cmp::Ordering {
    a.created.cmp(&b.created).then(a.id.cmp(&b.id))
}

/// Select up to `quorum_size_min` remote peers for a lock quorum
pub fn select_quorum(
    candidates: &[PeerDescriptor],
    quorum_size_min: usize,
    adult_age_ms: u64,
    now_ms: u64,
) -> Vec<NodeId> {
    assert!(quorum_size_min > 0, "quorum size must be positive");

    let eligible: Vec<&PeerDescriptor> =
        candidates.iter().filter(|p| !p.ignore_on_lock).collect();

    let mut adults: Vec<&PeerDescriptor> = eligible
        .iter()
        .copied()
        .filter(|p| now_ms.saturating_sub(p.created.as_ms()) >= adult_age_ms)
        .collect();

    if adults.is_empty() {
        // Bootstrap: no peer is old enough, take the longest-standing.
        let mut fallback = eligible;
        fallback.sort_by(by_created);
        return fallback
            .into_iter()
            .take(quorum_size_min)
            .map(|p| p.id.clone())
            .collect();
    }

    if adults.len() <= quorum_size_min {
        adults.sort_by(by_created);
        return adults.into_iter().map(|p| p.id.clone()).collect();
    }

    // One representative per distinct route cost, nearest first; within a
    // cost, freshest catalog first, then id for a stable order.
    adults.sort_by(|a, b| {
        a.route_cost
            .cmp(&b.route_cost)
            .then(b.modified.cmp(&a.modified))
            .then(a.id.cmp(&b.id))
    });

    let mut selected: Vec<NodeId> = Vec::new();
    let mut seen_costs: HashSet<u32> = HashSet::new();
    for peer in &adults {
        if selected.len() == quorum_size_min {
            break;
        }
        if seen_costs.insert(peer.route_cost) {
            selected.push(peer.id.clone());
        }
    }

    if selected.len() < quorum_size_min {
        let chosen: HashSet<&NodeId> = selected.iter().collect();
        let mut pad: Vec<&PeerDescriptor> = adults
            .iter()
            .copied()
            .filter(|p| !chosen.contains(&p.id))
            .collect();
        pad.sort_by(by_created);
        selected.extend(
            pad.into_iter()
                .take(quorum_size_min - selected.len())
                .map(|p| p.id.clone()),
        );
    }

    selected
}
