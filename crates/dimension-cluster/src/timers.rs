//! Zombie suspicion timers
//!
//! One logical timer per silent peer, all multiplexed onto a single
//! min-heap so a lone sweeper task can serve the whole mesh. Rearming or
//! cancelling bumps a per-node generation; stale heap entries are dropped
//! lazily when they surface.

use dimension_core::{Datemark, NodeId};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Mutex;

/// A scheduled zombie suspicion check
#[derive(Debug, Clone, PartialEq, Eq)]
struct Deadline {
    due_ms: u64,
    generation: u64,
    node: NodeId,
    armed_keepalive: Datemark,
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due_ms
            .cmp(&other.due_ms)
            .then(self.generation.cmp(&other.generation))
    }
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// A zombie timer that fired and is still current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueSuspicion {
    /// Peer that fell silent
    pub node: NodeId,

    /// Keepalive the timer was armed against; the registry only applies
    /// the suspicion if the entry still carries this exact datemark
    pub armed_keepalive: Datemark,
}

#[derive(Debug, Default)]
struct TimerInner {
    heap: BinaryHeap<Reverse<Deadline>>,
    // node -> generation of the only live deadline for that node
    generations: HashMap<NodeId, u64>,
    next_generation: u64,
}

/// Min-heap timer set for zombie suspicion
///
/// At most one live deadline per node. `arm` supersedes any previous
/// deadline for the same node; `cancel` invalidates it without touching
/// the heap.
#[derive(Debug)]
pub struct ZombieTimerSet {
    inner: Mutex<TimerInner>,
    threshold_ms: u64,
}

impl ZombieTimerSet {
    /// Create a timer set with the given zombie threshold
    pub fn new(threshold_ms: u64) -> Self {
        assert!(threshold_ms > 0, "zombie threshold must be positive");

        Self {
            inner: Mutex::new(TimerInner::default()),
            threshold_ms,
        }
    }

    /// Arm (or rearm) the timer for a node
    ///
    /// The deadline is `now_ms + threshold`; any previous deadline for the
    /// node becomes stale.
    pub fn arm(&self, node: NodeId, armed_keepalive: Datemark, now_ms: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.generations.insert(node.clone(), generation);
        inner.heap.push(Reverse(Deadline {
            due_ms: now_ms + self.threshold_ms,
            generation,
            node,
            armed_keepalive,
        }));
    }

    /// Cancel the timer for a node, if any
    pub fn cancel(&self, node: &NodeId) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.generations.remove(node);
    }

    /// Pop every deadline due at `now_ms`, skipping superseded ones
    ///
    /// Fired timers are one-shot: a popped node has no live deadline until
    /// it is rearmed.
    pub fn pop_due(&self, now_ms: u64) -> Vec<DueSuspicion> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut due = Vec::new();

        while let Some(Reverse(head)) = inner.heap.peek() {
            if head.due_ms > now_ms {
                break;
            }
            let Reverse(deadline) = inner.heap.pop().unwrap();
            let live = inner.generations.get(&deadline.node) == Some(&deadline.generation);
            if live {
                inner.generations.remove(&deadline.node);
                due.push(DueSuspicion {
                    node: deadline.node,
                    armed_keepalive: deadline.armed_keepalive,
                });
            }
        }

        due
    }

    /// Earliest live deadline, if any
    ///
    /// Drops stale heap heads as a side effect.
    pub fn next_due_ms(&self) -> Option<u64> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        while let Some(Reverse(head)) = inner.heap.peek() {
            let live = inner.generations.get(&head.node) == Some(&head.generation);
            if live {
                return Some(head.due_ms);
            }
            inner.heap.pop();
        }

        None
    }

    /// Number of nodes with a live deadline
    pub fn armed_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.generations.len()
    }

    /// Drop every timer
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.heap.clear();
        inner.generations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeId {
        NodeId::new(id).unwrap()
    }

    #[test]
    fn test_timer_fires_at_threshold() {
        let timers = ZombieTimerSet::new(100);
        timers.arm(node("a"), Datemark::from_ms(1_000), 1_000);

        assert!(timers.pop_due(1_099).is_empty());

        let due = timers.pop_due(1_100);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].node, node("a"));
        assert_eq!(due[0].armed_keepalive, Datemark::from_ms(1_000));
    }

    #[test]
    fn test_rearm_supersedes_previous_deadline() {
        let timers = ZombieTimerSet::new(100);
        timers.arm(node("a"), Datemark::from_ms(1_000), 1_000);
        timers.arm(node("a"), Datemark::from_ms(1_050), 1_050);

        // The original 1_100 deadline is stale.
        assert!(timers.pop_due(1_100).is_empty());

        let due = timers.pop_due(1_150);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].armed_keepalive, Datemark::from_ms(1_050));
    }

    #[test]
    fn test_cancel_suppresses_firing() {
        let timers = ZombieTimerSet::new(100);
        timers.arm(node("a"), Datemark::from_ms(1_000), 1_000);
        timers.cancel(&node("a"));

        assert!(timers.pop_due(2_000).is_empty());
        assert_eq!(timers.armed_count(), 0);
    }

    #[test]
    fn test_fired_timer_is_one_shot() {
        let timers = ZombieTimerSet::new(100);
        timers.arm(node("a"), Datemark::from_ms(1_000), 1_000);

        assert_eq!(timers.pop_due(1_100).len(), 1);
        assert!(timers.pop_due(9_999).is_empty());
    }

    #[test]
    fn test_next_due_skips_stale_entries() {
        let timers = ZombieTimerSet::new(100);
        timers.arm(node("a"), Datemark::from_ms(1_000), 1_000);
        timers.arm(node("b"), Datemark::from_ms(1_000), 1_050);
        timers.cancel(&node("a"));

        assert_eq!(timers.next_due_ms(), Some(1_150));
    }

    #[test]
    fn test_many_timers_fire_in_order() {
        let timers = ZombieTimerSet::new(100);
        for i in 0..10u64 {
            timers.arm(node(&format!("n{i}")), Datemark::from_ms(i), 1_000 + i * 10);
        }
        assert_eq!(timers.armed_count(), 10);

        let due = timers.pop_due(1_140);
        assert_eq!(due.len(), 5);
        assert_eq!(due[0].node, node("n0"));
        assert_eq!(due[4].node, node("n4"));
        assert_eq!(timers.armed_count(), 5);
    }
}
