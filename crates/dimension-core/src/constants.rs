//! TigerStyle constants for Dimension
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Mesh Limits
// =============================================================================

/// Maximum number of nodes in a dimension
pub const DIMENSION_NODES_COUNT_MAX: usize = 1000;

/// Maximum length of a node ID in bytes
pub const NODE_ID_LENGTH_BYTES_MAX: usize = 128;

/// Length of a formatted datemark in bytes (`YYYYMMDDHHMMSSffffff`)
pub const DATEMARK_LENGTH_BYTES: usize = 20;

// =============================================================================
// Membership / Gossip
// =============================================================================

/// Interval between this node's own keepalive announcements (2 sec)
pub const KEEPALIVE_INTERVAL_MS_DEFAULT: u64 = 2_000;

/// Silence threshold before a peer is suspected dead (3 min)
pub const ZOMBIE_THRESHOLD_MS_DEFAULT: u64 = 3 * 60 * 1000;

/// Debounce window for coalescing gossip pushes (2 sec)
pub const GOSSIP_DEBOUNCE_MS_DEFAULT: u64 = 2_000;

/// Retry interval after a failed gossip push (linear, not exponential)
pub const GOSSIP_RETRY_INTERVAL_MS: u64 = 1_000;

/// Maximum records in a single gossip batch
pub const GOSSIP_BATCH_COUNT_MAX: usize = 1_000;

/// Depth of the registry's multi-producer update queue
pub const REGISTRY_QUEUE_DEPTH_MAX: usize = 10_000;

/// Depth of the membership event broadcast channel
pub const EVENT_BUS_DEPTH_MAX: usize = 1_024;

// =============================================================================
// Locking
// =============================================================================

/// Lease for a PREVENTING scope before it auto-reverts to UNLOCKED (1 min)
pub const TIMEOUT_PREVENTING_LOCK_MS_DEFAULT: u64 = 60 * 1000;

/// Held-duration after which a LOCKED scope is reported as possibly stuck (5 min)
pub const LOCK_HELD_REPORT_THRESHOLD_MS_DEFAULT: u64 = 5 * 60 * 1000;

/// Minimum quorum size for the lock handshake
pub const QUORUM_SIZE_MIN_DEFAULT: usize = 3;

/// Age after which a peer counts as an adult for quorum selection (10 min)
pub const ADULT_AGE_MS_DEFAULT: u64 = 10 * 60 * 1000;

// =============================================================================
// Network
// =============================================================================

/// Timeout for a single remote call (gossip push, lock handshake)
pub const RPC_TIMEOUT_MS_DEFAULT: u64 = 10 * 1000;

/// Maximum size of a wire message body in bytes (1 MB)
pub const MESSAGE_SIZE_BYTES_MAX: usize = 1024 * 1024;

// Compile-time assertions for constant validity
const _: () = {
    assert!(ZOMBIE_THRESHOLD_MS_DEFAULT > KEEPALIVE_INTERVAL_MS_DEFAULT);
    assert!(GOSSIP_RETRY_INTERVAL_MS <= GOSSIP_DEBOUNCE_MS_DEFAULT);
    assert!(TIMEOUT_PREVENTING_LOCK_MS_DEFAULT >= 1_000);
    assert!(QUORUM_SIZE_MIN_DEFAULT >= 1);
    assert!(DATEMARK_LENGTH_BYTES == 20);
    assert!(DIMENSION_NODES_COUNT_MAX >= 1);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_have_units_in_names() {
        // Documents the naming convention: byte limits end in _BYTES_,
        // time limits in _MS_, count limits in _COUNT_.
        let _: usize = NODE_ID_LENGTH_BYTES_MAX;
        let _: u64 = ZOMBIE_THRESHOLD_MS_DEFAULT;
        let _: usize = DIMENSION_NODES_COUNT_MAX;
    }

    #[test]
    fn test_suspicion_slower_than_keepalive() {
        assert!(ZOMBIE_THRESHOLD_MS_DEFAULT / KEEPALIVE_INTERVAL_MS_DEFAULT >= 3);
    }
}
