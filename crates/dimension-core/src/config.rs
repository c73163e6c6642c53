//! Configuration for Dimension
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for a dimension node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionConfig {
    /// Node identity configuration
    #[serde(default)]
    pub node: NodeConfig,

    /// Membership and gossip configuration
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Scope-lock configuration
    #[serde(default)]
    pub lock: LockConfig,
}

impl DimensionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.lock.validate()?;
        Ok(())
    }
}

/// Node identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Stable node identifier (required; membership history is keyed by it)
    #[serde(default)]
    pub node_id: Option<String>,

    /// Address to bind for the HTTP transport (default: 0.0.0.0:5000)
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            bind_address: default_bind_address(),
        }
    }
}

/// Membership and gossip configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Interval between this node's own keepalive announcements
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,

    /// Heartbeat silence before a peer is suspected dead (zombie)
    #[serde(default = "default_zombie_threshold_ms")]
    pub zombie_threshold_ms: u64,

    /// Debounce window for coalescing gossip pushes
    #[serde(default = "default_gossip_debounce_ms")]
    pub gossip_debounce_ms: u64,

    /// Timeout for a single remote call
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
}

fn default_keepalive_interval_ms() -> u64 {
    KEEPALIVE_INTERVAL_MS_DEFAULT
}

fn default_zombie_threshold_ms() -> u64 {
    ZOMBIE_THRESHOLD_MS_DEFAULT
}

fn default_gossip_debounce_ms() -> u64 {
    GOSSIP_DEBOUNCE_MS_DEFAULT
}

fn default_rpc_timeout_ms() -> u64 {
    RPC_TIMEOUT_MS_DEFAULT
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_ms: KEEPALIVE_INTERVAL_MS_DEFAULT,
            zombie_threshold_ms: ZOMBIE_THRESHOLD_MS_DEFAULT,
            gossip_debounce_ms: GOSSIP_DEBOUNCE_MS_DEFAULT,
            rpc_timeout_ms: RPC_TIMEOUT_MS_DEFAULT,
        }
    }
}

impl ClusterConfig {
    /// Validate timing relationships
    pub fn validate(&self) -> Result<()> {
        if self.zombie_threshold_ms <= self.keepalive_interval_ms {
            return Err(Error::InvalidConfig {
                reason: "zombie threshold must exceed keepalive interval".into(),
            });
        }
        if self.gossip_debounce_ms == 0 {
            return Err(Error::InvalidConfig {
                reason: "gossip debounce must be positive".into(),
            });
        }
        if self.rpc_timeout_ms == 0 {
            return Err(Error::InvalidConfig {
                reason: "RPC timeout must be positive".into(),
            });
        }
        Ok(())
    }

    /// Get RPC timeout as Duration
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    /// Create configuration for testing with short intervals
    pub fn for_testing() -> Self {
        Self {
            keepalive_interval_ms: 20,
            zombie_threshold_ms: 100,
            gossip_debounce_ms: 10,
            rpc_timeout_ms: 1_000,
        }
    }
}

/// Scope-lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lease for a PREVENTING scope before it auto-reverts to UNLOCKED
    #[serde(default = "default_preventing_timeout_ms")]
    pub preventing_timeout_ms: u64,

    /// Held-duration after which a LOCKED scope is reported as possibly stuck
    #[serde(default = "default_held_report_threshold_ms")]
    pub held_report_threshold_ms: u64,

    /// Minimum quorum size for the lock handshake
    #[serde(default = "default_quorum_size_min")]
    pub quorum_size_min: usize,

    /// Age after which a peer counts as an adult for quorum selection
    #[serde(default = "default_adult_age_ms")]
    pub adult_age_ms: u64,
}

fn default_preventing_timeout_ms() -> u64 {
    TIMEOUT_PREVENTING_LOCK_MS_DEFAULT
}

fn default_held_report_threshold_ms() -> u64 {
    LOCK_HELD_REPORT_THRESHOLD_MS_DEFAULT
}

fn default_quorum_size_min() -> usize {
    QUORUM_SIZE_MIN_DEFAULT
}

fn default_adult_age_ms() -> u64 {
    ADULT_AGE_MS_DEFAULT
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            preventing_timeout_ms: TIMEOUT_PREVENTING_LOCK_MS_DEFAULT,
            held_report_threshold_ms: LOCK_HELD_REPORT_THRESHOLD_MS_DEFAULT,
            quorum_size_min: QUORUM_SIZE_MIN_DEFAULT,
            adult_age_ms: ADULT_AGE_MS_DEFAULT,
        }
    }
}

impl LockConfig {
    /// Validate lock timing and sizing
    pub fn validate(&self) -> Result<()> {
        if self.preventing_timeout_ms == 0 {
            return Err(Error::InvalidConfig {
                reason: "preventing timeout must be positive".into(),
            });
        }
        if self.quorum_size_min == 0 {
            return Err(Error::InvalidConfig {
                reason: "minimum quorum size must be positive".into(),
            });
        }
        Ok(())
    }

    /// Create configuration for testing with short timeouts
    pub fn for_testing() -> Self {
        Self {
            preventing_timeout_ms: 100,
            held_report_threshold_ms: 500,
            quorum_size_min: 2,
            adult_age_ms: 1_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_valid() {
        let config = DimensionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_for_testing_is_valid() {
        let config = DimensionConfig {
            node: NodeConfig::default(),
            cluster: ClusterConfig::for_testing(),
            lock: LockConfig::for_testing(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_inverted_timing() {
        let config = ClusterConfig {
            keepalive_interval_ms: 1_000,
            zombie_threshold_ms: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_zero_quorum() {
        let config = LockConfig {
            quorum_size_min: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: DimensionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(
            config.cluster.zombie_threshold_ms,
            ZOMBIE_THRESHOLD_MS_DEFAULT
        );
        assert_eq!(config.lock.quorum_size_min, QUORUM_SIZE_MIN_DEFAULT);
    }
}
