//! Dimension Core
//!
//! Core types, errors, and constants for the Dimension peer mesh.
//!
//! # Overview
//!
//! A dimension is a partially-connected mesh of autonomous nodes that keep
//! an eventually-consistent view of each other's liveness and coordinate
//! exclusive access to a gossip-replicated catalog. This crate holds what
//! every member crate shares:
//!
//! - `NodeId`: validated, stable peer identity
//! - `Datemark`: the mesh-wide logical timestamp and its wire format
//! - `TimeProvider`: clock injection for deterministic timer tests
//! - Configuration and explicit limits
//!
//! # TigerStyle
//!
//! This workspace follows explicit-limit engineering conventions:
//! - Safety > Performance > Developer Experience
//! - Limits with big-endian naming and units (e.g. `ZOMBIE_THRESHOLD_MS_DEFAULT`)
//! - Assertions on invariants; validation at every boundary

pub mod config;
pub mod constants;
pub mod datemark;
pub mod error;
pub mod io;
pub mod node;
pub mod telemetry;

pub use config::{ClusterConfig, DimensionConfig, LockConfig, NodeConfig};
pub use constants::*;
pub use datemark::Datemark;
pub use error::{Error, Result};
pub use io::{TimeProvider, WallClockTime};
pub use node::NodeId;
pub use telemetry::{init_telemetry, TelemetryConfig};
