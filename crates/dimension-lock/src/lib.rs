//! Dimension Lock
//!
//! Scope-based distributed locking for the Dimension peer mesh.
//!
//! # Architecture
//!
//! Each node runs a `LockCoordinator` over a three-row `LockTable`, one
//! row per `Scope`. Scopes are strictly prioritized: active
//! higher-priority scopes block prevention of lower ones. PREVENTING
//! carries a short lease so crashed requesters can never wedge a scope;
//! LOCKED is released only by its holder and surfaces long holds through
//! status.
//!
//! `LockOrchestrator` runs the mesh-wide handshake: select a quorum of
//! adult peers, prevent everywhere, then promote to locked, rolling back
//! on the first refusal or unreachable peer.

pub mod coordinator;
pub mod error;
pub mod locker;
pub mod orchestrator;
pub mod quorum;
pub mod scope;

pub use coordinator::{
    CatalogVersion, FixedCatalogVersion, LockCoordinator, LockTable, PreventOutcome, ScopeStatus,
    TransitionOutcome,
};
pub use error::{LockError, LockResult};
pub use locker::{Applicant, LockState, Locker, LockerStore, MemoryLockerStore};
pub use orchestrator::{
    LockAction, LockClient, LockGrant, LockHandler, LockOrchestrator, LockRefusal, LockReply,
    PeerDirectory, PreventRequest, RefusalReason, TransitionRequest, TransportLockClient,
    PATH_LOCKER_LOCK, PATH_LOCKER_PREVENT, PATH_LOCKER_UNLOCK,
};
pub use quorum::{select_quorum, PeerDescriptor};
pub use scope::Scope;
