//! Per-scope lock rows
//!
//! A `Locker` is one scope's row in the local lock table. The state
//! machine is UNLOCKED -> PREVENTING -> LOCKED -> UNLOCKED; PREVENTING
//! also reverts to UNLOCKED when its lease lapses.

use crate::error::LockResult;
use crate::scope::Scope;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Lock state of one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LockState {
    /// Scope is free
    Unlocked,

    /// An applicant holds a short lease while the quorum handshake runs
    Preventing,

    /// An applicant holds the scope exclusively
    Locked,
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Unlocked => f.write_str("UNLOCKED"),
            LockState::Preventing => f.write_str("PREVENTING"),
            LockState::Locked => f.write_str("LOCKED"),
        }
    }
}

/// Identity of a lock requester
///
/// Opaque to the lock layer; callers typically use an operation id so
/// retries of the same operation compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Applicant(String);

impl Applicant {
    /// Create an applicant identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Applicant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Applicant {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One scope's row in the lock table
///
/// Invariant: `applicant` is `Some` exactly when `state` is not
/// `Unlocked`, and `since_ms` records when that state was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locker {
    /// The scope this row governs
    pub scope: Scope,

    /// Current state
    pub state: LockState,

    /// Holder of the current prevention or lock
    pub applicant: Option<Applicant>,

    /// When the current state was entered, ms since epoch
    pub since_ms: u64,
}

impl Locker {
    /// Create an unlocked row for a scope
    pub fn unlocked(scope: Scope) -> Self {
        Self {
            scope,
            state: LockState::Unlocked,
            applicant: None,
            since_ms: 0,
        }
    }

    /// Whether the row satisfies its state/applicant invariant
    pub fn is_consistent(&self) -> bool {
        (self.state == LockState::Unlocked) == self.applicant.is_none()
    }

    /// Whether `applicant` currently holds this row
    pub fn held_by(&self, applicant: &Applicant) -> bool {
        self.applicant.as_ref() == Some(applicant)
    }
}

/// Persistence seam for lock rows
///
/// Rows survive process restart so a rebooted node does not forget a
/// lock it granted. The memory impl backs tests and nodes that accept
/// ephemeral lock state.
#[async_trait]
pub trait LockerStore: Send + Sync + std::fmt::Debug {
    /// Load all rows, bootstrapping one UNLOCKED row per scope
    async fn load(&self) -> LockResult<Vec<Locker>>;

    /// Persist one row after a transition
    async fn save(&self, locker: &Locker) -> LockResult<()>;
}

/// In-memory `LockerStore`
#[derive(Debug, Default)]
pub struct MemoryLockerStore {
    rows: RwLock<HashMap<Scope, Locker>>,
}

impl MemoryLockerStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockerStore for MemoryLockerStore {
    async fn load(&self) -> LockResult<Vec<Locker>> {
        let rows = self.rows.read().await;
        Ok(Scope::ALL
            .into_iter()
            .map(|scope| rows.get(&scope).cloned().unwrap_or(Locker::unlocked(scope)))
            .collect())
    }

    async fn save(&self, locker: &Locker) -> LockResult<()> {
        self.rows.write().await.insert(locker.scope, locker.clone());
        Ok(())
    }
}
