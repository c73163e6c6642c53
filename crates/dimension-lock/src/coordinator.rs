//! Local lock coordination
//!
//! `LockTable` is the synchronous state machine: three `Locker` rows,
//! every decision a pure function of the rows, the incoming request, and
//! an explicit `now_ms`. `LockCoordinator` wraps it in a mutex, injects
//! the clock and catalog version, and runs the lease expiry sweep.
//!
//! PREVENTING carries a lease so a crashed orchestrator can never wedge
//! a scope. LOCKED carries none: releasing is the holder's job, and a
//! long hold is surfaced through `status` instead of being broken.

use crate::error::LockResult;
use crate::locker::{Applicant, LockState, Locker, LockerStore, MemoryLockerStore};
use crate::scope::Scope;
use dimension_core::{Datemark, LockConfig, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

/// Source of the locally replicated catalog's version datemark
///
/// Prevention refuses applicants whose view of the catalog is older than
/// ours; they would lock against data they have not seen.
pub trait CatalogVersion: Send + Sync + std::fmt::Debug {
    /// Datemark of the newest catalog state this node holds
    fn current(&self) -> Datemark;
}

/// Fixed catalog version, for nodes without a catalog and for tests
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedCatalogVersion(pub Datemark);

impl CatalogVersion for FixedCatalogVersion {
    fn current(&self) -> Datemark {
        self.0
    }
}

/// Outcome of a prevention attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreventOutcome {
    /// Scope is now PREVENTING for the applicant
    Accepted,

    /// A scope (the target or a higher-priority one) is busy
    Busy { scope: Scope, state: LockState },

    /// The applicant's catalog view is older than ours
    Stale { catalog: Datemark },
}

/// Outcome of a lock or unlock transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Transition applied
    Accepted,

    /// Transition refused; current state and holder for diagnostics
    Denied {
        state: LockState,
        holder: Option<Applicant>,
    },
}

/// One scope's externally visible status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeStatus {
    /// The scope
    pub scope: Scope,

    /// Current state
    pub state: LockState,

    /// Current holder, if any
    pub applicant: Option<Applicant>,

    /// How long the current state has been held, ms
    pub held_ms: u64,

    /// LOCKED longer than the report threshold; likely a leaked lock
    pub possibly_stuck: bool,
}

#[derive(Debug, Clone)]
struct ScopeCell {
    locker: Locker,
    lease_deadline_ms: Option<u64>,
}

/// Synchronous three-row lock state machine
#[derive(Debug)]
pub struct LockTable {
    cells: [ScopeCell; 3],
}

impl LockTable {
    /// Create a table with every scope unlocked
    pub fn new() -> Self {
        let cell = |scope| ScopeCell {
            locker: Locker::unlocked(scope),
            lease_deadline_ms: None,
        };
        Self {
            cells: [
                cell(Scope::Upgrade),
                cell(Scope::Orchestration),
                cell(Scope::Catalog),
            ],
        }
    }

    fn cell(&self, scope: Scope) -> &ScopeCell {
        &self.cells[scope.priority() as usize]
    }

    fn cell_mut(&mut self, scope: Scope) -> &mut ScopeCell {
        &mut self.cells[scope.priority() as usize]
    }

    /// Attempt to move a scope to PREVENTING
    ///
    /// Refusal order: stale catalog view first, then higher-priority
    /// activity, then the target scope's own state. An ORCHESTRATION
    /// re-prevent by the current holder is idempotent and refreshes the
    /// lease, so a retried orchestration request never deadlocks on its
    /// own earlier attempt.
    pub fn prevent(
        &mut self,
        scope: Scope,
        applicant: &Applicant,
        datemark: Datemark,
        catalog: Datemark,
        now_ms: u64,
        lease_ms: u64,
    ) -> PreventOutcome {
        assert!(lease_ms > 0, "prevention lease must be positive");

        // Upgrades run against the catalog itself and are exempt.
        if scope != Scope::Upgrade && datemark < catalog {
            return PreventOutcome::Stale { catalog };
        }

        for higher in scope.higher_priority() {
            let cell = self.cell(higher);
            if cell.locker.state != LockState::Unlocked {
                return PreventOutcome::Busy {
                    scope: higher,
                    state: cell.locker.state,
                };
            }
        }

        let cell = self.cell_mut(scope);
        match cell.locker.state {
            LockState::Unlocked => {
                cell.locker.state = LockState::Preventing;
                cell.locker.applicant = Some(applicant.clone());
                cell.locker.since_ms = now_ms;
                cell.lease_deadline_ms = Some(now_ms + lease_ms);
                debug_assert!(cell.locker.is_consistent());
                PreventOutcome::Accepted
            }
            LockState::Preventing
                if scope == Scope::Orchestration && cell.locker.held_by(applicant) =>
            {
                cell.lease_deadline_ms = Some(now_ms + lease_ms);
                PreventOutcome::Accepted
            }
            // A locked orchestration holder re-preventing is also a no-op
            // success; retried orchestration runs must not deadlock on
            // their own earlier attempt.
            LockState::Locked
                if scope == Scope::Orchestration && cell.locker.held_by(applicant) =>
            {
                PreventOutcome::Accepted
            }
            state => PreventOutcome::Busy { scope, state },
        }
    }

    /// Promote PREVENTING to LOCKED; only the preventing applicant may
    pub fn lock(&mut self, scope: Scope, applicant: &Applicant, now_ms: u64) -> TransitionOutcome {
        let cell = self.cell_mut(scope);
        if cell.locker.state == LockState::Preventing && cell.locker.held_by(applicant) {
            cell.locker.state = LockState::Locked;
            cell.locker.since_ms = now_ms;
            cell.lease_deadline_ms = None;
            debug_assert!(cell.locker.is_consistent());
            TransitionOutcome::Accepted
        } else {
            TransitionOutcome::Denied {
                state: cell.locker.state,
                holder: cell.locker.applicant.clone(),
            }
        }
    }

    /// Release a scope held by the applicant
    ///
    /// Only PREVENTING or LOCKED with a matching applicant is released;
    /// an UNLOCKED scope answers Denied so a caller learns its hold is
    /// already gone (a lapsed lease, typically).
    pub fn unlock(&mut self, scope: Scope, applicant: &Applicant) -> TransitionOutcome {
        let cell = self.cell_mut(scope);
        match cell.locker.state {
            LockState::Unlocked => TransitionOutcome::Denied {
                state: LockState::Unlocked,
                holder: None,
            },
            _ if cell.locker.held_by(applicant) => {
                cell.locker = Locker::unlocked(scope);
                cell.lease_deadline_ms = None;
                TransitionOutcome::Accepted
            }
            state => TransitionOutcome::Denied {
                state,
                holder: cell.locker.applicant.clone(),
            },
        }
    }

    /// Revert every PREVENTING row whose lease lapsed
    pub fn expire_stale(&mut self, now_ms: u64) -> Vec<(Scope, Applicant)> {
        let mut expired = Vec::new();
        for cell in &mut self.cells {
            if cell.locker.state != LockState::Preventing {
                continue;
            }
            let lapsed = cell.lease_deadline_ms.is_some_and(|d| d <= now_ms);
            if lapsed {
                let scope = cell.locker.scope;
                if let Some(applicant) = cell.locker.applicant.take() {
                    expired.push((scope, applicant));
                }
                cell.locker = Locker::unlocked(scope);
                cell.lease_deadline_ms = None;
            }
        }
        expired
    }

    /// Status of every scope
    pub fn status(&self, now_ms: u64, held_report_threshold_ms: u64) -> Vec<ScopeStatus> {
        self.cells
            .iter()
            .map(|cell| {
                let held_ms = if cell.locker.state == LockState::Unlocked {
                    0
                } else {
                    now_ms.saturating_sub(cell.locker.since_ms)
                };
                ScopeStatus {
                    scope: cell.locker.scope,
                    state: cell.locker.state,
                    applicant: cell.locker.applicant.clone(),
                    held_ms,
                    possibly_stuck: cell.locker.state == LockState::Locked
                        && held_ms >= held_report_threshold_ms,
                }
            })
            .collect()
    }

    /// Current state of one scope
    pub fn state_of(&self, scope: Scope) -> LockState {
        self.cell(scope).locker.state
    }

    /// Current row of one scope
    pub fn row(&self, scope: Scope) -> &Locker {
        &self.cell(scope).locker
    }

    /// Install a persisted row
    ///
    /// A restored PREVENTING row gets a fresh lease; its original
    /// deadline did not survive the restart, and re-arming keeps the
    /// escape hatch intact.
    pub fn restore(&mut self, row: Locker, now_ms: u64, lease_ms: u64) {
        let scope = row.scope;
        let lease = match row.state {
            LockState::Preventing => Some(now_ms + lease_ms),
            _ => None,
        };
        let cell = self.cell_mut(scope);
        cell.locker = row;
        cell.lease_deadline_ms = lease;
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Async shell around the lock table
#[derive(Debug)]
pub struct LockCoordinator {
    table: Mutex<LockTable>,
    store: Arc<dyn LockerStore>,
    catalog: Arc<dyn CatalogVersion>,
    time: Arc<dyn TimeProvider>,
    config: LockConfig,
}

impl LockCoordinator {
    /// Create a coordinator with every scope unlocked and ephemeral rows
    pub fn new(
        config: LockConfig,
        catalog: Arc<dyn CatalogVersion>,
        time: Arc<dyn TimeProvider>,
    ) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(LockTable::new()),
            store: Arc::new(MemoryLockerStore::new()),
            catalog,
            time,
            config,
        })
    }

    /// Open a coordinator over a persistent store, restoring its rows
    pub async fn open(
        config: LockConfig,
        catalog: Arc<dyn CatalogVersion>,
        time: Arc<dyn TimeProvider>,
        store: Arc<dyn LockerStore>,
    ) -> LockResult<Arc<Self>> {
        let mut table = LockTable::new();
        let now_ms = time.now_ms();
        for row in store.load().await? {
            table.restore(row, now_ms, config.preventing_timeout_ms);
        }
        Ok(Arc::new(Self {
            table: Mutex::new(table),
            store,
            catalog,
            time,
            config,
        }))
    }

    /// Persist one scope's current row; failures are logged, not raised
    async fn persist(&self, scope: Scope) {
        let row = self.table.lock().await.row(scope).clone();
        if let Err(error) = self.store.save(&row).await {
            warn!(%scope, %error, "lock row not persisted");
        }
    }

    /// Attempt to move a scope to PREVENTING
    pub async fn prevent(
        &self,
        scope: Scope,
        applicant: &Applicant,
        datemark: Datemark,
    ) -> PreventOutcome {
        let outcome = self.table.lock().await.prevent(
            scope,
            applicant,
            datemark,
            self.catalog.current(),
            self.time.now_ms(),
            self.config.preventing_timeout_ms,
        );
        info!(%scope, %applicant, ?outcome, "prevent");
        if outcome == PreventOutcome::Accepted {
            self.persist(scope).await;
        }
        outcome
    }

    /// Promote PREVENTING to LOCKED
    pub async fn lock(&self, scope: Scope, applicant: &Applicant) -> TransitionOutcome {
        let outcome = self
            .table
            .lock()
            .await
            .lock(scope, applicant, self.time.now_ms());
        info!(%scope, %applicant, ?outcome, "lock");
        if outcome == TransitionOutcome::Accepted {
            self.persist(scope).await;
        }
        outcome
    }

    /// Release a scope
    pub async fn unlock(&self, scope: Scope, applicant: &Applicant) -> TransitionOutcome {
        let outcome = self.table.lock().await.unlock(scope, applicant);
        info!(%scope, %applicant, ?outcome, "unlock");
        if outcome == TransitionOutcome::Accepted {
            self.persist(scope).await;
        }
        outcome
    }

    /// Expire lapsed prevention leases now
    pub async fn expire_stale(&self) -> Vec<(Scope, Applicant)> {
        let expired = self.table.lock().await.expire_stale(self.time.now_ms());
        for (scope, applicant) in &expired {
            warn!(%scope, %applicant, "prevention lease lapsed, scope released");
            self.persist(*scope).await;
        }
        expired
    }

    /// Status of every scope, warning on possibly stuck locks
    pub async fn status(&self) -> Vec<ScopeStatus> {
        let status = self
            .table
            .lock()
            .await
            .status(self.time.now_ms(), self.config.held_report_threshold_ms);
        for entry in &status {
            if entry.possibly_stuck {
                warn!(
                    scope = %entry.scope,
                    held_ms = entry.held_ms,
                    "scope locked past report threshold"
                );
            }
        }
        status
    }

    /// Current state of one scope
    pub async fn state_of(&self, scope: Scope) -> LockState {
        self.table.lock().await.state_of(scope)
    }

    /// Run the lease expiry sweep until shutdown
    pub async fn run_expiry(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        let sweep_ms = (self.config.preventing_timeout_ms / 4).max(10);
        loop {
            tokio::select! {
                _ = self.time.sleep_ms(sweep_ms) => {}
                _ = shutdown.recv() => return,
            }
            self.expire_stale().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn applicant(id: &str) -> Applicant {
        Applicant::new(id)
    }

    /// Manually advanced clock for deterministic expiry tests
    #[derive(Debug, Default)]
    struct TestClock {
        now_ms: AtomicU64,
    }

    impl TestClock {
        fn advance_ms(&self, ms: u64) {
            self.now_ms.fetch_add(ms, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TimeProvider for TestClock {
        fn now_ms(&self) -> u64 {
            self.now_ms.load(Ordering::SeqCst)
        }

        async fn sleep_ms(&self, _ms: u64) {
            tokio::task::yield_now().await;
        }
    }

    fn accepted_prevent(table: &mut LockTable, scope: Scope, who: &str, now_ms: u64) {
        let outcome = table.prevent(
            scope,
            &applicant(who),
            Datemark::from_ms(now_ms),
            Datemark::from_ms(0),
            now_ms,
            1_000,
        );
        assert_eq!(outcome, PreventOutcome::Accepted);
    }

    #[test]
    fn test_prevent_from_unlocked_is_accepted() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);
        assert_eq!(table.state_of(Scope::Catalog), LockState::Preventing);
    }

    #[test]
    fn test_prevent_refuses_busy_scope() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);

        let outcome = table.prevent(
            Scope::Catalog,
            &applicant("op-2"),
            Datemark::from_ms(1_000),
            Datemark::from_ms(0),
            1_000,
            1_000,
        );
        assert_eq!(
            outcome,
            PreventOutcome::Busy {
                scope: Scope::Catalog,
                state: LockState::Preventing
            }
        );
    }

    #[test]
    fn test_higher_priority_scope_blocks_lower() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Upgrade, "upgrade-1", 1_000);

        let outcome = table.prevent(
            Scope::Catalog,
            &applicant("op-1"),
            Datemark::from_ms(1_000),
            Datemark::from_ms(0),
            1_000,
            1_000,
        );
        assert_eq!(
            outcome,
            PreventOutcome::Busy {
                scope: Scope::Upgrade,
                state: LockState::Preventing
            }
        );
    }

    #[test]
    fn test_lower_priority_scope_does_not_block_higher() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);
        accepted_prevent(&mut table, Scope::Upgrade, "upgrade-1", 1_000);
    }

    #[test]
    fn test_stale_datemark_is_refused_except_for_upgrade() {
        let mut table = LockTable::new();
        let catalog = Datemark::from_ms(5_000);

        let outcome = table.prevent(
            Scope::Catalog,
            &applicant("op-1"),
            Datemark::from_ms(4_000),
            catalog,
            1_000,
            1_000,
        );
        assert_eq!(outcome, PreventOutcome::Stale { catalog });

        let outcome = table.prevent(
            Scope::Upgrade,
            &applicant("upgrade-1"),
            Datemark::from_ms(4_000),
            catalog,
            1_000,
            1_000,
        );
        assert_eq!(outcome, PreventOutcome::Accepted);
    }

    #[test]
    fn test_orchestration_re_prevent_is_idempotent() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Orchestration, "op-1", 1_000);
        // Same applicant again: accepted, lease refreshed.
        accepted_prevent(&mut table, Scope::Orchestration, "op-1", 1_500);

        // Original lease would have lapsed at 2_000; the refresh moved it.
        assert!(table.expire_stale(2_200).is_empty());
        assert_eq!(table.expire_stale(2_500).len(), 1);
    }

    #[test]
    fn test_orchestration_re_prevent_accepted_while_locked() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Orchestration, "op-1", 1_000);
        table.lock(Scope::Orchestration, &applicant("op-1"), 1_100);

        accepted_prevent(&mut table, Scope::Orchestration, "op-1", 1_200);
        assert_eq!(table.state_of(Scope::Orchestration), LockState::Locked);

        let outcome = table.prevent(
            Scope::Orchestration,
            &applicant("op-2"),
            Datemark::from_ms(1_200),
            Datemark::from_ms(0),
            1_200,
            1_000,
        );
        assert!(matches!(outcome, PreventOutcome::Busy { .. }));
    }

    #[test]
    fn test_re_prevent_is_not_idempotent_outside_orchestration() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);

        let outcome = table.prevent(
            Scope::Catalog,
            &applicant("op-1"),
            Datemark::from_ms(1_500),
            Datemark::from_ms(0),
            1_500,
            1_000,
        );
        assert!(matches!(outcome, PreventOutcome::Busy { .. }));
    }

    #[test]
    fn test_lock_requires_preventing_by_same_applicant() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);

        assert!(matches!(
            table.lock(Scope::Catalog, &applicant("op-2"), 1_100),
            TransitionOutcome::Denied { .. }
        ));
        assert_eq!(
            table.lock(Scope::Catalog, &applicant("op-1"), 1_100),
            TransitionOutcome::Accepted
        );
        assert_eq!(table.state_of(Scope::Catalog), LockState::Locked);

        // Locking twice is refused; LOCKED is not re-enterable.
        assert!(matches!(
            table.lock(Scope::Catalog, &applicant("op-1"), 1_200),
            TransitionOutcome::Denied { .. }
        ));
    }

    #[test]
    fn test_unlock_requires_matching_holder() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);
        table.lock(Scope::Catalog, &applicant("op-1"), 1_100);

        assert!(matches!(
            table.unlock(Scope::Catalog, &applicant("op-2")),
            TransitionOutcome::Denied { .. }
        ));
        assert_eq!(
            table.unlock(Scope::Catalog, &applicant("op-1")),
            TransitionOutcome::Accepted
        );
        assert_eq!(table.state_of(Scope::Catalog), LockState::Unlocked);
    }

    #[test]
    fn test_unlock_of_unlocked_scope_is_denied() {
        let mut table = LockTable::new();
        assert_eq!(
            table.unlock(Scope::Catalog, &applicant("op-1")),
            TransitionOutcome::Denied {
                state: LockState::Unlocked,
                holder: None,
            }
        );

        // A release whose prevention lease already lapsed is refused too.
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);
        table.expire_stale(2_000);
        assert!(matches!(
            table.unlock(Scope::Catalog, &applicant("op-1")),
            TransitionOutcome::Denied { .. }
        ));
    }

    #[test]
    fn test_preventing_lease_expires() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);

        assert!(table.expire_stale(1_999).is_empty());
        let expired = table.expire_stale(2_000);
        assert_eq!(expired, vec![(Scope::Catalog, applicant("op-1"))]);
        assert_eq!(table.state_of(Scope::Catalog), LockState::Unlocked);
    }

    #[test]
    fn test_locked_scope_never_lease_expires() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);
        table.lock(Scope::Catalog, &applicant("op-1"), 1_100);

        assert!(table.expire_stale(u64::MAX).is_empty());
        assert_eq!(table.state_of(Scope::Catalog), LockState::Locked);
    }

    #[test]
    fn test_status_reports_possibly_stuck_lock() {
        let mut table = LockTable::new();
        accepted_prevent(&mut table, Scope::Catalog, "op-1", 1_000);
        table.lock(Scope::Catalog, &applicant("op-1"), 1_000);

        let status = table.status(5_000, 10_000);
        let catalog = status.iter().find(|s| s.scope == Scope::Catalog).unwrap();
        assert_eq!(catalog.held_ms, 4_000);
        assert!(!catalog.possibly_stuck);

        let status = table.status(20_000, 10_000);
        let catalog = status.iter().find(|s| s.scope == Scope::Catalog).unwrap();
        assert!(catalog.possibly_stuck);
    }

    #[tokio::test]
    async fn test_coordinator_lease_expires_under_test_clock() {
        let clock = Arc::new(TestClock::default());
        let coordinator = LockCoordinator::new(
            LockConfig::for_testing(),
            Arc::new(FixedCatalogVersion::default()),
            clock.clone(),
        );
        let op = applicant("op-1");

        assert_eq!(
            coordinator
                .prevent(Scope::Catalog, &op, Datemark::from_ms(1))
                .await,
            PreventOutcome::Accepted
        );

        // Lease is 100ms in the test config.
        clock.advance_ms(99);
        assert!(coordinator.expire_stale().await.is_empty());

        clock.advance_ms(1);
        let expired = coordinator.expire_stale().await;
        assert_eq!(expired, vec![(Scope::Catalog, op)]);
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Unlocked
        );
    }

    #[tokio::test]
    async fn test_open_restores_persisted_rows() {
        let store: Arc<dyn LockerStore> = Arc::new(MemoryLockerStore::new());
        let clock = Arc::new(TestClock::default());
        let op = applicant("op-1");

        {
            let coordinator = LockCoordinator::open(
                LockConfig::for_testing(),
                Arc::new(FixedCatalogVersion::default()),
                clock.clone(),
                store.clone(),
            )
            .await
            .unwrap();
            coordinator
                .prevent(Scope::Catalog, &op, Datemark::from_ms(1))
                .await;
            coordinator.lock(Scope::Catalog, &op).await;
        }

        // A restarted node still knows the lock it granted.
        let coordinator = LockCoordinator::open(
            LockConfig::for_testing(),
            Arc::new(FixedCatalogVersion::default()),
            clock.clone(),
            store,
        )
        .await
        .unwrap();
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Locked
        );
        assert_eq!(
            coordinator.unlock(Scope::Catalog, &op).await,
            TransitionOutcome::Accepted
        );
    }

    #[tokio::test]
    async fn test_coordinator_round_trip() {
        let coordinator = LockCoordinator::new(
            LockConfig::for_testing(),
            Arc::new(FixedCatalogVersion::default()),
            Arc::new(dimension_core::WallClockTime::new()),
        );
        let op = applicant("op-1");

        assert_eq!(
            coordinator
                .prevent(Scope::Catalog, &op, Datemark::from_ms(1))
                .await,
            PreventOutcome::Accepted
        );
        assert_eq!(
            coordinator.lock(Scope::Catalog, &op).await,
            TransitionOutcome::Accepted
        );
        assert_eq!(
            coordinator.unlock(Scope::Catalog, &op).await,
            TransitionOutcome::Accepted
        );
        assert_eq!(
            coordinator.state_of(Scope::Catalog).await,
            LockState::Unlocked
        );
    }
}
