//! Time abstraction
//!
//! TigerStyle: All external I/O goes through abstraction traits.
//!
//! Everything timer-driven in the mesh (zombie suspicion, gossip debounce,
//! lock leases) reads the clock through `TimeProvider`, never through
//! `SystemTime::now()` directly. Production uses `WallClockTime`; tests
//! inject a manually advanced clock so expiry behavior is deterministic.

use crate::datemark::Datemark;
use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

/// Time provider abstraction
///
/// # Implementations
///
/// - `WallClockTime`: production, system clock
/// - Test clocks in consuming crates: deterministic, manually advanced
#[async_trait]
pub trait TimeProvider: Send + Sync + std::fmt::Debug {
    /// Current time in milliseconds since epoch
    fn now_ms(&self) -> u64;

    /// Current time in microseconds since epoch
    ///
    /// Default derives from `now_ms`; wall-clock overrides with real
    /// microsecond resolution so consecutive datemarks stay distinct.
    fn now_micros(&self) -> u64 {
        self.now_ms().saturating_mul(1_000)
    }

    /// Current time as a datemark
    fn now_datemark(&self) -> Datemark {
        Datemark::from_micros(self.now_micros())
    }

    /// Sleep for the specified duration
    async fn sleep_ms(&self, ms: u64);
}

/// Production time provider using the wall clock
#[derive(Debug, Clone, Default)]
pub struct WallClockTime;

impl WallClockTime {
    /// Create a new wall clock time provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeProvider for WallClockTime {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn now_micros(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
    }
}
