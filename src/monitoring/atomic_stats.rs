/*!
 * Lock-Free Wait Statistics
 * Atomic counters for context lifecycle events
 */

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_STATS: WaitStats = WaitStats::new();

/// Process-wide statistics instance
#[inline]
pub fn stats() -> &'static WaitStats {
    &GLOBAL_STATS
}

/// Atomic wait statistics
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
#[repr(C, align(64))]
#[derive(Debug)]
pub struct WaitStats {
    contexts_created: AtomicU64,
    threaded: AtomicU64,
    no_hang: AtomicU64,
    completed: AtomicU64,
    canceled: AtomicU64,
    spawn_retries: AtomicU64,
    errors: AtomicU64,
}

impl WaitStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            contexts_created: AtomicU64::new(0),
            threaded: AtomicU64::new(0),
            no_hang: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            canceled: AtomicU64::new(0),
            spawn_retries: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn inc_created(&self) {
        self.contexts_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_threaded(&self) {
        self.threaded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_no_hang(&self) {
        self.no_hang.fetch_add(1, Ordering::Relaxed);
    }

    /// Worker published a result (including "no child")
    #[inline(always)]
    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_canceled(&self) {
        self.canceled.fetch_add(1, Ordering::Relaxed);
    }

    /// Worker spawn hit the thread limit
    #[inline(always)]
    pub fn inc_spawn_retries(&self) {
        self.spawn_retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats
    pub fn snapshot(&self) -> WaitStatsSnapshot {
        WaitStatsSnapshot {
            contexts_created: self.contexts_created.load(Ordering::Relaxed),
            threaded: self.threaded.load(Ordering::Relaxed),
            no_hang: self.no_hang.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            canceled: self.canceled.load(Ordering::Relaxed),
            spawn_retries: self.spawn_retries.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl Default for WaitStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`WaitStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitStatsSnapshot {
    pub contexts_created: u64,
    pub threaded: u64,
    pub no_hang: u64,
    pub completed: u64,
    pub canceled: u64,
    pub spawn_retries: u64,
    pub errors: u64,
}
