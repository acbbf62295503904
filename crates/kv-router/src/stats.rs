//! Atomic request counters.
//!
//! All atomics use `Relaxed` ordering: these are monotonic display counters
//! with no synchronization requirements.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

#[derive(Default)]
struct StatsInner {
    total_requests: AtomicU64,
    forwarded: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Thread-safe routing counters. Cheap to clone (Arc).
#[derive(Clone, Default)]
pub struct RouterStats {
    inner: Arc<StatsInner>,
}

/// Snapshot of current counter values, serializable to JSON.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    /// Requests that reached a backend, whatever status it answered with.
    pub forwarded: u64,
    /// Requests refused with a 4xx before forwarding.
    pub rejected: u64,
    /// Requests that ended in an internal (5xx) router error.
    pub failed: u64,
}

impl RouterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_requests(&self) {
        self.inner.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_forwarded(&self) {
        self.inner.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_requests: self.inner.total_requests.load(Ordering::Relaxed),
            forwarded: self.inner.forwarded.load(Ordering::Relaxed),
            rejected: self.inner.rejected.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
        }
    }
}
