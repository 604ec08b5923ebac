//! Per-operator record counters.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Point-in-time view of an operator's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Records delivered to the operator.
    pub received: u64,

    /// Records emitted downstream (including substitutes).
    pub emitted: u64,

    /// Records dropped by a missing-value or preparation-error policy.
    pub skipped: u64,

    /// Records that failed and were suppressed by the exception policy.
    pub suppressed: u64,

    /// Records that failed with the propagate path taken.
    pub failed: u64,

    /// When the operator last started, if it has.
    pub started_at: Option<DateTime<Utc>>,
}

/// Counters shared between an operator and its host.
///
/// Updated from the single processing thread; readable from anywhere
/// through a cloned `Arc` handle.
#[derive(Debug, Default)]
pub struct OperatorMetrics {
    inner: RwLock<MetricsSnapshot>,
}

impl OperatorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn mark_started(&self) {
        self.inner.write().started_at = Some(Utc::now());
    }

    pub(crate) fn record_received(&self) {
        self.inner.write().received += 1;
    }

    pub(crate) fn record_emitted(&self) {
        self.inner.write().emitted += 1;
    }

    pub(crate) fn record_skipped(&self) {
        self.inner.write().skipped += 1;
    }

    pub(crate) fn record_suppressed(&self) {
        self.inner.write().suppressed += 1;
    }

    pub(crate) fn record_failed(&self) {
        self.inner.write().failed += 1;
    }

    /// Get a consistent copy of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner.read().clone()
    }

    /// Reset all counters.
    pub fn reset(&self) {
        *self.inner.write() = MetricsSnapshot::default();
    }
}
