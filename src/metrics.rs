//! Engine-wide counters, snapshotted for diagnostics and tests.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Total `evaluate_near` calls.
    pub near_evaluations: u64,
    /// `evaluate_near` calls short-circuited by an empty candidate list.
    pub near_empty_short_circuits: u64,
    /// `evaluate_near` calls that hit the chunked (oversized-content) path.
    pub near_chunked_evaluations: u64,
    /// `evaluate_near` calls that ran past their deadline.
    pub near_timeouts: u64,
    /// Total `search` calls.
    pub search_evaluations: u64,
    /// `search` calls that fell back to the fuzzy matcher.
    pub fuzzy_fallbacks: u64,
}

/// Atomic counters backing [`MetricsSnapshot`]. Cheap to update from any
/// evaluation path; no locking is needed since every field is independent.
#[derive(Default)]
pub struct Metrics {
    near_evaluations: AtomicU64,
    near_empty_short_circuits: AtomicU64,
    near_chunked_evaluations: AtomicU64,
    near_timeouts: AtomicU64,
    search_evaluations: AtomicU64,
    fuzzy_fallbacks: AtomicU64,
}

impl Metrics {
    /// Create a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_near_evaluation(&self) {
        self.near_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_near_empty_short_circuit(&self) {
        self.near_empty_short_circuits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_near_chunked_evaluation(&self) {
        self.near_chunked_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_near_timeout(&self) {
        self.near_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_search_evaluation(&self) {
        self.search_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fuzzy_fallback(&self) {
        self.fuzzy_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            near_evaluations: self.near_evaluations.load(Ordering::Relaxed),
            near_empty_short_circuits: self.near_empty_short_circuits.load(Ordering::Relaxed),
            near_chunked_evaluations: self.near_chunked_evaluations.load(Ordering::Relaxed),
            near_timeouts: self.near_timeouts.load(Ordering::Relaxed),
            search_evaluations: self.search_evaluations.load(Ordering::Relaxed),
            fuzzy_fallbacks: self.fuzzy_fallbacks.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero.
    pub fn clear(&self) {
        self.near_evaluations.store(0, Ordering::Relaxed);
        self.near_empty_short_circuits.store(0, Ordering::Relaxed);
        self.near_chunked_evaluations.store(0, Ordering::Relaxed);
        self.near_timeouts.store(0, Ordering::Relaxed);
        self.search_evaluations.store(0, Ordering::Relaxed);
        self.fuzzy_fallbacks.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_clear() {
        let metrics = Metrics::new();
        metrics.record_near_evaluation();
        metrics.record_near_evaluation();
        metrics.record_fuzzy_fallback();
        let snap = metrics.snapshot();
        assert_eq!(snap.near_evaluations, 2);
        assert_eq!(snap.fuzzy_fallbacks, 1);
        metrics.clear();
        assert_eq!(metrics.snapshot().near_evaluations, 0);
    }
}
