//! Process-wide circuit breaker for pathological paths.
//!
//! A path that times out repeatedly is flagged "problematic" so a host can
//! skip re-evaluating it. State is shared across every evaluation, so both
//! the timeout counter and the problematic set are guarded independently
//! with short critical sections — there is no suspension point inside either
//! operation, consistent with the kernel's synchronous, CPU-bound model.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::warn;

/// Snapshot of how many paths are currently flagged problematic.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CircuitBreakerStats {
    /// Number of paths currently in the problematic set.
    pub problematic_count: usize,
}

/// Tracks timeout counts per path and the set of paths that have crossed the
/// threshold.
pub struct CircuitBreaker {
    timeout_counts: RwLock<HashMap<String, u32>>,
    problematic: RwLock<HashSet<String>>,
    threshold: u32,
}

impl CircuitBreaker {
    /// Create a breaker that flags a path after `threshold` timeouts.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            timeout_counts: RwLock::new(HashMap::new()),
            problematic: RwLock::new(HashSet::new()),
            threshold,
        }
    }

    /// Record a timeout against `path`. Flags the path as problematic once
    /// its count reaches the configured threshold.
    pub fn record_timeout(&self, path: &str) {
        let count = {
            let mut counts = self.timeout_counts.write().expect("breaker lock poisoned");
            let entry = counts.entry(path.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        if count >= self.threshold {
            let mut problematic = self.problematic.write().expect("breaker lock poisoned");
            if problematic.insert(path.to_string()) {
                warn!(path, count, "path flagged as problematic after repeated timeouts");
            }
        }
    }

    /// Whether a host should skip evaluating content at `path`.
    #[must_use]
    pub fn should_skip(&self, path: &str) -> bool {
        self.problematic
            .read()
            .expect("breaker lock poisoned")
            .contains(path)
    }

    /// Current timeout count for `path` (0 if never recorded).
    #[must_use]
    pub fn timeout_count(&self, path: &str) -> u32 {
        self.timeout_counts
            .read()
            .expect("breaker lock poisoned")
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Clear all timeout counts and the problematic set.
    pub fn reset(&self) {
        self.timeout_counts.write().expect("breaker lock poisoned").clear();
        self.problematic.write().expect("breaker lock poisoned").clear();
    }

    /// Snapshot of the breaker's current state.
    #[must_use]
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            problematic_count: self.problematic.read().expect("breaker lock poisoned").len(),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(3)
    }
}
