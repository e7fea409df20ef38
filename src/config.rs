//! Tunable constants for the kernel, gathered in one place so a host can
//! override them at construction time instead of scattering magic numbers
//! through the evaluators.
//!
//! This module does not read or write any file: configuration persistence is
//! the host's concern. [`EngineConfig`] derives `Serialize`/`Deserialize`
//! purely so a host that already has its own config layer can embed or load
//! one.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capacity and default time-to-live for one named cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CacheSpec {
    /// Maximum number of live (non-expired) entries.
    pub capacity: usize,
    /// Default time-to-live for entries that don't specify their own.
    #[serde(with = "duration_millis")]
    pub ttl: Duration,
}

impl CacheSpec {
    /// Construct a cache spec from a capacity and a TTL in milliseconds.
    #[must_use]
    pub const fn new(capacity: usize, ttl_ms: u64) -> Self {
        Self {
            capacity,
            ttl: Duration::from_millis(ttl_ms),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

/// The full set of named caches the kernel registers on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSpecs {
    /// `nearOperatorTermIndices` — term-offset lists keyed by fingerprint+term.
    pub term_indices: CacheSpec,
    /// `nearOperatorProximity` — final NEAR booleans.
    pub proximity: CacheSpec,
    /// `nearOperatorContentFingerprints` — content fingerprints.
    pub content_fingerprints: CacheSpec,
    /// `fuzzySearchFuse` — memoized fuzzy searcher handles.
    pub fuzzy_fuse: CacheSpec,
    /// `fuzzySearchResults` — memoized fuzzy match results.
    pub fuzzy_results: CacheSpec,
}

impl Default for CacheSpecs {
    fn default() -> Self {
        Self {
            term_indices: CacheSpec::new(1_000, 15 * 60 * 1_000),
            proximity: CacheSpec::new(2_000, 20 * 60 * 1_000),
            content_fingerprints: CacheSpec::new(500, 30 * 60 * 1_000),
            fuzzy_fuse: CacheSpec::new(100, 10 * 60 * 1_000),
            fuzzy_results: CacheSpec::new(500, 15 * 60 * 1_000),
        }
    }
}

/// Every tunable the kernel needs, along with its documented default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Terms shorter than this degrade to exact substring search.
    pub min_term_length: usize,
    /// Default fuzzy acceptance threshold (the fuzzy matcher's `threshold` option).
    pub match_threshold: f64,
    /// Content at or below this size uses the full (non-chunked) algorithms.
    pub max_full_content_size: usize,
    /// Sliding-window size for chunked evaluation of oversized content.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, to avoid missing boundary matches.
    pub chunk_overlap: usize,
    /// Wall-clock budget for a single `evaluate_near` call.
    #[serde(with = "duration_millis")]
    pub max_execution_time: Duration,
    /// Per-bucket free-list length cap in the memory pool.
    pub array_pool_size: usize,
    /// Arrays larger than this bypass the pool entirely.
    pub max_pooled_array_size: usize,
    /// Consecutive timeouts against one path before it's flagged problematic.
    pub circuit_breaker_threshold: u32,
    /// Capacities/TTLs for the kernel's own named caches.
    pub caches: CacheSpecs,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_term_length: 3,
            match_threshold: 0.4,
            max_full_content_size: 2 * 1024 * 1024,
            chunk_size: 64 * 1024,
            chunk_overlap: 1024,
            max_execution_time: Duration::from_millis(8_000),
            array_pool_size: 50,
            max_pooled_array_size: 1_000,
            circuit_breaker_threshold: 3,
            caches: CacheSpecs::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.min_term_length, 3);
        assert!((config.match_threshold - 0.4).abs() < f64::EPSILON);
        assert_eq!(config.max_full_content_size, 2 * 1024 * 1024);
        assert_eq!(config.chunk_size, 64 * 1024);
        assert_eq!(config.chunk_overlap, 1024);
        assert_eq!(config.max_execution_time, Duration::from_millis(8_000));
        assert_eq!(config.array_pool_size, 50);
        assert_eq!(config.max_pooled_array_size, 1_000);
        assert_eq!(config.circuit_breaker_threshold, 3);
    }

    #[test]
    fn round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: EngineConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.caches.term_indices.capacity, 1_000);
    }
}
