//! The kernel's public facade.
//!
//! [`Engine`] owns every cache, the memory pool, the circuit breaker and the
//! metrics counters, and wires them into the per-call evaluators
//! ([`crate::near::NearEvaluator`], [`crate::fuzzy::search`]) without those
//! evaluators needing to own or reach back into the aggregate themselves.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::BoundedCache;
use crate::cache_registry::{CacheInfo, CacheRegistry};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerStats};
use crate::config::EngineConfig;
use crate::fuzzy::{self, FuzzyOptions, FuzzyResult};
use crate::memory_pool::{MemoryPool, MemoryPoolStats};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::near::NearEvaluator;
use crate::error::Result;
use crate::term::{MatchOptions, Term};
use crate::word_index::{self, Span};

/// Aggregate point-in-time diagnostics, suitable for persisting as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedSnapshot {
    /// When this snapshot was taken.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Counters accumulated since the last `clear_metrics()`.
    pub metrics: MetricsSnapshot,
    /// Per-cache hit/miss/eviction/size info, in registration order.
    pub cache_stats: Vec<CacheInfo>,
    /// Memory pool acquire/release/reuse counters.
    pub memory_pool: MemoryPoolStats,
    /// Circuit breaker state.
    pub circuit_breaker: CircuitBreakerStats,
}

/// The query-evaluation kernel: owns every cache, the memory pool, the
/// circuit breaker and the metrics counters behind a single value a host can
/// construct once and share across calls.
pub struct Engine {
    config: EngineConfig,
    registry: CacheRegistry,
    term_indices: Arc<BoundedCache<String, Arc<Vec<usize>>>>,
    proximity: Arc<BoundedCache<String, bool>>,
    /// Fingerprinting is already O(1) for large content (a fixed-size digest
    /// over three bounded slices) and cheap for small content, and a content
    /// blob has no stable cache-key identity of its own (a pointer/length
    /// pair can alias a freed-then-reused allocation), so this cache is never
    /// read or written for memoization. It stays registered so `stats()`
    /// reports the full named-cache inventory a host configures sizes/TTLs
    /// for, matching `fuzzy_fuse`.
    content_fingerprints: Arc<BoundedCache<String, ()>>,
    /// Reserved for a future pluggable fuzzy backend with a persistent
    /// searcher object to memoize; the current stateless matcher never reads
    /// or writes it, but it is still registered so `stats()` reports the
    /// full named-cache inventory a host configures sizes/TTLs for.
    fuzzy_fuse: Arc<BoundedCache<String, ()>>,
    fuzzy_results: Arc<BoundedCache<String, FuzzyResult>>,
    pool: MemoryPool,
    breaker: CircuitBreaker,
    metrics: Metrics,
}

impl Engine {
    /// Construct an engine from an explicit configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let registry = CacheRegistry::new();
        let caches = &config.caches;

        let term_indices = registry.register(Arc::new(BoundedCache::new(
            "term_indices",
            caches.term_indices.capacity,
            Some(caches.term_indices.ttl),
        )));
        let proximity = registry.register(Arc::new(BoundedCache::new(
            "proximity",
            caches.proximity.capacity,
            Some(caches.proximity.ttl),
        )));
        let content_fingerprints = registry.register(Arc::new(BoundedCache::new(
            "content_fingerprints",
            caches.content_fingerprints.capacity,
            Some(caches.content_fingerprints.ttl),
        )));
        let fuzzy_fuse = registry.register(Arc::new(BoundedCache::new(
            "fuzzy_fuse",
            caches.fuzzy_fuse.capacity,
            Some(caches.fuzzy_fuse.ttl),
        )));
        let fuzzy_results = registry.register(Arc::new(BoundedCache::new(
            "fuzzy_results",
            caches.fuzzy_results.capacity,
            Some(caches.fuzzy_results.ttl),
        )));

        let pool = MemoryPool::new(config.array_pool_size, config.max_pooled_array_size);
        let breaker = CircuitBreaker::new(config.circuit_breaker_threshold);

        Self {
            config,
            registry,
            term_indices,
            proximity,
            content_fingerprints,
            fuzzy_fuse,
            fuzzy_results,
            pool,
            breaker,
            metrics: Metrics::new(),
        }
    }

    fn evaluator(&self) -> NearEvaluator<'_> {
        NearEvaluator {
            term_indices: &self.term_indices,
            proximity: &self.proximity,
            fuzzy_results: &self.fuzzy_results,
            pool: &self.pool,
            breaker: &self.breaker,
            metrics: &self.metrics,
            config: &self.config,
        }
    }

    /// Compile a regex term. The only entry point that can return
    /// [`crate::Error::InvalidRegex`].
    pub fn compile_term(&self, source: impl Into<String>, flags: impl Into<String>) -> Result<Term> {
        Term::pattern(source, flags)
    }

    /// Decide whether `term1` and `term2` co-occur within `distance` words
    /// in `content`. `path`, if given, identifies the content for the
    /// circuit breaker; repeated timeouts against the same path flag it as
    /// problematic (see [`Self::should_skip`]).
    #[must_use]
    pub fn evaluate_near(
        &self,
        content: &str,
        term1: &Term,
        term2: &Term,
        distance: i64,
        options: MatchOptions,
        path: Option<&str>,
    ) -> bool {
        if let Some(path) = path {
            if self.breaker.should_skip(path) {
                return false;
            }
        }
        self.evaluator().evaluate(content, term1, term2, distance, options, path)
    }

    /// Approximate (or exact) substring search for `term` in `content`,
    /// memoized on `(content fingerprint, term, options)`. The fingerprint
    /// itself is recomputed on every call rather than cached: it's already
    /// O(1) for large content, and caching it would require a stable
    /// identity key for an arbitrary `&str`, which this crate has none of.
    #[must_use]
    pub fn search(&self, content: &str, term: &Term, options: FuzzyOptions) -> FuzzyResult {
        self.metrics.record_search_evaluation();

        if content.is_empty() {
            return FuzzyResult {
                is_match: false,
                score: None,
                match_positions: None,
                processing_time_ms: 0,
            };
        }

        let fp = crate::fingerprint::fingerprint(content);

        let cache_key = format!(
            "{fp}|{}|{}|{}|{}|{:.6}",
            term.repr(),
            options.case_sensitive,
            options.whole_word,
            options.include_score,
            options.threshold
        );
        if let Some(cached) = self.fuzzy_results.get(&cache_key) {
            return cached;
        }

        let result = match term {
            Term::Literal(text) => fuzzy::search(
                content,
                text,
                options,
                self.config.min_term_length,
                self.config.max_full_content_size,
                self.config.chunk_size,
                self.config.chunk_overlap,
            ),
            Term::Pattern { regex, .. } => regex_search_result(content, regex, options),
        };

        self.fuzzy_results.set(cache_key, result.clone());
        result
    }

    /// Word spans for `content`, recomputed fresh on every call (there is no
    /// dedicated boundaries cache among the kernel's named caches).
    #[must_use]
    pub fn boundaries(&self, content: &str) -> Vec<Span> {
        word_index::boundaries(content)
    }

    /// Resolve a character offset to the word index that owns it.
    #[must_use]
    pub fn word_index_of(&self, char_offset: usize, content: &str) -> Option<usize> {
        word_index::word_index_of(char_offset, content)
    }

    /// Whether a host should skip re-evaluating content at `path` because it
    /// has timed out too many times already.
    #[must_use]
    pub fn should_skip(&self, path: &str) -> bool {
        self.breaker.should_skip(path)
    }

    /// Record a timeout against `path` outside of `evaluate_near` (e.g. a
    /// host-level budget expiring around the call).
    pub fn record_timeout(&self, path: &str) {
        self.breaker.record_timeout(path);
        self.metrics.record_near_timeout();
    }

    /// Clear the circuit breaker's timeout counts and problematic set.
    pub fn reset_circuit(&self) {
        self.breaker.reset();
    }

    /// Clear every registered cache.
    pub fn clear_caches(&self) {
        self.registry.clear_all();
    }

    /// Clear only the two caches the NEAR evaluator directly owns
    /// (`term_indices`, `proximity`), leaving the fuzzy matcher's own caches
    /// and the memory pool untouched. Intended for a host responding to
    /// memory pressure without discarding fuzzy-search memoization that's
    /// typically smaller and cheaper to rebuild.
    pub fn clear_for_memory_pressure(&self) {
        let before = self.term_indices.size() + self.proximity.size();
        self.term_indices.clear();
        self.proximity.clear();
        tracing::info!(entries_cleared = before, "cleared NEAR evaluator caches under memory pressure");
    }

    /// Reset every metrics counter to zero.
    pub fn clear_metrics(&self) {
        self.metrics.clear();
    }

    /// Aggregate diagnostics: cache stats, metrics, pool stats, circuit
    /// breaker state.
    #[must_use]
    pub fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            timestamp: chrono::Utc::now(),
            metrics: self.metrics.snapshot(),
            cache_stats: self.registry.info(),
            memory_pool: self.pool.stats(),
            circuit_breaker: self.breaker.stats(),
        }
    }

    /// The configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn regex_search_result(content: &str, regex: &regex::Regex, options: FuzzyOptions) -> FuzzyResult {
    let byte_to_char = word_index::byte_to_char_offsets(content);
    let positions: Vec<usize> = regex.find_iter(content).map(|m| byte_to_char[m.start()]).collect();
    FuzzyResult {
        is_match: !positions.is_empty(),
        score: options.include_score.then_some(0.0),
        match_positions: options.include_score.then_some(positions),
        processing_time_ms: 0,
    }
}
