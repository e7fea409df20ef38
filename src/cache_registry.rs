//! Named registry that owns the kernel's caches and exposes aggregate stats
//! and bulk clear.
//!
//! Rather than a dynamically-typed map of arbitrary cache values, each cache
//! is strongly typed and owned by the [`crate::engine::Engine`] that actually
//! uses it; the registry's job is purely to let every cache register itself
//! for aggregate reporting and bulk clearing, via a small trait object
//! instead of `Any`-based downcasting.

use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::cache::{BoundedCache, CacheStats};

/// Anything that can report its own stats and be cleared, independent of its
/// key/value types. [`BoundedCache`] implements this through
/// [`CacheRegistry::register`].
pub trait NamedCache: Send + Sync {
    /// The name this cache was registered under.
    fn name(&self) -> &str;
    /// Current live entry count.
    fn size(&self) -> usize;
    /// Hit/miss/eviction counters.
    fn stats(&self) -> CacheStats;
    /// The configured entry-count ceiling.
    fn capacity(&self) -> usize;
    /// The default time-to-live applied to inserts that don't specify their
    /// own, if any.
    fn ttl(&self) -> Option<std::time::Duration>;
    /// Remove every entry.
    fn clear(&self);
}

impl<K, V> NamedCache for BoundedCache<K, V>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        BoundedCache::name(self)
    }

    fn size(&self) -> usize {
        BoundedCache::size(self)
    }

    fn stats(&self) -> CacheStats {
        BoundedCache::stats(self)
    }

    fn capacity(&self) -> usize {
        BoundedCache::capacity(self)
    }

    fn ttl(&self) -> Option<std::time::Duration> {
        BoundedCache::ttl(self)
    }

    fn clear(&self) {
        BoundedCache::clear(self);
    }
}

/// Snapshot of one registered cache's state, for `stats()`/`info()` callers.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    /// The cache's registered name.
    pub name: String,
    /// Current live entry count.
    pub size: usize,
    /// The configured entry-count ceiling.
    pub capacity: usize,
    /// Cache hits so far.
    pub hits: u64,
    /// Cache misses so far.
    pub misses: u64,
    /// Evictions so far.
    pub evictions: u64,
    /// Hit rate in `[0, 1]`, or `0.0` if there have been no lookups yet.
    pub hit_rate: f64,
    /// The default time-to-live applied to entries, in milliseconds, or
    /// `None` if entries never expire on their own.
    pub ttl_ms: Option<u64>,
}

fn info_of(cache: &dyn NamedCache) -> CacheInfo {
    let stats = cache.stats();
    let total = stats.hits + stats.misses;
    CacheInfo {
        name: cache.name().to_string(),
        size: cache.size(),
        capacity: cache.capacity(),
        hits: stats.hits,
        misses: stats.misses,
        evictions: stats.evictions,
        hit_rate: if total > 0 {
            stats.hits as f64 / total as f64
        } else {
            0.0
        },
        ttl_ms: cache.ttl().map(|d| d.as_millis() as u64),
    }
}

/// Owns a handle to every cache the kernel creates, for aggregate reporting
/// and bulk clearing (backs `clear_caches`/`clear_for_memory_pressure`).
#[derive(Default)]
pub struct CacheRegistry {
    caches: RwLock<Vec<Arc<dyn NamedCache>>>,
}

impl CacheRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache so it participates in `info()`/`clear_all()`. Returns
    /// the same `Arc` back so the caller can also hold a strongly-typed
    /// handle to it.
    pub fn register<C>(&self, cache: Arc<C>) -> Arc<C>
    where
        C: NamedCache + 'static,
    {
        self.caches
            .write()
            .expect("registry lock poisoned")
            .push(cache.clone());
        cache
    }

    /// Info for every registered cache, in registration order.
    pub fn info(&self) -> Vec<CacheInfo> {
        self.caches
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(|c| info_of(c.as_ref()))
            .collect()
    }

    /// Info for a single cache by name, if registered.
    pub fn info_for(&self, name: &str) -> Option<CacheInfo> {
        self.caches
            .read()
            .expect("registry lock poisoned")
            .iter()
            .find(|c| c.name() == name)
            .map(|c| info_of(c.as_ref()))
    }

    /// Clear every registered cache.
    pub fn clear_all(&self) {
        for cache in self.caches.read().expect("registry lock poisoned").iter() {
            cache.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BoundedCache;

    #[test]
    fn registers_and_reports_aggregate_info() {
        let registry = CacheRegistry::new();
        let a: Arc<BoundedCache<String, i32>> =
            registry.register(Arc::new(BoundedCache::new("a", 10, None)));
        let b: Arc<BoundedCache<String, i32>> =
            registry.register(Arc::new(BoundedCache::new("b", 10, None)));

        a.set("x".to_string(), 1);
        a.get(&"x".to_string());
        b.get(&"missing".to_string());

        let info = registry.info();
        assert_eq!(info.len(), 2);
        let a_info = info.iter().find(|i| i.name == "a").unwrap();
        assert_eq!(a_info.hits, 1);
        let b_info = info.iter().find(|i| i.name == "b").unwrap();
        assert_eq!(b_info.misses, 1);
    }

    #[test]
    fn clear_all_empties_every_registered_cache() {
        let registry = CacheRegistry::new();
        let a: Arc<BoundedCache<i32, i32>> =
            registry.register(Arc::new(BoundedCache::new("a", 10, None)));
        a.set(1, 1);
        assert_eq!(a.size(), 1);
        registry.clear_all();
        assert_eq!(a.size(), 0);
    }

    #[test]
    fn info_for_missing_name_is_none() {
        let registry = CacheRegistry::new();
        assert!(registry.info_for("nope").is_none());
    }
}
