//! Bounded, TTL-aware memoization cache.
//!
//! A single tier that is simultaneously capacity-bounded (LRU eviction) and
//! TTL-bounded (expiry eviction) with one set of hit/miss/eviction counters.
//! A logical clock plus a `BTreeMap` ordered by clock value gives O(log n)
//! "find the least-recently-used key" without any unsafe code, which this
//! crate forbids at the lint level. See `DESIGN.md` for the full rationale.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Point-in-time statistics for one [`BoundedCache`].
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    /// Successful lookups of a live entry.
    pub hits: u64,
    /// Lookups that found nothing (absent or expired).
    pub misses: u64,
    /// Entries removed due to capacity pressure or expiry.
    pub evictions: u64,
}

#[derive(Default)]
struct AtomicCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl AtomicCacheStats {
    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
    clock: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    /// Ascending by clock value, so `order.keys().next()` is the LRU key.
    order: BTreeMap<u64, K>,
    clock: u64,
    capacity: usize,
    default_ttl: Option<Duration>,
}

impl<K, V> Inner<K, V>
where
    K: Hash + Eq + Clone,
{
    fn next_clock(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, key: &K) {
        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(&entry.clock);
            let next = self.clock + 1;
            self.clock = next;
            entry.clock = next;
            self.order.insert(next, key.clone());
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.clock);
        Some(entry)
    }

    fn evict_lru(&mut self) -> bool {
        let Some((&clock, _)) = self.order.iter().next() else {
            return false;
        };
        if let Some(key) = self.order.remove(&clock) {
            self.entries.remove(&key);
            true
        } else {
            false
        }
    }

    fn evict_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, e)| e.expires_at.is_some_and(|t| now >= t))
            .map(|(k, _)| k.clone())
            .collect();
        let count = expired.len();
        for key in expired {
            self.remove_entry(&key);
        }
        count
    }
}

/// Generic capacity- and time-bounded memoization map with hit/miss/eviction
/// counters.
///
/// All operations are total (never fail) and safe to call from any thread:
/// the whole structure is guarded by a single short-lived mutex, so every
/// get/set/delete/clear is atomic from an external caller's point of view.
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    stats: AtomicCacheStats,
    name: String,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a cache with the given capacity and default TTL (`None` means
    /// entries never expire unless a per-entry TTL is given).
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize, default_ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                clock: 0,
                capacity,
                default_ttl,
            }),
            stats: AtomicCacheStats::default(),
            name: name.into(),
        }
    }

    /// This cache's name, for aggregate reporting in [`crate::cache_registry::CacheRegistry`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up `key`. Promotes the entry to most-recently-used on a hit;
    /// evicts and counts a miss+eviction if the entry has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();
        let expired = inner
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at.is_some_and(|t| now >= t));
        if expired {
            inner.remove_entry(key);
            drop(inner);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        if let Some(entry) = inner.entries.get(key) {
            let value = entry.value.clone();
            inner.touch(key);
            drop(inner);
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            Some(value)
        } else {
            drop(inner);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Whether `key` is present and not expired, without affecting LRU order
    /// or statistics.
    pub fn has(&self, key: &K) -> bool {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();
        inner
            .entries
            .get(key)
            .is_some_and(|e| !e.expires_at.is_some_and(|t| now >= t))
    }

    /// Insert or replace `key` with the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, None);
    }

    /// Insert or replace `key`, overriding the cache's default TTL for just
    /// this entry (`Some(None)` would be ambiguous, so `ttl_override = None`
    /// means "use the cache default").
    pub fn set_with_ttl(&self, key: K, value: V, ttl_override: Option<Duration>) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let now = Instant::now();

        let expired_count = inner.evict_expired(now);
        if expired_count > 0 {
            self.stats
                .evictions
                .fetch_add(expired_count as u64, Ordering::Relaxed);
        }

        inner.remove_entry(&key);

        while inner.entries.len() >= inner.capacity && inner.capacity > 0 {
            if !inner.evict_lru() {
                break;
            }
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }

        if inner.capacity == 0 {
            return;
        }

        let ttl = ttl_override.or(inner.default_ttl);
        let clock = inner.next_clock();
        let expires_at = ttl.map(|d| now + d);
        inner.order.insert(clock, key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                expires_at,
                clock,
            },
        );
    }

    /// Remove `key` unconditionally. Returns the removed value, if any.
    pub fn delete(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.remove_entry(key).map(|e| e.value)
    }

    /// Remove every entry and zero the live-entry count. Statistics are left
    /// untouched: hit/miss/eviction counters monotonically increase until a
    /// caller explicitly resets them.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        debug!(cache = %self.name, removed, "cleared bounded cache");
    }

    /// Current number of live (possibly-not-yet-expired) entries.
    pub fn size(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    /// Snapshot of hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// The configured entry-count ceiling.
    pub fn capacity(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").capacity
    }

    /// The default TTL applied to inserts that don't specify their own.
    pub fn ttl(&self) -> Option<Duration> {
        self.inner.lock().expect("cache mutex poisoned").default_ttl
    }

    /// Shrink (or grow) the capacity, evicting from the LRU end as needed.
    pub fn resize_capacity(&self, new_capacity: usize) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.capacity = new_capacity;
        let mut evicted = 0u64;
        while inner.entries.len() > new_capacity {
            if !inner.evict_lru() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            self.stats.evictions.fetch_add(evicted, Ordering::Relaxed);
        }
    }

    /// Change the default TTL applied to future inserts that don't specify
    /// their own.
    pub fn set_default_ttl(&self, ttl: Option<Duration>) {
        self.inner.lock().expect("cache mutex poisoned").default_ttl = ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_get_set() {
        let cache: BoundedCache<String, i32> = BoundedCache::new("test", 10, None);
        assert_eq!(cache.get(&"a".to_string()), None);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn capacity_evicts_lru() {
        let cache: BoundedCache<i32, i32> = BoundedCache::new("test", 2, None);
        cache.set(1, 1);
        cache.set(2, 2);
        // touch 1 so 2 becomes LRU
        assert_eq!(cache.get(&1), Some(1));
        cache.set(3, 3);
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(1));
        assert_eq!(cache.get(&3), Some(3));
        assert!(cache.size() <= 2);
        assert!(cache.stats().evictions >= 1);
    }

    #[test]
    fn ttl_expiry_counts_as_miss_and_eviction() {
        let cache: BoundedCache<&str, i32> =
            BoundedCache::new("test", 10, Some(Duration::from_millis(10)));
        cache.set("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"a"), None);
        let stats = cache.stats();
        assert!(stats.misses >= 1);
        assert!(stats.evictions >= 1);
    }

    #[test]
    fn resize_capacity_truncates_from_lru_end() {
        let cache: BoundedCache<i32, i32> = BoundedCache::new("test", 5, None);
        for i in 0..5 {
            cache.set(i, i);
        }
        cache.resize_capacity(2);
        assert_eq!(cache.size(), 2);
        // The most recently inserted keys (3, 4) should survive.
        assert_eq!(cache.get(&4), Some(4));
        assert_eq!(cache.get(&3), Some(3));
    }

    #[test]
    fn has_does_not_affect_lru_order_or_stats() {
        let cache: BoundedCache<i32, i32> = BoundedCache::new("test", 2, None);
        cache.set(1, 1);
        cache.set(2, 2);
        assert!(cache.has(&1));
        assert_eq!(cache.stats().hits, 0, "has() must not record a hit");
        cache.set(3, 3); // 1 is still LRU since `has` must not have promoted it
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn zero_capacity_never_retains_entries() {
        let cache: BoundedCache<i32, i32> = BoundedCache::new("test", 0, None);
        cache.set(1, 1);
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn live_entries_never_exceed_capacity() {
        let cache: BoundedCache<i32, i32> = BoundedCache::new("test", 3, None);
        for i in 0..50 {
            cache.set(i, i);
            assert!(cache.size() <= 3);
        }
    }
}
