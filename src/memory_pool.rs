//! Bucketed integer-array pool.
//!
//! Per-size-class free lists with an RAII guard that returns the buffer to
//! its pool on drop. The pool backs a synchronous, CPU-bound algorithm with
//! no suspension points within a single evaluation, so it uses
//! `std::sync::Mutex` rather than an async mutex; buckets are sized for
//! word-index arrays (10/50/100/200/500 elements) rather than byte ranges.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const BUCKETS: [usize; 5] = [10, 50, 100, 200, 500];

/// Aggregate pool statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MemoryPoolStats {
    /// Total arrays handed out.
    pub acquisitions: u64,
    /// Total arrays returned to a bucket.
    pub releases: u64,
    /// Acquisitions served from a bucket's free list.
    pub reuse_hits: u64,
    /// Acquisitions that allocated a fresh `Vec`.
    pub reuse_misses: u64,
}

/// Pool of reusable `Vec<i64>` buffers, bucketed by capacity, used to hold
/// word-index projections during NEAR evaluation.
pub struct MemoryPool {
    buckets: [Mutex<Vec<Vec<i64>>>; 5],
    max_free_per_bucket: usize,
    max_pooled_size: usize,
    acquisitions: AtomicUsize,
    releases: AtomicUsize,
    reuse_hits: AtomicUsize,
    reuse_misses: AtomicUsize,
}

impl MemoryPool {
    /// Create a pool with the given per-bucket free-list cap and the size
    /// above which arrays bypass pooling entirely.
    #[must_use]
    pub fn new(max_free_per_bucket: usize, max_pooled_size: usize) -> Self {
        Self {
            buckets: std::array::from_fn(|_| Mutex::new(Vec::new())),
            max_free_per_bucket,
            max_pooled_size,
            acquisitions: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            reuse_hits: AtomicUsize::new(0),
            reuse_misses: AtomicUsize::new(0),
        }
    }

    fn bucket_index(size: usize) -> Option<usize> {
        BUCKETS.iter().position(|&b| size <= b)
    }

    /// Acquire a cleared array with capacity for at least `min_size`
    /// elements. Arrays larger than `max_pooled_size` bypass the pool
    /// entirely.
    pub fn acquire(&self, min_size: usize) -> PooledArray<'_> {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);

        if min_size > self.max_pooled_size {
            self.reuse_misses.fetch_add(1, Ordering::Relaxed);
            return PooledArray {
                pool: None,
                bucket: None,
                buffer: Vec::with_capacity(min_size),
            };
        }

        let Some(bucket) = Self::bucket_index(min_size) else {
            self.reuse_misses.fetch_add(1, Ordering::Relaxed);
            return PooledArray {
                pool: None,
                bucket: None,
                buffer: Vec::with_capacity(min_size),
            };
        };

        let mut free_list = self.buckets[bucket].lock().expect("pool mutex poisoned");
        if let Some(mut buffer) = free_list.pop() {
            drop(free_list);
            self.reuse_hits.fetch_add(1, Ordering::Relaxed);
            buffer.clear();
            if buffer.capacity() < min_size {
                buffer.reserve(min_size - buffer.capacity());
            }
            PooledArray {
                pool: Some(self),
                bucket: Some(bucket),
                buffer,
            }
        } else {
            drop(free_list);
            self.reuse_misses.fetch_add(1, Ordering::Relaxed);
            PooledArray {
                pool: Some(self),
                bucket: Some(bucket),
                buffer: Vec::with_capacity(BUCKETS[bucket]),
            }
        }
    }

    fn release(&self, bucket: usize, mut buffer: Vec<i64>) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        let mut free_list = self.buckets[bucket].lock().expect("pool mutex poisoned");
        if free_list.len() < self.max_free_per_bucket {
            buffer.clear();
            free_list.push(buffer);
        }
        // Otherwise let the buffer drop normally; pools never grow unbounded.
    }

    /// Snapshot of pool usage counters.
    pub fn stats(&self) -> MemoryPoolStats {
        MemoryPoolStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed) as u64,
            releases: self.releases.load(Ordering::Relaxed) as u64,
            reuse_hits: self.reuse_hits.load(Ordering::Relaxed) as u64,
            reuse_misses: self.reuse_misses.load(Ordering::Relaxed) as u64,
        }
    }

    /// Total arrays currently sitting in free lists, across all buckets.
    pub fn pooled_len(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.lock().expect("pool mutex poisoned").len())
            .sum()
    }

    /// Drop every pooled array (used by `clear_for_memory_pressure`).
    pub fn clear(&self) {
        for bucket in &self.buckets {
            bucket.lock().expect("pool mutex poisoned").clear();
        }
    }
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new(50, 1_000)
    }
}

/// RAII handle to a pooled `Vec<i64>`. Returned to its bucket on drop unless
/// it was acquired above `max_pooled_size`, in which case it is simply freed.
pub struct PooledArray<'a> {
    pool: Option<&'a MemoryPool>,
    bucket: Option<usize>,
    buffer: Vec<i64>,
}

impl PooledArray<'_> {
    /// Mutable access to the underlying buffer.
    pub fn as_mut(&mut self) -> &mut Vec<i64> {
        &mut self.buffer
    }

    /// Read-only access to the underlying buffer.
    pub fn as_slice(&self) -> &[i64] {
        &self.buffer
    }
}

impl Drop for PooledArray<'_> {
    fn drop(&mut self) {
        if let (Some(pool), Some(bucket)) = (self.pool, self.bucket) {
            let buffer = std::mem::take(&mut self.buffer);
            pool.release(bucket, buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_gives_cleared_buffer_with_sufficient_capacity() {
        let pool = MemoryPool::default();
        let mut arr = pool.acquire(20);
        assert!(arr.as_slice().is_empty());
        arr.as_mut().push(1);
        assert_eq!(arr.as_slice(), &[1]);
    }

    #[test]
    fn returned_buffer_is_reused() {
        let pool = MemoryPool::default();
        {
            let _arr = pool.acquire(5);
        }
        let stats_before = pool.stats();
        {
            let _arr = pool.acquire(5);
        }
        assert!(pool.stats().reuse_hits > stats_before.reuse_hits);
    }

    #[test]
    fn oversized_arrays_bypass_the_pool() {
        let pool = MemoryPool::new(50, 1_000);
        {
            let _arr = pool.acquire(5_000);
        }
        assert_eq!(pool.pooled_len(), 0);
    }

    #[test]
    fn pool_size_is_stable_after_many_acquire_release_cycles() {
        let pool = MemoryPool::default();
        let before = pool.pooled_len();
        for _ in 0..100 {
            let mut arr = pool.acquire(30);
            arr.as_mut().push(1);
        }
        // Bucket never holds more than one array for this bucket size given
        // sequential, non-overlapping acquire/release.
        assert!(pool.pooled_len() <= before + 1);
    }

    #[test]
    fn free_list_never_exceeds_its_cap() {
        let pool = MemoryPool::new(2, 1_000);
        let mut held = Vec::new();
        for _ in 0..5 {
            held.push(pool.acquire(5));
        }
        drop(held);
        assert!(pool.pooled_len() <= 2);
    }

    #[test]
    fn clear_drops_all_pooled_arrays() {
        let pool = MemoryPool::default();
        {
            let _arr = pool.acquire(5);
        }
        assert!(pool.pooled_len() > 0);
        pool.clear();
        assert_eq!(pool.pooled_len(), 0);
    }
}
