use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use serde::Serialize;

use crate::types::FeatureRow;

/// Default bound on memoized rows.
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Raw model outputs memoized on row equality, bounded to `capacity` rows.
pub struct PredictionCache {
    entries: Cache<FeatureRow, f32>,
    capacity: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    pub capacity: u64,
    pub hits: u64,
    pub misses: u64,
}

impl Default for PredictionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl PredictionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache holding at most `capacity` rows; least useful rows are evicted first.
    pub fn with_capacity(capacity: u64) -> Self {
        let capacity = capacity.max(1);
        PredictionCache {
            entries: Cache::builder().max_capacity(capacity).build(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn get(&self, row: &FeatureRow) -> Option<f32> {
        match self.entries.get(row) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, row: FeatureRow, value: f32) {
        self.entries.insert(row, value);
    }

    /// Drops every entry and returns how many there were.
    pub fn clear(&self) -> u64 {
        self.entries.run_pending_tasks();
        let cleared = self.entries.entry_count();
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
        cleared
    }

    pub fn stats(&self) -> CacheStats {
        // Evictions are applied lazily; settle them so the count is exact.
        self.entries.run_pending_tasks();
        CacheStats {
            entries: self.entries.entry_count(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
