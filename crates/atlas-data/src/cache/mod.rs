//! Histogram caching

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use atlas_core::YearRange;
use parking_lot::RwLock;

use crate::histogram::{Aggregation, Histogram};

/// Identifies one binning: the layer data it came from, the window and the aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistogramKey {
    pub generation: u64,
    pub window: YearRange,
    pub aggregation: Aggregation,
}

#[derive(Default)]
struct Entries {
    map: AHashMap<HistogramKey, Arc<Histogram>>,
    /// Insertion order, oldest first
    order: VecDeque<HistogramKey>,
}

/// Bounded cache of computed histograms
#[derive(Clone)]
pub struct HistogramCache {
    entries: Arc<RwLock<Entries>>,
    capacity: usize,
}

impl HistogramCache {
    /// Create a cache holding at most `capacity` histograms
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &HistogramKey) -> Option<Arc<Histogram>> {
        self.entries.read().map.get(key).cloned()
    }

    /// Store a histogram, evicting the oldest entry when full
    pub fn put(&self, key: HistogramKey, histogram: Arc<Histogram>) {
        let mut entries = self.entries.write();

        if entries.map.insert(key, histogram).is_some() {
            return;
        }
        entries.order.push_back(key);

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.map.remove(&oldest);
            }
        }
    }

    /// Cached histogram for `key`, computing and storing it on a miss
    pub fn get_or_insert_with(
        &self,
        key: HistogramKey,
        compute: impl FnOnce() -> Histogram,
    ) -> Arc<Histogram> {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let histogram = Arc::new(compute());
        self.put(key, histogram.clone());
        histogram
    }

    /// Drop every entry computed from an older generation
    pub fn retain_generation(&self, generation: u64) {
        let mut entries = self.entries.write();
        entries.map.retain(|key, _| key.generation == generation);
        entries.order.retain(|key| key.generation == generation);
    }

    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.map.clear();
        entries.order.clear();
    }
}

impl Default for HistogramCache {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(generation: u64, min: i32) -> HistogramKey {
        HistogramKey {
            generation,
            window: YearRange::new(min, min + 100),
            aggregation: Aggregation::Sum,
        }
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let cache = HistogramCache::new(2);
        cache.put(key(1, 1800), Arc::new(Histogram::default()));
        cache.put(key(1, 1810), Arc::new(Histogram::default()));
        cache.put(key(1, 1820), Arc::new(Histogram::default()));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(1, 1800)).is_none());
        assert!(cache.get(&key(1, 1820)).is_some());
    }

    #[test]
    fn test_get_or_insert_computes_once() {
        let cache = HistogramCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_insert_with(key(1, 1800), || {
                calls += 1;
                Histogram::default()
            });
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_retain_generation() {
        let cache = HistogramCache::default();
        cache.put(key(1, 1800), Arc::new(Histogram::default()));
        cache.put(key(2, 1800), Arc::new(Histogram::default()));
        cache.retain_generation(2);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(2, 1800)).is_some());
    }
}
