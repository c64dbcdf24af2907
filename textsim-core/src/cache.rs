//! Bounded TTL cache for similarity results.
//!
//! Keys are fingerprint byte strings covering the algorithm, the
//! cache-relevant configuration and both inputs. Only similarities are
//! cached: distances are cheap to recompute from a cached similarity for
//! the normalized kernels, and edit distances are not cached at all.
//!
//! Eviction sweeps expired entries first; if the map is still over
//! capacity, the oldest entries by insertion time go until the map is at
//! half capacity.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use xxhash_rust::xxh64::Xxh64Builder;

/// Maximum number of cached results.
pub const MAX_CACHE_ENTRIES: usize = 10_000;

/// Entry lifetime.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Rough per-entry bookkeeping overhead for the memory estimate, matching
/// map slot plus timestamps.
const ENTRY_OVERHEAD: usize = 64;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: f64,
    inserted_at: Instant,
}

/// Similarity cache keyed by fingerprint bytes, xxh64-hashed.
pub struct ResultCache {
    entries: HashMap<Vec<u8>, CacheEntry, Xxh64Builder>,
    capacity: usize,
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_limits(MAX_CACHE_ENTRIES, CACHE_TTL)
    }

    pub fn with_limits(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_hasher(Xxh64Builder::new(0)),
            capacity,
            ttl,
        }
    }

    /// Cached similarity for `key`, dropping the entry if it has expired.
    pub fn get(&mut self, key: &[u8]) -> Option<f64> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => Some(entry.value),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a similarity, evicting first when at capacity.
    pub fn insert(&mut self, key: Vec<u8>, value: f64) {
        if self.entries.len() >= self.capacity {
            self.evict();
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.inserted_at) < self.ttl);

        if self.entries.len() >= self.capacity {
            let mut by_age: Vec<(Instant, Vec<u8>)> = self
                .entries
                .iter()
                .map(|(key, entry)| (entry.inserted_at, key.clone()))
                .collect();
            by_age.sort_by_key(|&(inserted_at, _)| inserted_at);

            let target = self.capacity / 2;
            let to_remove = self.entries.len().saturating_sub(target);
            for (_, key) in by_age.into_iter().take(to_remove) {
                self.entries.remove(&key);
            }
            tracing::debug!(removed = to_remove, remaining = self.entries.len(), "cache eviction");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimated resident bytes: key bytes plus fixed per-entry overhead.
    pub fn memory_usage(&self) -> usize {
        self.entries
            .keys()
            .map(|key| key.len() + ENTRY_OVERHEAD)
            .sum()
    }
}

/// Fingerprint for one cached computation: algorithm tag, preprocessing
/// tag, case mode, n-gram size, then both inputs (length-prefixed so the
/// pair is unambiguous).
pub fn fingerprint(
    algorithm_tag: u8,
    preprocessing_tag: u8,
    case_tag: u8,
    ngram_size: u32,
    s1: &str,
    s2: &str,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + s1.len() + s2.len());
    key.push(algorithm_tag);
    key.push(preprocessing_tag);
    key.push(case_tag);
    key.extend_from_slice(&ngram_size.to_le_bytes());
    key.extend_from_slice(&(s1.len() as u64).to_le_bytes());
    key.extend_from_slice(s1.as_bytes());
    key.extend_from_slice(s2.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut cache = ResultCache::new();
        let key = fingerprint(0, 1, 0, 2, "hello", "world");
        assert_eq!(cache.get(&key), None);

        cache.insert(key.clone(), 0.75);
        assert_eq!(cache.get(&key), Some(0.75));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fingerprint_distinguishes_pair_boundaries() {
        // ("ab", "c") and ("a", "bc") must not collide
        let first = fingerprint(0, 1, 0, 2, "ab", "c");
        let second = fingerprint(0, 1, 0, 2, "a", "bc");
        assert_ne!(first, second);
    }

    #[test]
    fn test_fingerprint_covers_configuration() {
        let base = fingerprint(0, 1, 0, 2, "a", "b");
        assert_ne!(base, fingerprint(1, 1, 0, 2, "a", "b"));
        assert_ne!(base, fingerprint(0, 3, 0, 2, "a", "b"));
        assert_ne!(base, fingerprint(0, 1, 1, 2, "a", "b"));
        assert_ne!(base, fingerprint(0, 1, 0, 3, "a", "b"));
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = ResultCache::with_limits(16, Duration::ZERO);
        let key = fingerprint(0, 1, 0, 2, "a", "b");
        cache.insert(key.clone(), 1.0);
        // Zero TTL expires entries on the next probe
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_eviction_to_half_capacity() {
        let mut cache = ResultCache::with_limits(4, CACHE_TTL);
        for i in 0..4u32 {
            cache.insert(fingerprint(0, 1, 0, i, "a", "b"), 0.5);
        }
        assert_eq!(cache.len(), 4);

        // The fifth insert trips eviction down to half capacity first
        cache.insert(fingerprint(0, 1, 0, 99, "a", "b"), 0.5);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&fingerprint(0, 1, 0, 99, "a", "b")), Some(0.5));
    }

    #[test]
    fn test_memory_usage_grows_with_entries() {
        let mut cache = ResultCache::new();
        assert_eq!(cache.memory_usage(), 0);
        cache.insert(fingerprint(0, 1, 0, 2, "hello", "world"), 0.5);
        assert!(cache.memory_usage() > 0);
    }
}
