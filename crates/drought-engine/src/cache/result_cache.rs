//! LRU cache for finished analysis results.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::CacheStats;

/// Entry-bounded LRU cache indexed by a 64-bit content hash of the key.
///
/// The full key is stored next to each value and compared on lookup, so a
/// hash collision is a miss rather than another key's result. Values are
/// shared through `Arc` so a hit never copies the result.
pub struct ResultCache<K, V> {
    cache: LruCache<u64, (K, Arc<V>)>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K: Hash + PartialEq, V> ResultCache<K, V> {
    /// Create a cache holding at most `max_entries` results (at least one).
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a result, updating LRU order and hit/miss counters.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        self.get_hashed(hash_key(key), key)
    }

    pub(crate) fn get_hashed(&mut self, hash: u64, key: &K) -> Option<Arc<V>> {
        match self.cache.get(&hash) {
            Some((stored, value)) if stored == key => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(hash, "Result cache hit");
                Some(Arc::clone(value))
            }
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(hash, "Result cache hash collision");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Check if a key exists in the cache without updating LRU order.
    pub fn contains(&self, key: &K) -> bool {
        self.cache
            .peek(&hash_key(key))
            .is_some_and(|(stored, _)| stored == key)
    }

    /// Insert a result, evicting the least recently used one when full.
    ///
    /// A colliding entry under the same hash is replaced.
    pub fn insert(&mut self, key: K, value: Arc<V>) {
        self.insert_hashed(hash_key(&key), key, value);
    }

    pub(crate) fn insert_hashed(&mut self, hash: u64, key: K, value: Arc<V>) {
        if let Some((evicted_hash, _)) = self.cache.push(hash, (key, value)) {
            if evicted_hash != hash {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Clear all entries from the cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

/// Hash any key material into a cache key.
pub fn hash_key<K: Hash + ?Sized>(key: &K) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hasher;

    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
