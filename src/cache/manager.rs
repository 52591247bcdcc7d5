// AI answer cache - key generation, LRU storage and stats

use crate::cache::models::CacheStats;
use crate::metrics;
use crate::models::Direction;
use lru::LruCache;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use tracing::debug;

struct Inner {
    entries: LruCache<String, String>,
    stats: CacheStats,
}

/// In-memory LRU cache of cleaned AI answers.
///
/// A capacity of zero disables caching: lookups always miss and inserts are
/// dropped.
pub struct ConversionCache {
    inner: Option<Mutex<Inner>>,
}

impl ConversionCache {
    pub fn new(max_entries: usize) -> Self {
        let inner = NonZeroUsize::new(max_entries).map(|capacity| {
            Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats {
                    capacity: max_entries,
                    ..CacheStats::default()
                },
            })
        });
        Self { inner }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// SHA256 key over model, direction and source code.
    pub fn key(model: &str, direction: Direction, source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(direction.label().as_bytes());
        hasher.update([0u8]);
        hasher.update(source.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let inner = self.inner.as_ref()?;
        let mut inner = inner.lock();
        match inner.entries.get(key).cloned() {
            Some(answer) => {
                inner.stats.hits += 1;
                metrics::record_cache_hit();
                debug!("Cache hit: {}", key.get(..16).unwrap_or(key));
                Some(answer)
            }
            None => {
                inner.stats.misses += 1;
                metrics::record_cache_miss();
                debug!("Cache miss: {}", key.get(..16).unwrap_or(key));
                None
            }
        }
    }

    pub fn insert(&self, key: String, answer: String) {
        let Some(inner) = self.inner.as_ref() else {
            return;
        };
        let mut inner = inner.lock();
        if let Some((evicted, _)) = inner.entries.push(key.clone(), answer) {
            if evicted != key {
                inner.stats.evictions += 1;
                metrics::record_cache_eviction();
            }
        }
        inner.stats.inserts += 1;
        metrics::record_cache_insert();
        metrics::update_cache_entries(inner.entries.len());
    }

    pub fn stats(&self) -> CacheStats {
        match &self.inner {
            Some(inner) => {
                let inner = inner.lock();
                CacheStats {
                    entries: inner.entries.len(),
                    ..inner.stats.clone()
                }
            }
            None => CacheStats::default(),
        }
    }

    pub fn clear(&self) {
        if let Some(inner) = &self.inner {
            inner.lock().entries.clear();
            metrics::update_cache_entries(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[test]
    fn test_key_depends_on_all_inputs() {
        let py = Direction::from_source(Language::Python);
        let cpp = Direction::from_source(Language::Cpp);
        let base = ConversionCache::key("m", py, "x = 1");
        assert_eq!(base.len(), 64);
        assert_eq!(base, ConversionCache::key("m", py, "x = 1"));
        assert_ne!(base, ConversionCache::key("other", py, "x = 1"));
        assert_ne!(base, ConversionCache::key("m", cpp, "x = 1"));
        assert_ne!(base, ConversionCache::key("m", py, "x = 2"));
    }

    #[test]
    fn test_eviction_counts() {
        let cache = ConversionCache::new(1);
        cache.insert("a".into(), "1".into());
        cache.insert("b".into(), "2".into());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));

        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_replacing_same_key_is_not_eviction() {
        let cache = ConversionCache::new(2);
        cache.insert("a".into(), "1".into());
        cache.insert("a".into(), "2".into());
        assert_eq!(cache.get("a").as_deref(), Some("2"));
        assert_eq!(cache.stats().evictions, 0);
    }
}
