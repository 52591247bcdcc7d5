//! Cache statistics model.

use serde::{Deserialize, Serialize};

/// Counters for AI answer cache operations.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that found a cached answer.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Answers stored.
    pub inserts: u64,
    /// Entries pushed out by the LRU policy.
    pub evictions: u64,
    /// Entries currently held.
    pub entries: usize,
    /// Maximum number of entries; 0 when the cache is disabled.
    pub capacity: usize,
}
