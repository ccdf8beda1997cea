//! Time-boxed, size-bounded metadata cache

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

use super::PackageMetadata;

/// Default time-to-live for cached metadata (1 hour)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default maximum number of cached packages
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry {
    metadata: Arc<PackageMetadata>,
    fetched_at: Instant,
}

/// Package metadata cache keyed by package name.
///
/// Entries expire `ttl` after they were stored and are dropped on the next read.
/// Once `capacity` is reached the least recently used entry is evicted.
#[derive(Debug)]
pub struct MetadataCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl MetadataCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get fresh metadata for a package. Expired entries are removed and reported absent.
    pub fn get(&self, name: &str) -> Option<Arc<PackageMetadata>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match entries.get(name) {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                return Some(Arc::clone(&entry.metadata));
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            trace!(package = name, "cache entry expired");
            entries.pop(name);
        }
        None
    }

    pub fn insert(&self, name: &str, metadata: Arc<PackageMetadata>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(
            name.to_string(),
            CacheEntry {
                metadata,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}
