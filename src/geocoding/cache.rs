//! Caches for geocoding results.

use super::Location;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Storage for resolved locations, keyed by normalized city name.
pub trait GeocodeCache: Send + Sync {
    /// Look up a cached location.
    fn get(&self, key: &str) -> Option<Location>;

    /// Store a location, replacing any previous entry for the key.
    fn insert(&self, key: String, location: Location);

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounded in-memory cache with optional expiry.
///
/// When full, the least recently used entry is evicted. Entries older than the
/// TTL are dropped on lookup. A capacity of zero caches nothing.
pub struct MemoryGeocodeCache {
    entries: Option<Mutex<LruCache<String, (Location, Instant)>>>,
    ttl: Option<Duration>,
}

impl MemoryGeocodeCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    fn is_expired(&self, inserted_at: Instant) -> bool {
        self.ttl.is_some_and(|ttl| inserted_at.elapsed() >= ttl)
    }
}

impl Default for MemoryGeocodeCache {
    fn default() -> Self {
        Self::new(1024, None)
    }
}

impl GeocodeCache for MemoryGeocodeCache {
    fn get(&self, key: &str) -> Option<Location> {
        let mut entries = self.entries.as_ref()?.lock().ok()?;

        let (location, inserted_at) = entries.get(key)?;
        if self.is_expired(*inserted_at) {
            entries.pop(key);
            return None;
        }
        Some(location.clone())
    }

    fn insert(&self, key: String, location: Location) {
        let Some(entries) = &self.entries else {
            return;
        };
        if let Ok(mut entries) = entries.lock() {
            entries.put(key, (location, Instant::now()));
        }
    }

    fn len(&self) -> usize {
        self.entries
            .as_ref()
            .and_then(|entries| entries.lock().ok().map(|e| e.len()))
            .unwrap_or(0)
    }
}
