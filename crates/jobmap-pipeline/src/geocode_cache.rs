//! Durable address → coordinate cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use jobmap_api::{ApiError, GeocodingClient};
use jobmap_core::Coordinate;

use crate::storage::{load_json, remove_logged, save_json_logged, KeyValueStore};

pub const GEOCODE_CACHE_KEY: &str = "ljm_geocode_cache_v3";

type CacheMap = HashMap<String, Coordinate>;

/// Unbounded cache persisted under [`GEOCODE_CACHE_KEY`]. Entries are only
/// removed by [`GeocodeCache::clear`].
pub struct GeocodeCache {
    store: Arc<dyn KeyValueStore>,
    // Serialises the re-read/merge/write sequence across threads; the store
    // may also be shared with other cache handles, which the re-read covers.
    write_guard: Mutex<()>,
}

impl GeocodeCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn lookup(&self, address: &str) -> Option<Coordinate> {
        self.read().get(address).copied()
    }

    /// Merge one entry into the persisted cache.
    ///
    /// The persisted map is read again right before writing so entries stored
    /// by concurrent geocode tasks since this task started are kept.
    pub fn store(&self, address: &str, coordinate: Coordinate) {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut latest = self.read();
        latest.insert(address.to_owned(), coordinate);
        save_json_logged(self.store.as_ref(), GEOCODE_CACHE_KEY, &latest);
    }

    pub fn clear(&self) {
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        remove_logged(self.store.as_ref(), GEOCODE_CACHE_KEY);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached coordinate for `address`, or one geocoding request whose
    /// result is cached. Empty results are not cached.
    ///
    /// # Errors
    ///
    /// Propagates the geocoding client's [`ApiError`] on a cache miss.
    pub async fn resolve(
        &self,
        geocoder: &GeocodingClient,
        address: &str,
        proximity: Option<Coordinate>,
        country: Option<&str>,
    ) -> Result<Option<Coordinate>, ApiError> {
        if let Some(hit) = self.lookup(address) {
            tracing::debug!(address, "geocode cache hit");
            return Ok(Some(hit));
        }
        let found = geocoder.geocode(address, proximity, country).await?;
        if let Some(coordinate) = found {
            self.store(address, coordinate);
        }
        Ok(found)
    }

    fn read(&self) -> CacheMap {
        load_json(self.store.as_ref(), GEOCODE_CACHE_KEY).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn store_then_lookup_round_trips() {
        let cache = GeocodeCache::new(Arc::new(MemoryStore::new()));
        assert!(cache.lookup("Berlin").is_none());
        cache.store("Berlin", Coordinate::new(52.52, 13.405));
        assert_eq!(cache.lookup("Berlin"), Some(Coordinate::new(52.52, 13.405)));
    }

    #[test]
    fn interleaved_writer_entry_survives() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let ours = GeocodeCache::new(Arc::clone(&store));
        let theirs = GeocodeCache::new(Arc::clone(&store));

        // Our flow started (and read the cache) before B landed.
        assert!(ours.lookup("A").is_none());
        theirs.store("B", Coordinate::new(2.0, 2.0));
        ours.store("A", Coordinate::new(1.0, 1.0));

        let reread = GeocodeCache::new(store);
        assert_eq!(reread.lookup("A"), Some(Coordinate::new(1.0, 1.0)));
        assert_eq!(reread.lookup("B"), Some(Coordinate::new(2.0, 2.0)));
    }

    #[test]
    fn concurrent_threads_lose_no_entries() {
        let cache = Arc::new(GeocodeCache::new(Arc::new(MemoryStore::new())));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..10 {
                        let coordinate = Coordinate::new(f64::from(i), f64::from(j));
                        cache.store(&format!("addr-{i}-{j}"), coordinate);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 80);
    }

    #[test]
    fn corrupt_cache_reads_as_empty_and_is_overwritten() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set(GEOCODE_CACHE_KEY, "[[[").unwrap();
        let cache = GeocodeCache::new(Arc::clone(&store));
        assert!(cache.is_empty());
        cache.store("Paris", Coordinate::new(48.85, 2.35));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_removes_every_entry() {
        let cache = GeocodeCache::new(Arc::new(MemoryStore::new()));
        cache.store("a", Coordinate::new(1.0, 1.0));
        cache.store("b", Coordinate::new(2.0, 2.0));
        cache.clear();
        assert!(cache.is_empty());
    }
}
