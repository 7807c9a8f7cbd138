use crate::core::geo::TileCoord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

type CacheKey = (String, TileCoord);

/// In-memory cache of encoded tile bytes using LRU eviction.
///
/// Keys include the source so imagery and elevation tiles at the same
/// coordinate never collide.
#[derive(Debug)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<CacheKey, Arc<Vec<u8>>>>>,
}

impl TileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Get a tile from the cache
    pub fn get(&self, source: &str, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        let key = (source.to_string(), *coord);
        self.cache.lock().ok()?.get(&key).cloned()
    }

    /// Insert a tile into the cache
    pub fn insert(&self, source: &str, coord: TileCoord, data: Arc<Vec<u8>>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put((source.to_string(), coord), data);
        }
    }

    pub fn contains(&self, source: &str, coord: &TileCoord) -> bool {
        let key = (source.to_string(), *coord);
        self.cache
            .lock()
            .ok()
            .map(|cache| cache.contains(&key))
            .unwrap_or(false)
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().ok().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for TileCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(crate::core::config::LoaderConfig::default().cache_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_do_not_collide() {
        let cache = TileCache::new(4);
        let coord = TileCoord::new(1, 2, 3);
        cache.insert("imagery", coord, Arc::new(vec![1]));
        cache.insert("elevation", coord, Arc::new(vec![2]));

        assert_eq!(cache.len(), 2);
        assert_eq!(*cache.get("imagery", &coord).unwrap(), vec![1]);
        assert_eq!(*cache.get("elevation", &coord).unwrap(), vec![2]);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = TileCache::new(2);
        let a = TileCoord::new(1, 1, 1);
        let b = TileCoord::new(2, 2, 2);
        let c = TileCoord::new(3, 3, 3);

        cache.insert("s", a, Arc::new(vec![1]));
        cache.insert("s", b, Arc::new(vec![2]));
        cache.insert("s", c, Arc::new(vec![3]));

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("s", &a));
        assert!(cache.contains("s", &b));
        assert!(cache.contains("s", &c));

        cache.clear();
        assert!(cache.is_empty());
    }
}
