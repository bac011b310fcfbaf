//! Per-handle cache of decoded pages.
//!
//! Only whole pages are cached; window reads of a cached page are sliced out
//! of the cached copy. The reader clears the cache whenever the current
//! scene changes, so entries never outlive the scene they were read for.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::block::PixelData;

/// Default number of pages to keep. Zero disables the cache.
pub const DEFAULT_PLANE_CACHE_CAPACITY: usize = 0;

/// Cache key for a decoded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaneKey {
    /// Scene the page was read for
    pub scene: usize,

    /// Directory index of the page in the file
    pub ifd: usize,
}

/// LRU cache of decoded pages, shaped `[rows, cols, samples]`.
#[derive(Debug)]
pub struct PlaneCache {
    cache: Option<LruCache<PlaneKey, Arc<PixelData>>>,
    hits: u64,
    misses: u64,
}

impl PlaneCache {
    /// Create a cache holding at most `capacity` pages.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Look up a page, marking it as recently used.
    pub fn get(&mut self, key: &PlaneKey) -> Option<Arc<PixelData>> {
        let cache = self.cache.as_mut()?;
        match cache.get(key) {
            Some(data) => {
                self.hits += 1;
                Some(Arc::clone(data))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a page. Does nothing when the cache is disabled.
    pub fn put(&mut self, key: PlaneKey, data: Arc<PixelData>) {
        if let Some(cache) = self.cache.as_mut() {
            cache.put(key, data);
        }
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
