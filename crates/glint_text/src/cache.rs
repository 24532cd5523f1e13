//! Bounded, thread-safe glyph bitmap cache
//!
//! Bitmaps are keyed by (source key, glyph, size) and handed out as
//! `Arc<GlyphBitmap>`, so a bitmap evicted while a run still holds it stays
//! alive until the run is dropped.
//!
//! The map lock is only held to find or create a key's slot. Rasterization
//! happens outside it, inside the slot's `OnceLock`, so concurrent requests
//! for the same key block on that one slot and reuse its result while other
//! keys proceed. A slot stays pinned while it renders, so evicting it
//! mid-render never causes a second rasterization of the same key.

use crate::rasterizer::GlyphBitmap;
use crate::resolver::{GlyphRef, GlyphResolver};
use lru::LruCache;
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Entries kept by the global cache
pub const DEFAULT_CAPACITY: usize = 2048;

/// Cache key for a rasterized glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    /// Process-unique source key, see [`GlyphRef::source_key`]
    pub source: u32,
    pub glyph_id: u32,
    pub size_px: u16,
}

impl GlyphKey {
    /// Glyph id of the missing box, outside the range of real glyph ids
    pub const MISSING_GLYPH: u32 = u32::MAX;

    pub fn new(glyph: &GlyphRef, size_px: u16) -> Self {
        let glyph_id = if glyph.is_missing() {
            Self::MISSING_GLYPH
        } else {
            u32::from(glyph.glyph_id)
        };
        Self {
            source: glyph.source_key,
            glyph_id,
            size_px,
        }
    }
}

/// Counters for cache behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub rasterizations: u64,
    pub evictions: u64,
}

type Slot = Arc<OnceLock<Arc<GlyphBitmap>>>;

struct Entries {
    lru: LruCache<GlyphKey, Slot>,
    /// Slots whose first render has not finished yet
    in_flight: FxHashMap<GlyphKey, Slot>,
}

/// LRU cache of rasterized glyphs
pub struct GlyphCache {
    entries: Mutex<Entries>,
    hits: AtomicU64,
    rasterizations: AtomicU64,
    evictions: AtomicU64,
}

impl GlyphCache {
    /// Create a cache holding at most `capacity` glyphs
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            tracing::warn!("Glyph cache capacity 0 is invalid, using 1");
            NonZeroUsize::MIN
        });
        Self {
            entries: Mutex::new(Entries {
                lru: LruCache::new(capacity),
                in_flight: FxHashMap::default(),
            }),
            hits: AtomicU64::new(0),
            rasterizations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the bitmap for `key`, rendering it with `render` on a miss.
    ///
    /// `render` runs at most once per key while the entry is cached or being
    /// rendered.
    pub fn get_or_insert_with<F>(&self, key: GlyphKey, render: F) -> Arc<GlyphBitmap>
    where
        F: FnOnce() -> GlyphBitmap,
    {
        let slot = {
            let mut entries = self.lock();
            match entries.lru.get(&key) {
                Some(slot) => Arc::clone(slot),
                None => {
                    let slot = match entries.in_flight.get(&key) {
                        Some(slot) => Arc::clone(slot),
                        None => {
                            let slot = Slot::default();
                            entries.in_flight.insert(key, Arc::clone(&slot));
                            slot
                        }
                    };
                    self.insert_slot(&mut entries, key, Arc::clone(&slot));
                    slot
                }
            }
        };

        let mut rendered = false;
        let bitmap = slot.get_or_init(|| {
            rendered = true;
            Arc::new(render())
        });

        if rendered {
            self.rasterizations.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Rasterized glyph {:?}", key);

            let mut entries = self.lock();
            entries.in_flight.remove(&key);
            // Evicted while rendering: the finished bitmap still lands in the cache
            if !entries.lru.contains(&key) {
                self.insert_slot(&mut entries, key, Arc::clone(&slot));
            }
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        Arc::clone(bitmap)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_slot(&self, entries: &mut Entries, key: GlyphKey, slot: Slot) {
        if let Some((evicted, _)) = entries.lru.push(key, slot) {
            // push hands back the old value when the key was present
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Evicted glyph {:?}", evicted);
            }
        }
    }

    /// Bitmap for `glyph` at `size_px`, rasterized through `resolver` on a miss
    pub fn get_or_render(
        &self,
        resolver: &GlyphResolver,
        glyph: &GlyphRef,
        size_px: u16,
    ) -> Arc<GlyphBitmap> {
        self.get_or_insert_with(GlyphKey::new(glyph, size_px), || {
            resolver.rasterize(glyph, size_px)
        })
    }

    /// Whether `key` is cached; does not touch recency
    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.lock().lru.contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().lru.cap().get()
    }

    /// Drop every cached bitmap
    pub fn clear(&self) {
        let mut entries = self.lock();
        tracing::debug!("Clearing glyph cache ({} entries)", entries.lru.len());
        entries.lru.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            rasterizations: self.rasterizations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
