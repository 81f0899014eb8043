use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, OnceLock},
};

use crate::{
    foundation::error::PanoResult,
    projection::{
        mapping::{MappingTable, compute_mapping, validate_mapping_inputs},
        view::{MappingKey, ViewConfig},
    },
};

/// Counters describing cache effectiveness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Tables currently held.
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Memoizes [`MappingTable`]s by their exact [`MappingKey`].
///
/// The cache is an ordinary value: a job creates (or is handed) one and shares it by `Arc`.
/// Concurrent requests for the same key build the table once; the map lock is only held while
/// looking up or inserting the per-key slot, never during the O(W·H) build.
///
/// With a capacity, inserting a new key beyond it evicts the least recently used entry. Tables
/// already handed out stay alive through their `Arc`.
#[derive(Debug, Default)]
pub struct MappingCache {
    capacity: Option<usize>,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    slots: HashMap<MappingKey, Slot>,
    tick: u64,
    stats: CacheStats,
}

#[derive(Debug)]
struct Slot {
    cell: Arc<OnceLock<Arc<MappingTable>>>,
    last_used: u64,
}

impl MappingCache {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` tables (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            inner: Mutex::default(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Return the table for `view` over a `pano_width x pano_height` panorama, building it on
    /// first use.
    pub fn get_or_build(
        &self,
        pano_width: u32,
        pano_height: u32,
        view: &ViewConfig,
    ) -> PanoResult<Arc<MappingTable>> {
        validate_mapping_inputs(pano_width, pano_height, view)?;
        let key = MappingKey::new(pano_width, pano_height, view);

        let cell = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            inner.tick += 1;
            let tick = inner.tick;
            if let Some(slot) = inner.slots.get_mut(&key) {
                slot.last_used = tick;
                let cell = slot.cell.clone();
                inner.stats.hits += 1;
                cell
            } else {
                if let Some(cap) = self.capacity {
                    while inner.slots.len() >= cap {
                        if !inner.evict_lru() {
                            break;
                        }
                    }
                }
                let cell = Arc::new(OnceLock::new());
                inner.slots.insert(
                    key,
                    Slot {
                        cell: cell.clone(),
                        last_used: tick,
                    },
                );
                inner.stats.misses += 1;
                cell
            }
        };

        let table = cell.get_or_init(|| {
            tracing::debug!(
                pano_width,
                pano_height,
                width = view.output_width,
                height = view.output_height,
                yaw_deg = view.yaw_rad.to_degrees(),
                "building mapping table"
            );
            Arc::new(compute_mapping(pano_width, pano_height, view))
        });
        Ok(table.clone())
    }

    /// Whether a table for this key is present (built or being built).
    pub fn contains(&self, pano_width: u32, pano_height: u32, view: &ViewConfig) -> bool {
        let key = MappingKey::new(pano_width, pano_height, view);
        self.lock().slots.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached table.
    pub fn clear(&self) {
        self.lock().slots.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.slots.len(),
            ..inner.stats
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheInner {
    fn evict_lru(&mut self) -> bool {
        let Some(victim) = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| *key)
        else {
            return false;
        };
        self.slots.remove(&victim);
        self.stats.evictions += 1;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/cache.rs"]
mod tests;
