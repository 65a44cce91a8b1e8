//! Response cache storage.
//!
//! An unbounded map from request identity to memoized payload. Entries are
//! only ever removed all at once; each wholesale clear starts a new epoch.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::posts::CacheItem;

use super::keys::RequestKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Clear counter observed before a miss is resolved. Writes tagged with an
/// older epoch are dropped so that a response fetched before a refresh never
/// survives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Epoch(u64);

#[derive(Default)]
struct Entries {
    epoch: u64,
    map: HashMap<RequestKey, Arc<CacheItem>>,
}

#[derive(Default)]
pub struct ResponseStore {
    entries: RwLock<Entries>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> Epoch {
        Epoch(rw_read(&self.entries, SOURCE, "epoch").epoch)
    }

    pub fn get(&self, key: &RequestKey) -> Option<Arc<CacheItem>> {
        rw_read(&self.entries, SOURCE, "get").map.get(key).cloned()
    }

    /// Store `item` unless the map was cleared after `epoch` was taken.
    pub fn set(&self, epoch: Epoch, key: RequestKey, item: CacheItem) -> bool {
        let mut guard = rw_write(&self.entries, SOURCE, "set");
        if guard.epoch != epoch.0 {
            return false;
        }
        guard.map.insert(key, Arc::new(item));
        true
    }

    /// Drop every entry, returning how many were held.
    pub fn clear(&self) -> usize {
        let mut guard = rw_write(&self.entries, SOURCE, "clear");
        let cleared = guard.map.len();
        guard.map.clear();
        guard.epoch = guard.epoch.wrapping_add(1);
        cleared
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
