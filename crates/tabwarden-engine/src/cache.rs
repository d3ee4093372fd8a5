//! Write-through read cache over the persistent store.
//!
//! Cuts duplicate reads within a processing burst: a lookup reports which
//! keys missed so the caller round-trips only those to the backend.

use crate::slice::{StorageKey, StorageSlice};

/// Result of a cache lookup: the cached subset plus the keys that missed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheLookup {
    pub data: StorageSlice,
    pub miss_keys: Vec<StorageKey>,
}

#[derive(Debug, Default)]
pub struct StoreCache {
    data: StorageSlice,
}

impl StoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, keys: &[StorageKey]) -> CacheLookup {
        let mut hit_keys = Vec::new();
        let mut miss_keys = Vec::new();
        for &key in keys {
            if self.data.contains(key) {
                hit_keys.push(key);
            } else {
                miss_keys.push(key);
            }
        }
        CacheLookup {
            data: self.data.project(&hit_keys),
            miss_keys,
        }
    }

    pub fn put(&mut self, patch: StorageSlice) {
        self.data.merge(patch);
    }

    pub fn clear(&mut self) {
        self.data = StorageSlice::default();
    }
}
