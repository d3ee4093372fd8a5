//! Typed access to the persistent store, cache-first.
//!
//! Reads consult the in-memory cache and round-trip only the missing keys
//! to the backend; writes go through the cache so a later read in the same
//! burst sees them without another backend call.

use tabwarden_core::activation::ActivationStacks;
use tabwarden_core::history::ClosedTabHistory;
use tabwarden_core::outdated::OutdatedLists;
use tabwarden_core::types::{EvacuatedAlarm, EvacuationMap, ScheduleMap};

use crate::cache::StoreCache;
use crate::error::StoreError;
use crate::host::StorageBackend;
use crate::slice::{StorageKey, StorageSlice};

pub struct TabStore<B> {
    backend: B,
    cache: StoreCache,
}

impl<B: StorageBackend> TabStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: StoreCache::new(),
        }
    }

    /// Read a slice, cache-first.
    pub fn get(&mut self, keys: &[StorageKey]) -> Result<StorageSlice, StoreError> {
        let lookup = self.cache.lookup(keys);
        if lookup.miss_keys.is_empty() {
            return Ok(lookup.data);
        }
        let fetched = self.backend.get(&lookup.miss_keys)?;
        self.cache.put(fetched.clone());
        let mut data = lookup.data;
        data.merge(fetched);
        Ok(data)
    }

    /// Write a slice through the cache to the backend.
    pub fn set(&mut self, patch: StorageSlice) -> Result<(), StoreError> {
        self.cache.put(patch.clone());
        self.backend.set(patch)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    // ─── Typed accessors ──────────────────────────────────────────

    pub fn activation_stacks(&mut self) -> Result<ActivationStacks, StoreError> {
        Ok(self
            .get(&[StorageKey::ActivatedTabs])?
            .activated_tabs
            .unwrap_or_default())
    }

    pub fn update_activation_stacks(&mut self, stacks: ActivationStacks) -> Result<(), StoreError> {
        self.set(StorageSlice {
            activated_tabs: Some(stacks),
            ..StorageSlice::default()
        })
    }

    pub fn outdated_lists(&mut self) -> Result<OutdatedLists, StoreError> {
        Ok(self
            .get(&[StorageKey::OutdatedTabs])?
            .outdated_tabs
            .unwrap_or_default())
    }

    pub fn update_outdated_lists(&mut self, lists: OutdatedLists) -> Result<(), StoreError> {
        self.set(StorageSlice {
            outdated_tabs: Some(lists),
            ..StorageSlice::default()
        })
    }

    pub fn closed_tab_history(&mut self) -> Result<ClosedTabHistory, StoreError> {
        let slice = self.get(&[StorageKey::OpenTabs, StorageKey::ClosedHistory])?;
        Ok(ClosedTabHistory::new(
            slice.open_tabs.unwrap_or_default(),
            slice.closed_history.unwrap_or_default(),
        ))
    }

    pub fn update_closed_tab_history(&mut self, history: ClosedTabHistory) -> Result<(), StoreError> {
        let (tabs, closed) = history.into_parts();
        self.set(StorageSlice {
            open_tabs: Some(tabs),
            closed_history: Some(closed),
            ..StorageSlice::default()
        })
    }

    pub fn schedule(&mut self) -> Result<ScheduleMap, StoreError> {
        Ok(self
            .get(&[StorageKey::Schedule])?
            .schedule
            .unwrap_or_default())
    }

    pub fn update_schedule(&mut self, schedule: ScheduleMap) -> Result<(), StoreError> {
        self.set(StorageSlice {
            schedule: Some(schedule),
            ..StorageSlice::default()
        })
    }

    pub fn evacuated_alarms(&mut self) -> Result<Vec<EvacuatedAlarm>, StoreError> {
        Ok(self
            .get(&[StorageKey::EvacuatedAlarms])?
            .evacuated_alarms
            .unwrap_or_default())
    }

    pub fn evacuation_map(&mut self) -> Result<EvacuationMap, StoreError> {
        Ok(self
            .get(&[StorageKey::EvacuationMap])?
            .evacuation_map
            .unwrap_or_default())
    }

    pub fn update_evacuation_map(&mut self, map: EvacuationMap) -> Result<(), StoreError> {
        self.set(StorageSlice {
            evacuation_map: Some(map),
            ..StorageSlice::default()
        })
    }
}
