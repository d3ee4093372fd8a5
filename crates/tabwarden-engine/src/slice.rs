//! Partial views of the persistent store.
//!
//! Every persisted collection lives under one well-known key; handlers
//! read the keys they need, rebuild whole values, and write them back.
//! A [`StorageSlice`] carries any subset of the keys: absent fields are
//! simply not part of the read/write.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use tabwarden_core::activation::ActivationStacks;
use tabwarden_core::outdated::OutdatedLists;
use tabwarden_core::types::{ClosedTab, EvacuatedAlarm, EvacuationMap, ScheduleMap, Tab, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKey {
    OpenTabs,
    ClosedHistory,
    ActivatedTabs,
    OutdatedTabs,
    Schedule,
    EvacuatedAlarms,
    EvacuationMap,
}

impl StorageKey {
    pub const ALL: [Self; 7] = [
        Self::OpenTabs,
        Self::ClosedHistory,
        Self::ActivatedTabs,
        Self::OutdatedTabs,
        Self::Schedule,
        Self::EvacuatedAlarms,
        Self::EvacuationMap,
    ];
}

/// A subset of the persisted state. `None` means "not included", which is
/// distinct from an included-but-empty collection.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSlice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_tabs: Option<HashMap<WindowId, Vec<Tab>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_history: Option<HashMap<WindowId, Vec<ClosedTab>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated_tabs: Option<ActivationStacks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdated_tabs: Option<OutdatedLists>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evacuated_alarms: Option<Vec<EvacuatedAlarm>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evacuation_map: Option<EvacuationMap>,
}

impl StorageSlice {
    pub fn contains(&self, key: StorageKey) -> bool {
        match key {
            StorageKey::OpenTabs => self.open_tabs.is_some(),
            StorageKey::ClosedHistory => self.closed_history.is_some(),
            StorageKey::ActivatedTabs => self.activated_tabs.is_some(),
            StorageKey::OutdatedTabs => self.outdated_tabs.is_some(),
            StorageKey::Schedule => self.schedule.is_some(),
            StorageKey::EvacuatedAlarms => self.evacuated_alarms.is_some(),
            StorageKey::EvacuationMap => self.evacuation_map.is_some(),
        }
    }

    pub fn present_keys(&self) -> Vec<StorageKey> {
        StorageKey::ALL
            .into_iter()
            .filter(|&key| self.contains(key))
            .collect()
    }

    /// Overlay `patch` on this slice; keys present in the patch win.
    pub fn merge(&mut self, patch: StorageSlice) {
        if patch.open_tabs.is_some() {
            self.open_tabs = patch.open_tabs;
        }
        if patch.closed_history.is_some() {
            self.closed_history = patch.closed_history;
        }
        if patch.activated_tabs.is_some() {
            self.activated_tabs = patch.activated_tabs;
        }
        if patch.outdated_tabs.is_some() {
            self.outdated_tabs = patch.outdated_tabs;
        }
        if patch.schedule.is_some() {
            self.schedule = patch.schedule;
        }
        if patch.evacuated_alarms.is_some() {
            self.evacuated_alarms = patch.evacuated_alarms;
        }
        if patch.evacuation_map.is_some() {
            self.evacuation_map = patch.evacuation_map;
        }
    }

    /// Restrict to the requested keys.
    pub fn project(&self, keys: &[StorageKey]) -> StorageSlice {
        let mut out = StorageSlice::default();
        for &key in keys {
            match key {
                StorageKey::OpenTabs => out.open_tabs = self.open_tabs.clone(),
                StorageKey::ClosedHistory => out.closed_history = self.closed_history.clone(),
                StorageKey::ActivatedTabs => out.activated_tabs = self.activated_tabs.clone(),
                StorageKey::OutdatedTabs => out.outdated_tabs = self.outdated_tabs.clone(),
                StorageKey::Schedule => out.schedule = self.schedule.clone(),
                StorageKey::EvacuatedAlarms => {
                    out.evacuated_alarms = self.evacuated_alarms.clone();
                }
                StorageKey::EvacuationMap => out.evacuation_map = self.evacuation_map.clone(),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overlays_present_keys_only() {
        let mut base = StorageSlice {
            schedule: Some(ScheduleMap::new()),
            evacuated_alarms: Some(vec![]),
            ..StorageSlice::default()
        };
        let mut stacks = ActivationStacks::new();
        stacks.push(1, 10);
        base.merge(StorageSlice {
            activated_tabs: Some(stacks.clone()),
            ..StorageSlice::default()
        });
        assert_eq!(base.activated_tabs, Some(stacks));
        assert!(base.schedule.is_some());
        assert!(base.evacuated_alarms.is_some());
    }

    #[test]
    fn project_keeps_only_requested_keys() {
        let slice = StorageSlice {
            schedule: Some(ScheduleMap::new()),
            evacuated_alarms: Some(vec![]),
            ..StorageSlice::default()
        };
        let projected = slice.project(&[StorageKey::Schedule]);
        assert_eq!(projected.present_keys(), vec![StorageKey::Schedule]);
    }

    #[test]
    fn absent_keys_are_not_serialized() {
        let slice = StorageSlice {
            schedule: Some(ScheduleMap::new()),
            ..StorageSlice::default()
        };
        let json = serde_json::to_value(&slice).expect("serialize");
        let object = json.as_object().expect("object");
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["schedule"]);

        // A patch read back from storage only carries the written keys.
        let back: StorageSlice = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.present_keys(), vec![StorageKey::Schedule]);
    }

    #[test]
    fn present_keys_tracks_contents() {
        let slice = StorageSlice::default();
        assert!(slice.present_keys().is_empty());
        let slice = StorageSlice {
            evacuation_map: Some(EvacuationMap::new()),
            ..StorageSlice::default()
        };
        assert_eq!(slice.present_keys(), vec![StorageKey::EvacuationMap]);
    }
}
