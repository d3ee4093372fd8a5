//! In-memory host and backend doubles for engine tests.
//!
//! Each integration test binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use chrono::{DateTime, Utc};

use tabwarden_core::types::{AlarmSnapshot, Options, Tab, TabId, WindowId};
use tabwarden_engine::error::{HostError, StoreError};
use tabwarden_engine::host::{AlarmHost, OptionsSource, StorageBackend, TabHost, TabQuery};
use tabwarden_engine::slice::{StorageKey, StorageSlice};
use tabwarden_engine::Engine;

pub fn tab(id: TabId, window_id: WindowId, active: bool) -> Tab {
    Tab {
        id: Some(id),
        window_id: Some(window_id),
        active,
        title: Some(format!("tab {id}")),
        url: Some(format!("https://example.com/{id}")),
        ..Tab::default()
    }
}

pub fn options(min_tabs: usize, base_limit_ms: u64) -> Options {
    Options {
        min_tabs,
        base_limit_ms,
        protect_pinned_tabs: true,
    }
}

// ─── Host double ──────────────────────────────────────────────────

/// Browser stand-in: a flat tab list and a named alarm table. Removing a
/// tab drops it from the list and records the id, so tests can assert on
/// both the surviving population and the close calls.
#[derive(Debug, Default)]
pub struct MockHost {
    pub tabs: Vec<Tab>,
    pub alarms: Vec<AlarmSnapshot>,
    pub removed: Vec<TabId>,
}

impl MockHost {
    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        Self {
            tabs,
            ..Self::default()
        }
    }

    pub fn alarm(&self, name: &str) -> Option<&AlarmSnapshot> {
        self.alarms.iter().find(|alarm| alarm.name == name)
    }

    pub fn window_count(&self, window_id: WindowId) -> usize {
        self.tabs
            .iter()
            .filter(|tab| tab.window_id == Some(window_id))
            .count()
    }
}

impl TabHost for MockHost {
    fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>, HostError> {
        Ok(self
            .tabs
            .iter()
            .filter(|tab| query.window_id.is_none() || tab.window_id == query.window_id)
            .cloned()
            .collect())
    }

    fn get_tab(&self, tab_id: TabId) -> Result<Option<Tab>, HostError> {
        Ok(self.tabs.iter().find(|tab| tab.id == Some(tab_id)).cloned())
    }

    fn remove_tabs(&mut self, tab_ids: &[TabId]) -> Result<(), HostError> {
        for &tab_id in tab_ids {
            self.tabs.retain(|tab| tab.id != Some(tab_id));
            self.removed.push(tab_id);
        }
        Ok(())
    }
}

impl AlarmHost for MockHost {
    fn create_alarm(&mut self, name: &str, when: DateTime<Utc>) -> Result<(), HostError> {
        self.alarms.retain(|alarm| alarm.name != name);
        self.alarms.push(AlarmSnapshot {
            name: name.to_string(),
            scheduled_time: when,
        });
        Ok(())
    }

    fn clear_alarm(&mut self, name: &str) -> Result<(), HostError> {
        self.alarms.retain(|alarm| alarm.name != name);
        Ok(())
    }

    fn clear_all_alarms(&mut self) -> Result<(), HostError> {
        self.alarms.clear();
        Ok(())
    }

    fn all_alarms(&self) -> Result<Vec<AlarmSnapshot>, HostError> {
        Ok(self.alarms.clone())
    }
}

// ─── Storage double ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryBackend {
    pub data: StorageSlice,
}

impl StorageBackend for MemoryBackend {
    fn get(&self, keys: &[StorageKey]) -> Result<StorageSlice, StoreError> {
        Ok(self.data.project(keys))
    }

    fn set(&mut self, patch: StorageSlice) -> Result<(), StoreError> {
        self.data.merge(patch);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryOptions {
    pub options: Option<Options>,
}

impl OptionsSource for MemoryOptions {
    fn load(&self) -> Result<Option<Options>, StoreError> {
        Ok(self.options)
    }

    fn store(&mut self, options: &Options) -> Result<(), StoreError> {
        self.options = Some(*options);
        Ok(())
    }
}

pub type TestEngine = Engine<MockHost, MemoryBackend, MemoryOptions>;

pub fn engine(tabs: Vec<Tab>, opts: Options) -> TestEngine {
    Engine::new(
        MockHost::with_tabs(tabs),
        MemoryBackend::default(),
        MemoryOptions {
            options: Some(opts),
        },
    )
}
