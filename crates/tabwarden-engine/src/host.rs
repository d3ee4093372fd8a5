//! Host environment seams.
//!
//! The engine never talks to a browser directly; the embedding supplies
//! implementations of these traits and feeds events into the runtime.
//! Tests use the in-memory mock under `tests/common`.

use chrono::{DateTime, Utc};

use tabwarden_core::types::{AlarmSnapshot, Options, Tab, TabId, WindowId};

use crate::error::{HostError, StoreError};
use crate::slice::{StorageKey, StorageSlice};

// ─── Tabs ─────────────────────────────────────────────────────────

/// Tab query filter. Only tabs of normal windows are ever returned;
/// devtools/popup windows do not count toward the floor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TabQuery {
    pub window_id: Option<WindowId>,
}

impl TabQuery {
    /// All normal-window tabs.
    pub fn all() -> Self {
        Self::default()
    }

    /// Tabs of one window.
    pub fn window(window_id: WindowId) -> Self {
        Self {
            window_id: Some(window_id),
        }
    }
}

pub trait TabHost {
    fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>, HostError>;

    /// `None` when the tab no longer exists.
    fn get_tab(&self, tab_id: TabId) -> Result<Option<Tab>, HostError>;

    /// Close tabs in one batched call. Unknown ids are ignored.
    fn remove_tabs(&mut self, tab_ids: &[TabId]) -> Result<(), HostError>;
}

// ─── Timers ───────────────────────────────────────────────────────

/// Coarse host timer service. Creating a timer under an existing name
/// replaces it; clearing an unknown name is a no-op.
pub trait AlarmHost {
    fn create_alarm(&mut self, name: &str, when: DateTime<Utc>) -> Result<(), HostError>;
    fn clear_alarm(&mut self, name: &str) -> Result<(), HostError>;
    fn clear_all_alarms(&mut self) -> Result<(), HostError>;
    fn all_alarms(&self) -> Result<Vec<AlarmSnapshot>, HostError>;
}

// ─── Idle state ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

// ─── Options ──────────────────────────────────────────────────────

/// Configuration source (the host's synced settings store).
pub trait OptionsSource {
    /// `None` when the source has never been written.
    fn load(&self) -> Result<Option<Options>, StoreError>;
    fn store(&mut self, options: &Options) -> Result<(), StoreError>;
}

// ─── Persistent store ─────────────────────────────────────────────

/// Partial-blob key-value store: `get` returns only the requested keys,
/// `set` overwrites exactly the keys present in the patch.
pub trait StorageBackend {
    fn get(&self, keys: &[StorageKey]) -> Result<StorageSlice, StoreError>;
    fn set(&mut self, patch: StorageSlice) -> Result<(), StoreError>;
}
