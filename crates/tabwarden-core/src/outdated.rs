//! Per-window lists of outdated tabs.
//!
//! A tab lands here when its timer expired but closing it would have taken
//! the window below the floor. It leaves the list either by activation
//! (no longer deferred) or by being closed once a new tab gives the window
//! capacity again.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Tab, TabId, TabRef, WindowId};

/// Deferred-close lists per window, in insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutdatedLists {
    lists: HashMap<WindowId, Vec<TabRef>>,
}

impl OutdatedLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently deferred tab of a window: the next candidate to
    /// close when the window gains capacity.
    pub fn last_tab_id(&self, window_id: WindowId) -> Option<TabId> {
        self.lists
            .get(&window_id)
            .and_then(|list| list.last())
            .map(|tab| tab.id)
    }

    /// Append a tab whose expiry could not be honored.
    ///
    /// No-op if the tab lacks an id or window id. Re-pushing an already
    /// listed tab moves it to the end instead of duplicating it.
    pub fn push(&mut self, tab: &Tab) {
        let (Some(id), Some(window_id)) = (tab.id, tab.window_id) else {
            return;
        };
        let list = self.lists.entry(window_id).or_default();
        list.retain(|entry| entry.id != id);
        list.push(TabRef { id });
    }

    /// Drop `tab_id` from the window's list; no-op if absent.
    pub fn remove(&mut self, tab_id: TabId, window_id: WindowId) {
        if let Some(list) = self.lists.get_mut(&window_id) {
            list.retain(|entry| entry.id != tab_id);
        }
    }

    /// Drop the whole list for a closed window.
    pub fn purge_window(&mut self, window_id: WindowId) {
        self.lists.remove(&window_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: TabId, window_id: WindowId) -> Tab {
        Tab {
            id: Some(id),
            window_id: Some(window_id),
            ..Tab::default()
        }
    }

    #[test]
    fn fifo_order_and_eviction_candidate() {
        let mut lists = OutdatedLists::new();
        lists.push(&tab(1, 10));
        lists.push(&tab(2, 10));
        lists.push(&tab(3, 10));
        assert_eq!(lists.last_tab_id(10), Some(3));
        lists.remove(3, 10);
        assert_eq!(lists.last_tab_id(10), Some(2));
        lists.remove(2, 10);
        assert_eq!(lists.last_tab_id(10), Some(1));
    }

    #[test]
    fn repush_refreshes_recency_without_duplicates() {
        let mut lists = OutdatedLists::new();
        lists.push(&tab(1, 10));
        lists.push(&tab(2, 10));
        lists.push(&tab(1, 10));
        assert_eq!(lists.last_tab_id(10), Some(1));
        lists.remove(1, 10);
        assert_eq!(lists.last_tab_id(10), Some(2));
        lists.remove(2, 10);
        assert_eq!(lists.last_tab_id(10), None);
    }

    #[test]
    fn push_without_identity_is_noop() {
        let mut lists = OutdatedLists::new();
        lists.push(&Tab::default());
        lists.push(&Tab {
            id: Some(1),
            window_id: None,
            ..Tab::default()
        });
        assert_eq!(lists.last_tab_id(0), None);
    }

    #[test]
    fn purge_window_clears_only_that_window() {
        let mut lists = OutdatedLists::new();
        lists.push(&tab(1, 10));
        lists.push(&tab(2, 20));
        lists.purge_window(10);
        assert_eq!(lists.last_tab_id(10), None);
        assert_eq!(lists.last_tab_id(20), Some(2));
    }
}
