//! Open-tab ledger and closed-tab log, per window.
//!
//! Supporting bookkeeping for display purposes: the engine records every
//! tab it sees and, on close, moves its snapshot into a newest-first log
//! of closed-tab summaries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{ClosedTab, Tab, TabId, WindowId};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTabHistory {
    /// Currently open tab snapshots per window.
    tabs: HashMap<WindowId, Vec<Tab>>,
    /// Closed-tab summaries per window, newest first.
    history: HashMap<WindowId, Vec<ClosedTab>>,
}

impl ClosedTabHistory {
    pub fn new(tabs: HashMap<WindowId, Vec<Tab>>, history: HashMap<WindowId, Vec<ClosedTab>>) -> Self {
        Self { tabs, history }
    }

    pub fn open_tabs(&self, window_id: WindowId) -> &[Tab] {
        self.tabs.get(&window_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn closed_tabs(&self, window_id: WindowId) -> &[ClosedTab] {
        self.history
            .get(&window_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record a newly created tab. No-op without id or window id.
    pub fn create_tab(&mut self, tab: &Tab) {
        let (Some(_), Some(window_id)) = (tab.id, tab.window_id) else {
            return;
        };
        self.tabs.entry(window_id).or_default().push(tab.clone());
    }

    pub fn create_tabs(&mut self, tabs: &[Tab]) {
        for tab in tabs {
            self.create_tab(tab);
        }
    }

    /// Replace the stored snapshot for a tab that changed (title, URL,
    /// favicon). No-op if the tab was never recorded.
    pub fn update_tab(&mut self, new_tab: &Tab) {
        let (Some(id), Some(window_id)) = (new_tab.id, new_tab.window_id) else {
            return;
        };
        if let Some(tabs) = self.tabs.get_mut(&window_id) {
            for tab in tabs.iter_mut() {
                if tab.id == Some(id) {
                    *tab = new_tab.clone();
                }
            }
        }
    }

    /// Move a tab's snapshot into the closed log. No-op if unknown.
    pub fn close_tab(&mut self, tab_id: TabId, window_id: WindowId) {
        let Some(tabs) = self.tabs.get_mut(&window_id) else {
            return;
        };
        let Some(pos) = tabs.iter().position(|tab| tab.id == Some(tab_id)) else {
            return;
        };
        let tab = tabs.remove(pos);
        self.history
            .entry(window_id)
            .or_default()
            .insert(0, ClosedTab::from(&tab));
    }

    /// Drop all records for a closed window.
    pub fn purge_window(&mut self, window_id: WindowId) {
        self.tabs.remove(&window_id);
        self.history.remove(&window_id);
    }

    pub fn into_parts(self) -> (HashMap<WindowId, Vec<Tab>>, HashMap<WindowId, Vec<ClosedTab>>) {
        (self.tabs, self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: TabId, window_id: WindowId, title: &str) -> Tab {
        Tab {
            id: Some(id),
            window_id: Some(window_id),
            title: Some(title.into()),
            url: Some(format!("https://example.com/{id}")),
            ..Tab::default()
        }
    }

    #[test]
    fn create_then_close_moves_to_history() {
        let mut history = ClosedTabHistory::default();
        history.create_tab(&tab(1, 10, "first"));
        history.create_tab(&tab(2, 10, "second"));
        assert_eq!(history.open_tabs(10).len(), 2);

        history.close_tab(1, 10);
        assert_eq!(history.open_tabs(10).len(), 1);
        let closed = history.closed_tabs(10);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn closed_log_is_newest_first() {
        let mut history = ClosedTabHistory::default();
        history.create_tabs(&[tab(1, 10, "a"), tab(2, 10, "b")]);
        history.close_tab(1, 10);
        history.close_tab(2, 10);
        let closed = history.closed_tabs(10);
        assert_eq!(closed[0].title.as_deref(), Some("b"));
        assert_eq!(closed[1].title.as_deref(), Some("a"));
    }

    #[test]
    fn update_replaces_snapshot_by_id() {
        let mut history = ClosedTabHistory::default();
        history.create_tab(&tab(1, 10, "loading"));
        history.update_tab(&tab(1, 10, "loaded"));
        assert_eq!(history.open_tabs(10)[0].title.as_deref(), Some("loaded"));
        // Closing afterwards logs the updated title.
        history.close_tab(1, 10);
        assert_eq!(
            history.closed_tabs(10)[0].title.as_deref(),
            Some("loaded")
        );
    }

    #[test]
    fn close_unknown_tab_is_noop() {
        let mut history = ClosedTabHistory::default();
        history.create_tab(&tab(1, 10, "only"));
        history.close_tab(2, 10);
        history.close_tab(1, 99);
        assert_eq!(history.open_tabs(10).len(), 1);
        assert!(history.closed_tabs(10).is_empty());
    }

    #[test]
    fn create_without_identity_is_noop() {
        let mut history = ClosedTabHistory::default();
        history.create_tab(&Tab::default());
        assert!(history.open_tabs(0).is_empty());
    }

    #[test]
    fn purge_window_drops_both_sides() {
        let mut history = ClosedTabHistory::default();
        history.create_tab(&tab(1, 10, "a"));
        history.close_tab(1, 10);
        history.create_tab(&tab(2, 20, "b"));
        history.purge_window(10);
        assert!(history.open_tabs(10).is_empty());
        assert!(history.closed_tabs(10).is_empty());
        assert_eq!(history.open_tabs(20).len(), 1);
    }
}
