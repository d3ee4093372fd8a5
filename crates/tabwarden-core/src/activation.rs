//! Per-window stacks of most-recently-activated tabs.
//!
//! The tab on top of a window's stack is the one that starts a countdown
//! the next time another tab in that window is activated. A tab id appears
//! at most once per stack: pushing an existing id moves it to the top
//! instead of duplicating it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Tab, TabId, TabRef, WindowId};

/// Activation recency per window, most recently activated first.
///
/// Absent windows behave as empty stacks; no operation fails.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivationStacks {
    stacks: HashMap<WindowId, Vec<TabRef>>,
}

impl ActivationStacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently activated tab of a window, if any.
    pub fn last_tab_id(&self, window_id: WindowId) -> Option<TabId> {
        self.stacks
            .get(&window_id)
            .and_then(|stack| stack.first())
            .map(|tab| tab.id)
    }

    /// Put `tab_id` on top of the window's stack, removing any existing
    /// occurrence first.
    pub fn push(&mut self, tab_id: TabId, window_id: WindowId) {
        let stack = self.stacks.entry(window_id).or_default();
        stack.retain(|tab| tab.id != tab_id);
        stack.insert(0, TabRef { id: tab_id });
    }

    /// Drop `tab_id` from the window's stack; no-op if absent.
    pub fn remove(&mut self, tab_id: TabId, window_id: WindowId) {
        if let Some(stack) = self.stacks.get_mut(&window_id) {
            stack.retain(|tab| tab.id != tab_id);
        }
    }

    /// Drop the whole stack for a closed window.
    pub fn purge_window(&mut self, window_id: WindowId) {
        self.stacks.remove(&window_id);
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.values().all(|stack| stack.is_empty())
    }

    /// Build stacks from a live host snapshot.
    ///
    /// Inactive tabs are pushed first so each window's active tab ends up
    /// on top of its stack.
    pub fn from_tabs(tabs: &[Tab]) -> Self {
        let mut stacks = Self::new();
        let mut ordered: Vec<&Tab> = tabs.iter().collect();
        ordered.sort_by_key(|tab| tab.active);
        for tab in ordered {
            if let (Some(id), Some(window_id)) = (tab.id, tab.window_id) {
                stacks.push(id, window_id);
            }
        }
        stacks
    }
}
