use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Identity ─────────────────────────────────────────────────────

pub type TabId = u32;
pub type WindowId = u32;

/// Minimal tab identity stored inside per-window stacks and lists.
/// Nothing else about the tab is persisted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabRef {
    pub id: TabId,
}

// ─── Host tab snapshot ────────────────────────────────────────────

/// A tab as reported by the host environment.
///
/// `id` and `window_id` are optional: the host can hand out tabs that are
/// mid-creation or detached, and every consumer treats those as no-ops
/// rather than errors.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: Option<TabId>,
    pub window_id: Option<WindowId>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub pinned: bool,
    pub title: Option<String>,
    pub url: Option<String>,
    pub pending_url: Option<String>,
    pub fav_icon_url: Option<String>,
}

/// Summary kept in the closed-tab log. `url` falls back to the pending
/// URL when the tab never finished loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedTab {
    pub title: Option<String>,
    pub url: Option<String>,
    pub fav_icon_url: Option<String>,
}

impl From<&Tab> for ClosedTab {
    fn from(tab: &Tab) -> Self {
        Self {
            title: tab.title.clone(),
            url: tab.url.clone().or_else(|| tab.pending_url.clone()),
            fav_icon_url: tab.fav_icon_url.clone(),
        }
    }
}

// ─── Schedule ─────────────────────────────────────────────────────

/// Countdown bookkeeping for one tab. Both fields are absent while the
/// tab is active; they are written when the tab stops being active and a
/// countdown starts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// When the tab stopped being the active tab of its window.
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub last_inactivated_at: Option<DateTime<Utc>>,
    /// Absolute instant the tab's timer should fire.
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub scheduled_time: Option<DateTime<Utc>>,
}

pub type ScheduleMap = HashMap<TabId, ScheduleEntry>;

// ─── Alarms ───────────────────────────────────────────────────────

/// A live timer as reported by the host timer service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSnapshot {
    /// Timer name; the engine only ever creates timers named after tab ids.
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub scheduled_time: DateTime<Utc>,
}

/// A timer frozen into durable storage while it cannot be trusted to fire.
///
/// `time_left_ms` is the authoritative quantity for recovery;
/// `scheduled_time` is informational (the deadline as of evacuation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvacuatedAlarm {
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub scheduled_time: DateTime<Utc>,
    pub time_left_ms: i64,
}

/// Per-window evacuation entry. A parallel global list (no window key)
/// exists for whole-device suspension.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowEvacuation {
    pub evacuated_alarms: Vec<EvacuatedAlarm>,
}

pub type EvacuationMap = HashMap<WindowId, WindowEvacuation>;

// ─── Options ──────────────────────────────────────────────────────

/// Engine configuration. Loaded once per operation; last write wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Floor: the number of tabs a window must retain. Tabs are never
    /// auto-closed below it. Zero disables the floor.
    pub min_tabs: usize,
    /// Inactivity limit in milliseconds before a tab becomes eligible
    /// for closing.
    pub base_limit_ms: u64,
    /// Exempt pinned tabs from expiry.
    pub protect_pinned_tabs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_tabs: 7,
            base_limit_ms: 24 * 60 * 60 * 1000,
            protect_pinned_tabs: true,
        }
    }
}

impl Options {
    pub fn base_limit(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.base_limit_ms as i64)
    }
}

// ─── Alarm naming ─────────────────────────────────────────────────

/// Timer name for a tab's countdown.
pub fn alarm_name(tab_id: TabId) -> String {
    tab_id.to_string()
}

/// Parse a timer name back into a tab id.
///
/// Only plain non-negative decimal integers are accepted; anything else
/// (negative, fractional, empty, garbage) yields `None` and the caller
/// drops the alarm defensively.
pub fn parse_alarm_name(name: &str) -> Option<TabId> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<TabId>().ok()
}

// ─── Tests ────────────────────────────────────────────────────────
