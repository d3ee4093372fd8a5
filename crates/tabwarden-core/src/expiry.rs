//! Batch expiry planning.
//!
//! When many timers fire in the same tick (typically right after a
//! recovery), deciding each one against a stale shared tab count could
//! close more tabs from one window than the floor allows. The planner
//! takes one tab-count snapshot per window up front and decrements it as
//! tabs are provisionally marked for closure.

use std::collections::HashMap;

use crate::types::{AlarmSnapshot, Options, Tab, TabId, WindowId, parse_alarm_name};

/// Disposition for a batch of expired timers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpirationPlan {
    /// Tabs to close, as one batched close call.
    pub close: Vec<TabId>,
    /// Tabs whose window sits at the floor; they go to the outdated list.
    pub defer: Vec<Tab>,
}

impl ExpirationPlan {
    pub fn is_empty(&self) -> bool {
        self.close.is_empty() && self.defer.is_empty()
    }
}

/// Decide which expired tabs close and which are deferred.
///
/// This is a pure function: all context is supplied through the
/// arguments, and the caller issues the actual close/defer effects.
///
/// # Arguments
/// * `fired` - Expired timers. Invalid names and names whose tab no
///   longer exists are dropped silently.
/// * `tabs` - Snapshot of all normal-window tabs.
/// * `options` - Floor and pinned-tab policy.
pub fn plan_expirations(fired: &[AlarmSnapshot], tabs: &[Tab], options: &Options) -> ExpirationPlan {
    let mut plan = ExpirationPlan::default();
    if fired.is_empty() {
        return plan;
    }

    let mut tab_by_id: HashMap<TabId, &Tab> = HashMap::new();
    let mut window_of: HashMap<TabId, WindowId> = HashMap::new();
    let mut count_per_window: HashMap<WindowId, usize> = HashMap::new();
    for tab in tabs {
        let (Some(id), Some(window_id)) = (tab.id, tab.window_id) else {
            continue;
        };
        tab_by_id.insert(id, tab);
        window_of.insert(id, window_id);
        *count_per_window.entry(window_id).or_insert(0) += 1;
    }

    for alarm in fired {
        let Some(tab_id) = parse_alarm_name(&alarm.name) else {
            continue;
        };
        let Some(&tab) = tab_by_id.get(&tab_id) else {
            continue;
        };
        if tab.pinned && options.protect_pinned_tabs {
            continue;
        }
        let Some(&window_id) = window_of.get(&tab_id) else {
            continue;
        };
        let count = count_per_window.entry(window_id).or_insert(0);
        if *count > options.min_tabs {
            plan.close.push(tab_id);
            *count -= 1;
        } else {
            plan.defer.push(tab.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tab(id: TabId, window_id: WindowId) -> Tab {
        Tab {
            id: Some(id),
            window_id: Some(window_id),
            ..Tab::default()
        }
    }

    fn alarm(id: TabId) -> AlarmSnapshot {
        AlarmSnapshot {
            name: id.to_string(),
            scheduled_time: Utc::now(),
        }
    }

    fn options(min_tabs: usize) -> Options {
        Options {
            min_tabs,
            ..Options::default()
        }
    }

    #[test]
    fn closes_down_to_the_floor_and_defers_the_rest() {
        // 5 tabs, floor of 2, all 5 expire: exactly 3 may close.
        let tabs: Vec<Tab> = (1..=5).map(|id| tab(id, 10)).collect();
        let fired: Vec<AlarmSnapshot> = (1..=5).map(alarm).collect();
        let plan = plan_expirations(&fired, &tabs, &options(2));
        assert_eq!(plan.close, vec![1, 2, 3]);
        assert_eq!(plan.defer.len(), 2);
        assert_eq!(tabs.len() - plan.close.len(), 2);
    }

    #[test]
    fn windows_are_counted_independently() {
        let mut tabs: Vec<Tab> = (1..=3).map(|id| tab(id, 10)).collect();
        tabs.extend((4..=6).map(|id| tab(id, 20)));
        let fired: Vec<AlarmSnapshot> = (1..=6).map(alarm).collect();
        let plan = plan_expirations(&fired, &tabs, &options(2));
        assert_eq!(plan.close, vec![1, 4]);
        assert_eq!(plan.defer.len(), 4);
    }

    #[test]
    fn zero_floor_closes_everything() {
        let tabs: Vec<Tab> = (1..=3).map(|id| tab(id, 10)).collect();
        let fired: Vec<AlarmSnapshot> = (1..=3).map(alarm).collect();
        let plan = plan_expirations(&fired, &tabs, &options(0));
        assert_eq!(plan.close, vec![1, 2, 3]);
        assert!(plan.defer.is_empty());
    }

    #[test]
    fn pinned_tabs_are_skipped_when_protected() {
        let mut pinned = tab(1, 10);
        pinned.pinned = true;
        let tabs = vec![pinned, tab(2, 10), tab(3, 10)];
        let fired = vec![alarm(1), alarm(2)];

        let plan = plan_expirations(&fired, &tabs, &options(0));
        assert_eq!(plan.close, vec![2]);
        assert!(plan.defer.is_empty());

        let unprotected = Options {
            min_tabs: 0,
            protect_pinned_tabs: false,
            ..Options::default()
        };
        let plan = plan_expirations(&fired, &tabs, &unprotected);
        assert_eq!(plan.close, vec![1, 2]);
    }

    #[test]
    fn invalid_and_stale_alarm_names_are_dropped() {
        let tabs = vec![tab(1, 10), tab(2, 10)];
        let fired = vec![
            alarm(1),
            AlarmSnapshot {
                name: "not-a-tab".into(),
                scheduled_time: Utc::now(),
            },
            // Tab 99 no longer exists.
            alarm(99),
        ];
        let plan = plan_expirations(&fired, &tabs, &options(0));
        assert_eq!(plan.close, vec![1]);
        assert!(plan.defer.is_empty());
    }

    #[test]
    fn empty_batch_is_empty_plan() {
        let plan = plan_expirations(&[], &[tab(1, 10)], &options(0));
        assert!(plan.is_empty());
    }
}
