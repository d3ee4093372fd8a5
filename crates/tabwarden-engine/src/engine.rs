//! Lifetime engine: countdown scheduling on tab events.
//!
//! Per-tab state machine:
//!
//! ```text
//! ACTIVE → COUNTING → { CLOSED | OUTDATED }
//!             ↓↑
//!         EVACUATED        (floor reached or device suspended)
//! ```
//!
//! with `* → REMOVED` when the tab closes from any state.
//!
//! Handlers are synchronous and take `now` explicitly; the runtime stamps
//! wall-clock time on event receipt. Each handler reads the collections it
//! needs, rebuilds whole values, and writes them back; interleaved handlers
//! on the same window are last-writer-wins (see `runtime`).

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use tabwarden_core::activation::ActivationStacks;
use tabwarden_core::expiry::plan_expirations;
use tabwarden_core::types::{
    AlarmSnapshot, Options, ScheduleEntry, ScheduleMap, Tab, TabId, WindowId, alarm_name,
    parse_alarm_name,
};

use crate::error::EngineError;
use crate::host::{AlarmHost, OptionsSource, StorageBackend, TabHost, TabQuery};
use crate::options::ensure_defaults;
use crate::slice::StorageSlice;
use crate::store::TabStore;

/// Gap between staggered startup countdowns. The host cannot close many
/// tabs in the same tick, so each inactive tab expires one second after
/// the previous one.
const STARTUP_STAGGER_MS: i64 = 1_000;

pub struct Engine<H, B, O> {
    pub(crate) host: H,
    pub(crate) store: TabStore<B>,
    pub(crate) options: O,
}

impl<H, B, O> Engine<H, B, O>
where
    H: TabHost + AlarmHost,
    B: StorageBackend,
    O: OptionsSource,
{
    pub fn new(host: H, backend: B, options: O) -> Self {
        Self {
            host,
            store: TabStore::new(backend),
            options,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store_mut(&mut self) -> &mut TabStore<B> {
        &mut self.store
    }

    pub(crate) fn load_options(&self) -> Result<Options, EngineError> {
        Ok(self.options.load()?.unwrap_or_default())
    }

    /// First attach to a session: persist default options if the source
    /// was never written, then give every pre-existing inactive tab a
    /// countdown.
    pub fn bootstrap(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let options = ensure_defaults(&mut self.options)?;
        debug!(
            min_tabs = options.min_tabs,
            base_limit_ms = options.base_limit_ms,
            "engine bootstrap"
        );
        self.schedule_inactive_tabs(now)
    }

    // ─── Tab events ───────────────────────────────────────────────

    /// A tab became the active tab of its window: its own countdown stops
    /// and the previously active tab's countdown starts.
    pub fn on_tab_activated(
        &mut self,
        tab_id: TabId,
        window_id: WindowId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        debug!(tab_id, window_id, "tab activated");
        self.host.clear_alarm(&alarm_name(tab_id))?;

        let options = self.load_options()?;
        let tabs = self.host.query_tabs(&TabQuery::window(window_id))?;
        let mut stacks = self.store.activation_stacks()?;
        let mut schedule = self.store.schedule()?;

        if let Some(last_tab_id) = stacks.last_tab_id(window_id) {
            let when = now + options.base_limit();
            if tabs.len() > options.min_tabs {
                self.host.create_alarm(&alarm_name(last_tab_id), when)?;
            } else {
                // The floor is already reached: a live timer could never
                // legally fire, so freeze the deadline directly instead of
                // going through a schedule/expire/defer round-trip.
                self.append_to_evacuation_map(alarm_name(last_tab_id), when, window_id, now)?;
            }
            schedule.insert(
                last_tab_id,
                ScheduleEntry {
                    last_inactivated_at: Some(now),
                    scheduled_time: Some(when),
                },
            );
        }

        stacks.push(tab_id, window_id);
        self.store.set(StorageSlice {
            activated_tabs: Some(stacks),
            schedule: Some(schedule),
            ..StorageSlice::default()
        })?;

        // An activated tab is no longer deferred.
        let mut outdated = self.store.outdated_lists()?;
        outdated.remove(tab_id, window_id);
        self.store.update_outdated_lists(outdated)?;
        Ok(())
    }

    /// A tab was created. A new tab can give its window capacity again:
    /// the most recently deferred tab is closed and any evacuated timers
    /// of the window are thawed. A tab opened in the background starts
    /// its own countdown right away.
    pub fn on_tab_created(&mut self, tab: &Tab, now: DateTime<Utc>) -> Result<(), EngineError> {
        debug!(tab_id = ?tab.id, window_id = ?tab.window_id, "tab created");
        let mut history = self.store.closed_tab_history()?;
        history.create_tab(tab);
        self.store.update_closed_tab_history(history)?;

        let Some(window_id) = tab.window_id else {
            return Ok(());
        };
        let options = self.load_options()?;
        let tabs = self.host.query_tabs(&TabQuery::window(window_id))?;

        if tabs.len() > options.min_tabs {
            let outdated = self.store.outdated_lists()?;
            if let Some(victim) = outdated.last_tab_id(window_id) {
                debug!(victim, window_id, "closing deferred tab");
                self.host.remove_tabs(&[victim])?;
            }
            self.recover_window(window_id, now)?;
        }

        if !tab.active {
            self.start_countdown(tab, tabs.len(), &options, now)?;
        }
        Ok(())
    }

    /// A tab changed; refresh its history snapshot once it finished
    /// loading.
    pub fn on_tab_updated(&mut self, tab: &Tab, complete: bool) -> Result<(), EngineError> {
        if !complete {
            return Ok(());
        }
        let mut history = self.store.closed_tab_history()?;
        history.update_tab(tab);
        self.store.update_closed_tab_history(history)?;
        Ok(())
    }

    /// A tab was closed (by the engine or by the user). The window now has
    /// one fewer tab, so any countdown that could no longer be honored is
    /// frozen rather than left to expire uselessly.
    pub fn on_tab_removed(
        &mut self,
        tab_id: TabId,
        window_id: WindowId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        debug!(tab_id, window_id, "tab removed");
        self.host.clear_alarm(&alarm_name(tab_id))?;

        let mut history = self.store.closed_tab_history()?;
        history.close_tab(tab_id, window_id);
        self.store.update_closed_tab_history(history)?;

        let mut stacks = self.store.activation_stacks()?;
        stacks.remove(tab_id, window_id);
        self.store.update_activation_stacks(stacks)?;

        let mut outdated = self.store.outdated_lists()?;
        outdated.remove(tab_id, window_id);
        self.store.update_outdated_lists(outdated)?;

        let mut schedule = self.store.schedule()?;
        schedule.remove(&tab_id);
        self.store.update_schedule(schedule)?;

        self.evacuate_window(window_id, now)?;
        Ok(())
    }

    /// A window closed: purge every per-window collection for it.
    pub fn on_window_removed(&mut self, window_id: WindowId) -> Result<(), EngineError> {
        debug!(window_id, "window removed");
        let mut history = self.store.closed_tab_history()?;
        history.purge_window(window_id);
        let mut stacks = self.store.activation_stacks()?;
        stacks.purge_window(window_id);
        let mut outdated = self.store.outdated_lists()?;
        outdated.purge_window(window_id);
        let mut evacuation_map = self.store.evacuation_map()?;
        evacuation_map.remove(&window_id);

        let (open_tabs, closed_history) = history.into_parts();
        self.store.set(StorageSlice {
            open_tabs: Some(open_tabs),
            closed_history: Some(closed_history),
            activated_tabs: Some(stacks),
            outdated_tabs: Some(outdated),
            evacuation_map: Some(evacuation_map),
            ..StorageSlice::default()
        })?;
        Ok(())
    }

    // ─── Alarm events ─────────────────────────────────────────────

    /// A single countdown expired.
    pub fn on_alarm_fired(&mut self, alarm: &AlarmSnapshot) -> Result<(), EngineError> {
        debug!(name = %alarm.name, "alarm fired");
        let Some(tab_id) = parse_alarm_name(&alarm.name) else {
            return Ok(());
        };
        let Some(tab) = self.host.get_tab(tab_id)? else {
            return Ok(());
        };
        let Some(window_id) = tab.window_id else {
            return Ok(());
        };

        let options = self.load_options()?;
        if tab.pinned && options.protect_pinned_tabs {
            debug!(tab_id, "pinned tab protected from expiry");
            return Ok(());
        }

        let tabs = self.host.query_tabs(&TabQuery::window(window_id))?;
        if tabs.len() > options.min_tabs {
            debug!(tab_id, "closing expired tab");
            self.host.remove_tabs(&[tab_id])?;
        } else {
            debug!(tab_id, window_id, "window at floor, deferring tab");
            let mut outdated = self.store.outdated_lists()?;
            outdated.push(&tab);
            self.store.update_outdated_lists(outdated)?;
        }
        Ok(())
    }

    /// Many countdowns expired in the same tick (recovery after a
    /// suspension). One tab-count snapshot per window is taken up front so
    /// a burst cannot close a window below the floor.
    pub fn on_alarms_fired_batch(&mut self, alarms: &[AlarmSnapshot]) -> Result<(), EngineError> {
        if alarms.is_empty() {
            return Ok(());
        }
        let options = self.load_options()?;
        let tabs = self.host.query_tabs(&TabQuery::all())?;
        let plan = plan_expirations(alarms, &tabs, &options);
        debug!(
            close = plan.close.len(),
            defer = plan.defer.len(),
            "batch expiry"
        );

        if !plan.close.is_empty() {
            self.host.remove_tabs(&plan.close)?;
        }
        let mut outdated = self.store.outdated_lists()?;
        for tab in &plan.defer {
            outdated.push(tab);
        }
        self.store.update_outdated_lists(outdated)?;
        Ok(())
    }

    // ─── Startup ──────────────────────────────────────────────────

    /// Give every inactive tab a countdown and rebuild the activation
    /// stacks from the live snapshot. Run once when the engine first
    /// attaches to a session with pre-existing tabs.
    pub fn schedule_inactive_tabs(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        self.host.clear_all_alarms()?;
        let tabs = self.host.query_tabs(&TabQuery::all())?;
        if tabs.is_empty() {
            return Ok(());
        }

        let options = self.load_options()?;
        let when = now + options.base_limit();
        let mut schedule = ScheduleMap::new();
        let mut delay = TimeDelta::zero();
        for tab in tabs.iter().filter(|tab| !tab.active) {
            let Some(tab_id) = tab.id else {
                continue;
            };
            self.host.create_alarm(&alarm_name(tab_id), when + delay)?;
            schedule.insert(
                tab_id,
                ScheduleEntry {
                    last_inactivated_at: Some(now),
                    scheduled_time: Some(when + delay),
                },
            );
            delay += TimeDelta::milliseconds(STARTUP_STAGGER_MS);
        }

        self.store.set(StorageSlice {
            schedule: Some(schedule),
            activated_tabs: Some(ActivationStacks::from_tabs(&tabs)),
            ..StorageSlice::default()
        })?;
        Ok(())
    }

    // ─── Internals ────────────────────────────────────────────────

    /// Start a countdown for a background tab, with the same floor check
    /// as activation: at the floor the deadline goes straight into the
    /// evacuation map.
    fn start_countdown(
        &mut self,
        tab: &Tab,
        window_tab_count: usize,
        options: &Options,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let (Some(tab_id), Some(window_id)) = (tab.id, tab.window_id) else {
            return Ok(());
        };
        self.host.clear_alarm(&alarm_name(tab_id))?;
        let when = now + options.base_limit();
        if window_tab_count > options.min_tabs {
            self.host.create_alarm(&alarm_name(tab_id), when)?;
        } else {
            self.append_to_evacuation_map(alarm_name(tab_id), when, window_id, now)?;
        }

        let mut schedule = self.store.schedule()?;
        schedule.insert(
            tab_id,
            ScheduleEntry {
                last_inactivated_at: Some(now),
                scheduled_time: Some(when),
            },
        );
        self.store.update_schedule(schedule)?;
        Ok(())
    }
}
