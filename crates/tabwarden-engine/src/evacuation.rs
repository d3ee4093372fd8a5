//! Alarm evacuation and recovery.
//!
//! Two suspension shapes share one mechanism:
//!
//! - **Whole device** (idle lock): every live timer is frozen into the
//!   global evacuated list and restored when the device wakes.
//! - **One window** (floor breach): timers of a window at or below the
//!   floor are frozen into that window's evacuation-map entry and thawed
//!   when the window gains capacity.
//!
//! `time_left` is stamped at evacuation and re-applied from the recovery
//! instant, so the countdown pauses for the gap. Entries that come
//! back with a minute or less remaining are resolved through the batch
//! expiry path instead of being recreated; a sub-minute timer created
//! right after a suspension may race with the next one.

use chrono::{DateTime, Utc};
use tracing::debug;

use tabwarden_core::evacuation::{
    merge_evacuated, partition_for_recovery, recovered_deadline, stamp, stamp_deadline,
};
use tabwarden_core::types::{
    AlarmSnapshot, EvacuatedAlarm, ScheduleMap, WindowId, parse_alarm_name,
};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::host::{AlarmHost, IdleState, OptionsSource, StorageBackend, TabHost, TabQuery};
use crate::slice::{StorageKey, StorageSlice};

impl<H, B, O> Engine<H, B, O>
where
    H: TabHost + AlarmHost,
    B: StorageBackend,
    O: OptionsSource,
{
    /// Idle transitions: lock freezes all timers, wake thaws them.
    pub fn on_idle_state_changed(
        &mut self,
        state: IdleState,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        match state {
            IdleState::Locked => self.evacuate_all(now),
            IdleState::Active => self.recover_all(now),
            IdleState::Idle => Ok(()),
        }
    }

    // ─── Evacuation ───────────────────────────────────────────────

    /// Freeze every live timer into the global evacuated list.
    pub fn evacuate_all(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let alarms = self.host.all_alarms()?;
        debug!(count = alarms.len(), "evacuating all alarms");
        let evacuated: Vec<EvacuatedAlarm> = alarms.iter().map(|a| stamp(a, now)).collect();
        self.store.set(StorageSlice {
            evacuated_alarms: Some(evacuated),
            ..StorageSlice::default()
        })?;
        self.host.clear_all_alarms()?;
        Ok(())
    }

    /// Freeze the timers of one window if it sits at or below the floor.
    /// A window above the floor keeps its timers live; there is no risk.
    pub fn evacuate_window(
        &mut self,
        window_id: WindowId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let options = self.load_options()?;
        let tabs = self.host.query_tabs(&TabQuery::window(window_id))?;
        if tabs.len() > options.min_tabs {
            return Ok(());
        }

        let all_alarms = self.host.all_alarms()?;
        let targets: Vec<AlarmSnapshot> = all_alarms
            .into_iter()
            .filter(|alarm| {
                parse_alarm_name(&alarm.name)
                    .is_some_and(|id| tabs.iter().any(|tab| tab.id == Some(id)))
            })
            .collect();
        if targets.is_empty() {
            return Ok(());
        }
        debug!(window_id, count = targets.len(), "evacuating window alarms");

        let mut map = self.store.evacuation_map()?;
        let entry = map.remove(&window_id).unwrap_or_default();
        let incoming: Vec<EvacuatedAlarm> = targets.iter().map(|a| stamp(a, now)).collect();
        let merged = merge_evacuated(entry.evacuated_alarms, incoming);
        map.insert(
            window_id,
            tabwarden_core::types::WindowEvacuation {
                evacuated_alarms: merged,
            },
        );
        self.store.update_evacuation_map(map)?;

        for alarm in &targets {
            self.host.clear_alarm(&alarm.name)?;
        }
        Ok(())
    }

    /// Freeze a deadline that never went live: used when scheduling at a
    /// window already at the floor, where creating a host timer would be
    /// wasted work.
    pub fn append_to_evacuation_map(
        &mut self,
        name: String,
        when: DateTime<Utc>,
        window_id: WindowId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        debug!(%name, window_id, "freezing deadline at the floor");
        let mut map = self.store.evacuation_map()?;
        let entry = map.remove(&window_id).unwrap_or_default();
        let merged = merge_evacuated(
            entry.evacuated_alarms,
            vec![stamp_deadline(name, when, now)],
        );
        map.insert(
            window_id,
            tabwarden_core::types::WindowEvacuation {
                evacuated_alarms: merged,
            },
        );
        self.store.update_evacuation_map(map)?;
        Ok(())
    }

    // ─── Recovery ─────────────────────────────────────────────────

    /// Thaw the global evacuated list.
    pub fn recover_all(&mut self, now: DateTime<Utc>) -> Result<(), EngineError> {
        let slice = self
            .store
            .get(&[StorageKey::EvacuatedAlarms, StorageKey::Schedule])?;
        let alarms = slice.evacuated_alarms.unwrap_or_default();
        let mut schedule = slice.schedule.unwrap_or_default();
        debug!(count = alarms.len(), "recovering all alarms");

        self.thaw(alarms, &mut schedule, now)?;
        self.store.set(StorageSlice {
            evacuated_alarms: Some(Vec::new()),
            schedule: Some(schedule),
            ..StorageSlice::default()
        })?;
        Ok(())
    }

    /// Thaw one window's evacuation-map entry, if it has one. The entry is
    /// consumed; other windows' entries are untouched.
    pub fn recover_window(
        &mut self,
        window_id: WindowId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let mut map = self.store.evacuation_map()?;
        let Some(entry) = map.remove(&window_id) else {
            return Ok(());
        };
        debug!(
            window_id,
            count = entry.evacuated_alarms.len(),
            "recovering window alarms"
        );

        let mut schedule = self.store.schedule()?;
        self.thaw(entry.evacuated_alarms, &mut schedule, now)?;
        self.store.set(StorageSlice {
            evacuation_map: Some(map),
            schedule: Some(schedule),
            ..StorageSlice::default()
        })?;
        Ok(())
    }

    /// Shared recovery step: already-due entries go through the batch
    /// expiry path, the rest are recreated with their remaining time
    /// re-applied from `now` and their schedule entries updated to the
    /// folded-in deadline.
    fn thaw(
        &mut self,
        alarms: Vec<EvacuatedAlarm>,
        schedule: &mut ScheduleMap,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let plan = partition_for_recovery(alarms);

        let due: Vec<AlarmSnapshot> = plan
            .due
            .iter()
            .map(|alarm| AlarmSnapshot {
                name: alarm.name.clone(),
                scheduled_time: alarm.scheduled_time,
            })
            .collect();
        self.on_alarms_fired_batch(&due)?;

        for alarm in &plan.recreate {
            let Some(tab_id) = parse_alarm_name(&alarm.name) else {
                continue;
            };
            let when = recovered_deadline(alarm, now);
            self.host.create_alarm(&alarm.name, when)?;
            let entry = schedule.entry(tab_id).or_default();
            entry.scheduled_time = Some(when);
        }
        Ok(())
    }
}
