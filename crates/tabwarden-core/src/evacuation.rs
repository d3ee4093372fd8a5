//! Evacuation snapshot arithmetic.
//!
//! Host timers cannot be trusted to fire while the device is locked, and a
//! timer that cannot legally act (window at the floor) is wasted work. In
//! both cases live timers are frozen into durable [`EvacuatedAlarm`]
//! records stamped with the time they had left, and later thawed with that
//! remaining time re-applied from the recovery instant.

use chrono::{DateTime, TimeDelta, Utc};

use crate::types::{AlarmSnapshot, EvacuatedAlarm};

/// Evacuated alarms at or under this remaining time are not recreated on
/// recovery; they are resolved through the batch expiry path instead.
/// A sub-minute timer created right after a suspension is unreliable and
/// may race with the next suspension.
pub const RECOVERY_THRESHOLD_MS: i64 = 60_000;

/// Freeze a live timer, stamping the time it has left as of `now`.
pub fn stamp(alarm: &AlarmSnapshot, now: DateTime<Utc>) -> EvacuatedAlarm {
    EvacuatedAlarm {
        name: alarm.name.clone(),
        scheduled_time: alarm.scheduled_time,
        time_left_ms: (alarm.scheduled_time - now).num_milliseconds(),
    }
}

/// Freeze a timer that never went live: the deadline is known but no host
/// alarm exists for it (the floor was already reached at scheduling time).
pub fn stamp_deadline(name: String, when: DateTime<Utc>, now: DateTime<Utc>) -> EvacuatedAlarm {
    EvacuatedAlarm {
        name,
        scheduled_time: when,
        time_left_ms: (when - now).num_milliseconds(),
    }
}

/// Merge newly evacuated alarms into an existing list, replacing entries
/// with the same name and preserving the rest.
pub fn merge_evacuated(
    existing: Vec<EvacuatedAlarm>,
    incoming: Vec<EvacuatedAlarm>,
) -> Vec<EvacuatedAlarm> {
    let mut merged: Vec<EvacuatedAlarm> = existing
        .into_iter()
        .filter(|alarm| !incoming.iter().any(|new| new.name == alarm.name))
        .collect();
    merged.extend(incoming);
    merged
}

/// Disposition of evacuated alarms at recovery time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryPlan {
    /// Enough time left: recreate as a host timer at `now + time_left`.
    pub recreate: Vec<EvacuatedAlarm>,
    /// At or under the threshold: treat as already due.
    pub due: Vec<EvacuatedAlarm>,
}

/// Partition evacuated alarms by remaining time.
pub fn partition_for_recovery(alarms: Vec<EvacuatedAlarm>) -> RecoveryPlan {
    let mut plan = RecoveryPlan::default();
    for alarm in alarms {
        if alarm.time_left_ms > RECOVERY_THRESHOLD_MS {
            plan.recreate.push(alarm);
        } else {
            plan.due.push(alarm);
        }
    }
    plan
}

/// The instant a recovered alarm should fire, `time_left` past `now`.
pub fn recovered_deadline(alarm: &EvacuatedAlarm, now: DateTime<Utc>) -> DateTime<Utc> {
    now + TimeDelta::milliseconds(alarm.time_left_ms)
}
