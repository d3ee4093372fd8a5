//! Event-driven dispatch loop.
//!
//! Host events arrive one at a time on an mpsc channel and are handled to
//! completion before the next one, which serializes all collection
//! rewrites. A handler failure loses that event (no retry queue); the
//! persisted state self-heals on the next full rewrite of the affected
//! collections.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use tabwarden_core::types::{AlarmSnapshot, Tab, TabId, WindowId};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::host::{AlarmHost, IdleState, OptionsSource, StorageBackend, TabHost};

/// Everything the host environment can tell the engine.
#[derive(Debug, Clone)]
pub enum HostEvent {
    TabActivated { tab_id: TabId, window_id: WindowId },
    TabCreated { tab: Tab },
    TabUpdated { tab: Tab, complete: bool },
    TabRemoved { tab_id: TabId, window_id: WindowId },
    WindowRemoved { window_id: WindowId },
    AlarmFired { alarm: AlarmSnapshot },
    IdleStateChanged { state: IdleState },
}

/// Drain host events until the channel closes or `cancel` fires.
pub async fn run<H, B, O>(
    engine: &mut Engine<H, B, O>,
    mut events: mpsc::Receiver<HostEvent>,
    cancel: CancellationToken,
) where
    H: TabHost + AlarmHost,
    B: StorageBackend,
    O: OptionsSource,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                if let Err(err) = dispatch(engine, event) {
                    warn!(error = %err, "event handler failed, event dropped");
                }
            }
        }
    }
}

/// Route one event to its handler, stamping receipt time so the handlers
/// themselves stay clock-free.
pub fn dispatch<H, B, O>(
    engine: &mut Engine<H, B, O>,
    event: HostEvent,
) -> Result<(), EngineError>
where
    H: TabHost + AlarmHost,
    B: StorageBackend,
    O: OptionsSource,
{
    let now = Utc::now();
    match event {
        HostEvent::TabActivated { tab_id, window_id } => {
            engine.on_tab_activated(tab_id, window_id, now)
        }
        HostEvent::TabCreated { tab } => engine.on_tab_created(&tab, now),
        HostEvent::TabUpdated { tab, complete } => engine.on_tab_updated(&tab, complete),
        HostEvent::TabRemoved { tab_id, window_id } => {
            engine.on_tab_removed(tab_id, window_id, now)
        }
        HostEvent::WindowRemoved { window_id } => engine.on_window_removed(window_id),
        HostEvent::AlarmFired { alarm } => engine.on_alarm_fired(&alarm),
        HostEvent::IdleStateChanged { state } => engine.on_idle_state_changed(state, now),
    }
}
