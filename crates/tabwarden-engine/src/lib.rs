//! tabwarden-engine: lifetime scheduling over host traits.
//!
//! Wires the pure collections from `tabwarden-core` to a host environment
//! (tab events, a coarse timer service, a partial-blob key-value store) and
//! implements the countdown scheduling engine plus the alarm
//! evacuation/recovery protocol around suspension events.

pub mod cache;
pub mod engine;
pub mod error;
pub mod evacuation;
pub mod host;
pub mod options;
pub mod runtime;
pub mod slice;
pub mod store;

pub use engine::Engine;
pub use error::{EngineError, HostError, StoreError};
pub use runtime::HostEvent;
