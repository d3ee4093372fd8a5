//! tabwarden-core: pure state machines for tab-lifetime scheduling.
//!
//! Per-window collections (activation stacks, outdated lists, closed-tab
//! history), batch expiry planning, and the evacuation partition logic.
//! No IO, no async, no clock access: every operation takes its inputs as
//! arguments and returns plain values, so the whole crate is testable
//! without a host environment.

pub mod activation;
pub mod evacuation;
pub mod expiry;
pub mod history;
pub mod outdated;
pub mod types;
