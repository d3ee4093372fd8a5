//! Error types for the engine boundary.
//!
//! Missing entities (a tab or window gone by the time a handler runs) are
//! represented as `None`/no-ops, never as errors. These types cover real
//! failures only: an unreachable host service or a failing storage backend.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("host call failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
