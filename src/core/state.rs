//! # Tracker State
//!
//! What the readiness tracker believes about the current reading's resource.
//!
//! ```text
//! TrackerState
//! ├── phase: Phase                   // where the state machine is
//! ├── attempt: u64                   // id of the operation whose events count
//! └── resource: Option<ResourceId>   // what the current attempt is about
//! ```
//!
//! `Phase` is internal; subscribers only ever see `ReadinessState`.
//!
//! ```text
//!            Evaluate / Retry (from any phase)
//!                       │
//!                       ▼
//!  Idle ──▶ CheckingAvailability ──available──▶ Ready
//!                 │        │
//!                 │        └──check failed──▶ Failed
//!            missing
//!                 ▼
//!           Downloading ──progress──▶ Downloading
//!                 │
//!                 ├──success──▶ Ready
//!                 └──failure──▶ Failed
//! ```

use crate::resources::{ResourceError, ResourceId};

/// Published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadinessState {
    Ready,
    /// `progress` is in `[0, 1]` and never decreases within one download.
    Downloading { progress: f64 },
    Error(ResourceError),
}

impl ReadinessState {
    /// `Ready` and `Error` stay put until the next preference change or retry.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ReadinessState::Downloading { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    CheckingAvailability,
    Downloading { progress: f64 },
    Ready,
    Failed,
}

#[derive(Debug)]
pub struct TrackerState {
    pub phase: Phase,
    /// Bumped on every evaluation; 0 means nothing has been evaluated yet.
    pub attempt: u64,
    pub resource: Option<ResourceId>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            attempt: 0,
            resource: None,
        }
    }

    /// Events tagged with anything other than the current attempt are stale.
    pub fn is_current(&self, attempt: u64) -> bool {
        attempt != 0 && attempt == self.attempt
    }
}
