//! # Actions
//!
//! Everything that can happen to the readiness tracker becomes an `Action`.
//! Preference changed? That's `Action::Evaluate(resource)`.
//! Download reported 40%? That's `Action::Progress { attempt, fraction: 0.4 }`.
//!
//! The `update()` function takes the current state and an action, mutates the
//! state, and returns the one `Effect` the caller must carry out. No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```
//!
//! Work results carry the attempt they belong to. Anything from an older
//! attempt is dropped, which is what keeps a superseded download from leaking
//! events after a preference switch.

use log::{debug, info, warn};

use crate::core::state::{Phase, ReadinessState, TrackerState};
use crate::resources::{ResourceError, ResourceId, SourceError};

#[derive(Debug)]
pub enum Action {
    /// Start over for `resource`, superseding whatever is in flight.
    Evaluate(ResourceId),
    /// Start over for the last evaluated resource.
    Retry,
    AvailabilityChecked {
        attempt: u64,
        result: Result<bool, SourceError>,
    },
    Progress {
        attempt: u64,
        fraction: f64,
    },
    DownloadFinished {
        attempt: u64,
        result: Result<(), SourceError>,
    },
}

#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    /// Push this state to every subscriber.
    Publish(ReadinessState),
    /// Run the check-then-download operation for `resource` as `attempt`.
    Spawn { attempt: u64, resource: ResourceId },
}

pub fn update(state: &mut TrackerState, action: Action) -> Effect {
    match action {
        Action::Evaluate(resource) => start_attempt(state, resource),
        Action::Retry => match state.resource.clone() {
            Some(resource) => start_attempt(state, resource),
            None => {
                debug!("Retry ignored: nothing evaluated yet");
                Effect::None
            }
        },
        Action::AvailabilityChecked { attempt, result } => {
            if !accepts(state, attempt, "availability result") {
                return Effect::None;
            }
            if state.phase != Phase::CheckingAvailability {
                warn!("Availability result in phase {:?}, ignoring", state.phase);
                return Effect::None;
            }
            match result {
                Ok(true) => {
                    info!("Attempt {}: resource available", attempt);
                    state.phase = Phase::Ready;
                    Effect::Publish(ReadinessState::Ready)
                }
                Ok(false) => {
                    info!("Attempt {}: resource missing, downloading", attempt);
                    state.phase = Phase::Downloading { progress: 0.0 };
                    Effect::Publish(ReadinessState::Downloading { progress: 0.0 })
                }
                Err(e) => {
                    warn!("Attempt {}: availability check failed: {}", attempt, e);
                    state.phase = Phase::Failed;
                    Effect::Publish(ReadinessState::Error(
                        ResourceError::AvailabilityCheckFailed(e),
                    ))
                }
            }
        }
        Action::Progress { attempt, fraction } => {
            if !accepts(state, attempt, "progress") {
                return Effect::None;
            }
            let Phase::Downloading { progress } = state.phase else {
                warn!("Progress in phase {:?}, ignoring", state.phase);
                return Effect::None;
            };
            if fraction.is_nan() {
                warn!("Attempt {}: NaN progress dropped", attempt);
                return Effect::None;
            }
            let fraction = fraction.clamp(0.0, 1.0);
            if fraction <= progress {
                return Effect::None;
            }
            debug!("Attempt {}: progress {:.3}", attempt, fraction);
            state.phase = Phase::Downloading { progress: fraction };
            Effect::Publish(ReadinessState::Downloading { progress: fraction })
        }
        Action::DownloadFinished { attempt, result } => {
            if !accepts(state, attempt, "download result") {
                return Effect::None;
            }
            if !matches!(state.phase, Phase::Downloading { .. }) {
                warn!("Download result in phase {:?}, ignoring", state.phase);
                return Effect::None;
            }
            match result {
                Ok(()) => {
                    info!("Attempt {}: download finished", attempt);
                    state.phase = Phase::Ready;
                    Effect::Publish(ReadinessState::Ready)
                }
                Err(e) => {
                    warn!("Attempt {}: download failed: {}", attempt, e);
                    state.phase = Phase::Failed;
                    Effect::Publish(ReadinessState::Error(ResourceError::DownloadFailed(e)))
                }
            }
        }
    }
}

fn start_attempt(state: &mut TrackerState, resource: ResourceId) -> Effect {
    state.attempt += 1;
    info!(
        "Attempt {}: evaluating {} (was {:?})",
        state.attempt, resource, state.phase
    );
    state.phase = Phase::CheckingAvailability;
    state.resource = Some(resource.clone());
    Effect::Spawn {
        attempt: state.attempt,
        resource,
    }
}

fn accepts(state: &TrackerState, attempt: u64, what: &str) -> bool {
    if state.is_current(attempt) {
        return true;
    }
    debug!(
        "Dropping stale {} from attempt {} (current {})",
        what, attempt, state.attempt
    );
    false
}
