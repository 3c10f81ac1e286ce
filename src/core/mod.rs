//! # Core Readiness Logic
//!
//! This module decides whether the selected reading's resource is usable and
//! tells observers. It knows nothing about where resources come from (that is
//! the `resources` module) or who renders the state.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (tracker data) │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • Service (task loop)  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    CLI     │      │  Reader UI │      │   Tests    │
//!     │ (main.rs)  │      │ (external) │      │ (scripted) │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `ReadinessState` (what subscribers see) and `TrackerState`
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`broadcast`]: Last-value cache plus fan-out to subscribers
//! - [`preferences`]: The injectable reading preference store
//! - [`tracker`]: `ReadingResourcesService`, which ties it all together
//! - [`config`]: Layered configuration for the command-line front end

pub mod action;
pub mod broadcast;
pub mod config;
pub mod preferences;
pub mod state;
pub mod tracker;

pub use broadcast::Subscription;
pub use preferences::ReadingPreferences;
pub use state::ReadinessState;
pub use tracker::ReadingResourcesService;
