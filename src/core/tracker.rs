//! # Reading Resources Service
//!
//! Keeps the resource for the selected reading ready and tells everyone about it.
//!
//! ```text
//!  ReadingPreferences ──changes──┐
//!                                ▼
//!  retry() ──────────────▶ tracker task ──publish──▶ StatePublisher ──▶ Subscriptions
//!                           (update())
//!                                ▲
//!  attempt task ──tagged actions─┘
//!   is_available → download → progress…
//! ```
//!
//! The tracker task is the only place that runs `update()` and the only
//! publisher, so subscribers see events in order. Each evaluation runs in its
//! own attempt task; a newer evaluation aborts the previous task and the
//! reducer drops anything it already queued.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{AbortHandle, JoinHandle};

use crate::Reading;
use crate::core::action::{Action, Effect, update};
use crate::core::broadcast::{StatePublisher, Subscription};
use crate::core::preferences::ReadingPreferences;
use crate::core::state::{ReadinessState, TrackerState};
use crate::resources::{ResourceId, ResourceSource};

/// Progress updates buffered between a download and the tracker.
const PROGRESS_BUFFER: usize = 32;

pub struct ReadingResourcesService {
    publisher: StatePublisher,
    actions: UnboundedSender<Action>,
    task: JoinHandle<()>,
}

impl ReadingResourcesService {
    /// Starts tracking the reading selected in `preferences`.
    ///
    /// Spawns onto the current tokio runtime; panics outside of one.
    pub fn new(preferences: &ReadingPreferences, source: Arc<dyn ResourceSource>) -> Self {
        let publisher = StatePublisher::new();
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let (reading, changes) = preferences.current_and_subscribe();

        info!(
            "Starting reading resources service: reading={:?}, source={}",
            reading,
            source.name()
        );

        let tracker = Tracker {
            state: TrackerState::new(),
            source,
            publisher: publisher.clone(),
            actions: actions_tx.clone(),
            in_flight: None,
        };
        let task = tokio::spawn(tracker.run(reading, actions_rx, changes));

        Self {
            publisher,
            actions: actions_tx,
            task,
        }
    }

    /// Replays the latest state (if any), then every state after it.
    pub fn subscribe(&self) -> Subscription {
        self.publisher.subscribe()
    }

    pub fn current(&self) -> Option<ReadinessState> {
        self.publisher.latest()
    }

    /// Re-runs the evaluation for the current resource. Nothing retries on its own.
    pub fn retry(&self) {
        if self.actions.send(Action::Retry).is_err() {
            warn!("Retry dropped: tracker task has stopped");
        }
    }
}

impl Drop for ReadingResourcesService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Tracker {
    state: TrackerState,
    source: Arc<dyn ResourceSource>,
    publisher: StatePublisher,
    actions: UnboundedSender<Action>,
    in_flight: Option<AbortHandle>,
}

impl Tracker {
    async fn run(
        mut self,
        initial: Reading,
        mut actions: UnboundedReceiver<Action>,
        mut changes: UnboundedReceiver<Reading>,
    ) {
        self.handle(Action::Evaluate(initial.resource_id()));

        let mut changes_open = true;
        loop {
            let action = tokio::select! {
                biased;
                change = changes.recv(), if changes_open => match change {
                    Some(reading) => {
                        info!("Reading changed to {:?}", reading);
                        Action::Evaluate(reading.resource_id())
                    }
                    None => {
                        debug!("Preference store dropped, no more reading changes");
                        changes_open = false;
                        continue;
                    }
                },
                action = actions.recv() => match action {
                    Some(action) => action,
                    None => break,
                },
            };
            self.handle(action);
        }
    }

    fn handle(&mut self, action: Action) {
        match update(&mut self.state, action) {
            Effect::None => {}
            Effect::Publish(state) => self.publisher.publish(state),
            Effect::Spawn { attempt, resource } => self.spawn_attempt(attempt, resource),
        }
    }

    fn spawn_attempt(&mut self, attempt: u64, resource: ResourceId) {
        if let Some(previous) = self.in_flight.take() {
            debug!("Aborting superseded attempt {}", attempt - 1);
            previous.abort();
        }
        let source = self.source.clone();
        let actions = self.actions.clone();
        let handle = tokio::spawn(run_attempt(attempt, resource, source, actions));
        self.in_flight = Some(handle.abort_handle());
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

/// One availability-check-then-download operation. Reports back through
/// `actions`, tagging everything with `attempt`.
async fn run_attempt(
    attempt: u64,
    resource: ResourceId,
    source: Arc<dyn ResourceSource>,
    actions: UnboundedSender<Action>,
) {
    let result = source.is_available(&resource).await;
    let missing = matches!(result, Ok(false));
    if actions
        .send(Action::AvailabilityChecked { attempt, result })
        .is_err()
    {
        warn!("Attempt {}: tracker gone, stopping", attempt);
        return;
    }
    if !missing {
        return;
    }

    let (progress_tx, mut progress_rx) = mpsc::channel::<f64>(PROGRESS_BUFFER);
    let download = source.download(&resource, progress_tx);
    let forward = async {
        while let Some(fraction) = progress_rx.recv().await {
            if actions.send(Action::Progress { attempt, fraction }).is_err() {
                warn!("Attempt {}: tracker gone, dropping progress", attempt);
                break;
            }
        }
    };

    // The download owns the progress sender, so forwarding ends with it and
    // every progress action is queued before the result.
    let (result, ()) = tokio::join!(download, forward);

    if actions
        .send(Action::DownloadFinished { attempt, result })
        .is_err()
    {
        warn!("Attempt {}: tracker gone, dropping download result", attempt);
    }
}
