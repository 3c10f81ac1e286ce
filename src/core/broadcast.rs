//! # State Broadcast
//!
//! Single writer, many readers. The publisher keeps the last published state
//! and a list of subscriber channels. Subscribing and publishing take the same
//! lock, so a new subscriber gets the cached state followed by exactly the
//! states published after it, with no gap and no duplicate.
//!
//! Each subscriber has its own unbounded queue; a slow reader never holds up
//! the publisher or the other readers.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::Stream;
use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::state::ReadinessState;

#[derive(Default)]
struct Inner {
    latest: Option<ReadinessState>,
    subscribers: Vec<UnboundedSender<ReadinessState>>,
}

#[derive(Clone, Default)]
pub struct StatePublisher {
    inner: Arc<Mutex<Inner>>,
}

impl StatePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Caches `state` and fans it out. Subscribers that hung up are pruned.
    pub fn publish(&self, state: ReadinessState) {
        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(state.clone()).is_ok());
        debug!(
            "Published {:?} to {} subscriber(s)",
            state,
            inner.subscribers.len()
        );
        inner.latest = Some(state);
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if let Some(latest) = &inner.latest {
            // The receiver is alive, this cannot fail.
            let _ = tx.send(latest.clone());
        }
        inner.subscribers.push(tx);
        Subscription { receiver: rx }
    }

    pub fn latest(&self) -> Option<ReadinessState> {
        self.lock().latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// One observer's view of the stream. Dropping it unsubscribes.
pub struct Subscription {
    receiver: UnboundedReceiver<ReadinessState>,
}

impl Subscription {
    /// Waits for the next state. `None` once the publisher is gone.
    pub async fn recv(&mut self) -> Option<ReadinessState> {
        self.receiver.recv().await
    }

    /// Returns an already-delivered state without waiting.
    pub fn try_recv(&mut self) -> Option<ReadinessState> {
        self.receiver.try_recv().ok()
    }

    /// Waits for up to `count` states, stopping early if the publisher goes away.
    pub async fn take(&mut self, count: usize) -> Vec<ReadinessState> {
        let mut states = Vec::with_capacity(count);
        while states.len() < count {
            match self.receiver.recv().await {
                Some(state) => states.push(state),
                None => break,
            }
        }
        states
    }
}

impl Stream for Subscription {
    type Item = ReadinessState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
