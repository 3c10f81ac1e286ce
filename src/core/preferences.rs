//! # Reading Preferences
//!
//! The user's selected reading, shared across the process. Cloning the store
//! shares it. Every `set_reading` call notifies listeners, including a call
//! with the current value, so re-selecting a reading re-runs evaluation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::Reading;

struct Inner {
    reading: Reading,
    listeners: Vec<UnboundedSender<Reading>>,
}

#[derive(Clone)]
pub struct ReadingPreferences {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ReadingPreferences {
    fn default() -> Self {
        Self::new(Reading::default())
    }
}

impl ReadingPreferences {
    pub fn new(reading: Reading) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                reading,
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn reading(&self) -> Reading {
        self.lock().reading
    }

    pub fn set_reading(&self, reading: Reading) {
        let mut inner = self.lock();
        debug!("Reading preference: {:?} -> {:?}", inner.reading, reading);
        inner.reading = reading;
        inner.listeners.retain(|listener| listener.send(reading).is_ok());
    }

    /// Registers for change notifications. Only changes made after this call
    /// are delivered; read `reading()` for the current value.
    pub fn subscribe(&self) -> UnboundedReceiver<Reading> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().listeners.push(tx);
        rx
    }

    /// Atomically returns the current value and registers for later changes.
    pub fn current_and_subscribe(&self) -> (Reading, UnboundedReceiver<Reading>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        inner.listeners.push(tx);
        (inner.reading, rx)
    }
}
