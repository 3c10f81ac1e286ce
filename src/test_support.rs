//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::Sender;

use crate::Reading;
use crate::resources::{ResourceId, ResourceSource, SourceError};

/// How the fake source behaves for one resource.
#[derive(Clone)]
pub enum Script {
    Available,
    CheckFails(SourceError),
    /// Missing locally. The download reports `progress`, then waits on `hold`
    /// (if any), then finishes with `result`.
    Download {
        progress: Vec<f64>,
        result: Result<(), SourceError>,
        hold: Option<Arc<Semaphore>>,
    },
}

impl Script {
    pub fn downloads(progress: Vec<f64>) -> Self {
        Script::Download {
            progress,
            result: Ok(()),
            hold: None,
        }
    }

    pub fn download_fails(error: SourceError) -> Self {
        Script::Download {
            progress: Vec::new(),
            result: Err(error),
            hold: None,
        }
    }
}

/// A resource source driven by per-reading scripts. Unscripted resources are available.
pub struct ScriptedSource {
    scripts: Mutex<HashMap<ResourceId, Script>>,
    /// When set, every availability check consumes one permit first.
    check_gate: Option<Arc<Semaphore>>,
    checks: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            check_gate: None,
            checks: AtomicUsize::new(0),
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            check_gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn with(self, reading: Reading, script: Script) -> Self {
        self.set(reading, script);
        self
    }

    pub fn set(&self, reading: Reading, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(reading.resource_id(), script);
    }

    /// Number of availability checks started so far.
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    fn script(&self, resource: &ResourceId) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get(resource)
            .cloned()
            .unwrap_or(Script::Available)
    }
}

#[async_trait]
impl ResourceSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_available(&self, resource: &ResourceId) -> Result<bool, SourceError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.check_gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.script(resource) {
            Script::Available => Ok(true),
            Script::CheckFails(e) => Err(e),
            Script::Download { .. } => Ok(false),
        }
    }

    async fn download(
        &self,
        resource: &ResourceId,
        progress: Sender<f64>,
    ) -> Result<(), SourceError> {
        let Script::Download {
            progress: steps,
            result,
            hold,
        } = self.script(resource)
        else {
            return Ok(());
        };
        for step in steps {
            progress
                .send(step)
                .await
                .map_err(|_| SourceError::ChannelClosed)?;
        }
        if let Some(hold) = hold {
            hold.acquire().await.unwrap().forget();
        }
        result
    }
}
