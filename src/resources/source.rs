use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc::Sender;

/// Identifies the resource package a reading needs. Opaque to the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors a resource source can report.
/// Cloneable so they can travel inside published states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Local storage failure (permissions, disk full, unreadable bundle).
    Io(String),
    /// Network-level failure (timeout, DNS, connection refused, dropped body).
    Network(String),
    /// Server answered with a non-success status.
    Http { status: u16, message: String },
    /// The progress receiver went away before the download finished.
    ChannelClosed,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(msg) => write!(f, "I/O error: {msg}"),
            SourceError::Network(msg) => write!(f, "network error: {msg}"),
            SourceError::Http { status, message } => {
                write!(f, "HTTP {status}: {message}")
            }
            SourceError::ChannelClosed => write!(f, "progress channel closed"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Why an evaluation failed. Surfaced to subscribers, never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    AvailabilityCheckFailed(SourceError),
    DownloadFailed(SourceError),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::AvailabilityCheckFailed(e) => {
                write!(f, "availability check failed: {e}")
            }
            ResourceError::DownloadFailed(e) => write!(f, "download failed: {e}"),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::AvailabilityCheckFailed(e) | ResourceError::DownloadFailed(e) => Some(e),
        }
    }
}

/// Where reading resources come from: a local presence check plus a fetch.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Returns the name of the source, for logging.
    fn name(&self) -> &str;

    /// Whether the resource is already usable without downloading.
    async fn is_available(&self, resource: &ResourceId) -> Result<bool, SourceError>;

    /// Fetches the resource, sending completed fractions to `progress` as it goes.
    /// Fractions should lie in `[0, 1]`; the tracker clamps whatever arrives.
    async fn download(
        &self,
        resource: &ResourceId,
        progress: Sender<f64>,
    ) -> Result<(), SourceError>;
}
