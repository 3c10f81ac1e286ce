//! HTTP-backed resource source.
//!
//! A resource counts as available when its package file exists either in the
//! read-only bundle directory (shipped with the install) or in the writable
//! resources directory (previously downloaded).
//!
//! Downloads stream into `<tag>.zip.tmp` and are renamed into place only once
//! the body has been fully written, so a half-finished file never looks
//! available.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;

use crate::resources::{ResourceId, ResourceSource, SourceError};

/// File extension of resource packages, both on the server and on disk.
pub const RESOURCE_EXTENSION: &str = "zip";

pub struct HttpResourceSource {
    base_url: String,
    resources_dir: PathBuf,
    bundle_dir: Option<PathBuf>,
    client: reqwest::Client,
}

impl HttpResourceSource {
    pub fn new(base_url: impl Into<String>, resources_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resources_dir: resources_dir.into(),
            bundle_dir: None,
            client: reqwest::Client::new(),
        }
    }

    /// Also treat packages found in `dir` as available. Never written to.
    pub fn with_bundle_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bundle_dir = Some(dir.into());
        self
    }

    /// Where a downloaded package for `resource` lives.
    pub fn resource_path(&self, resource: &ResourceId) -> PathBuf {
        self.resources_dir.join(file_name(resource))
    }

    fn resource_url(&self, resource: &ResourceId) -> String {
        format!("{}/{}", self.base_url, file_name(resource))
    }
}

fn file_name(resource: &ResourceId) -> String {
    format!("{}.{}", resource, RESOURCE_EXTENSION)
}

async fn is_file(path: &Path) -> Result<bool, SourceError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SourceError::Io(format!("{}: {e}", path.display()))),
    }
}

#[async_trait]
impl ResourceSource for HttpResourceSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn is_available(&self, resource: &ResourceId) -> Result<bool, SourceError> {
        if let Some(bundle_dir) = &self.bundle_dir
            && is_file(&bundle_dir.join(file_name(resource))).await?
        {
            debug!("Resource {} found in bundle {}", resource, bundle_dir.display());
            return Ok(true);
        }

        let available = is_file(&self.resource_path(resource)).await?;
        debug!("Resource {} available on disk: {}", resource, available);
        Ok(available)
    }

    async fn download(
        &self,
        resource: &ResourceId,
        progress: Sender<f64>,
    ) -> Result<(), SourceError> {
        let url = self.resource_url(resource);
        info!("Downloading resource {} from {}", resource, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        debug!("Resource response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Resource server error: {} - {}", status, message);
            return Err(SourceError::Http { status, message });
        }

        fs::create_dir_all(&self.resources_dir)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.resources_dir.display())))?;

        let final_path = self.resource_path(resource);
        let tmp_path = final_path.with_extension(format!("{RESOURCE_EXTENSION}.tmp"));

        let result = write_body(response, &tmp_path, &progress).await;
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                debug!("No partial file to remove at {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e);
        }

        fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {e}", final_path.display())))?;

        // Unknown content lengths never report intermediate progress.
        if progress.send(1.0).await.is_err() {
            warn!("Final progress send failed: receiver dropped");
            return Err(SourceError::ChannelClosed);
        }

        info!("Resource {} stored at {}", resource, final_path.display());
        Ok(())
    }
}

/// Streams the response body into `path`, reporting received / total.
async fn write_body(
    mut response: reqwest::Response,
    path: &Path,
    progress: &Sender<f64>,
) -> Result<(), SourceError> {
    let total = response.content_length().filter(|len| *len > 0);
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;

    let mut received = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| SourceError::Network(e.to_string()))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;
        received += chunk.len() as u64;

        if let Some(total) = total {
            let fraction = received as f64 / total as f64;
            debug!("Received {} of {} bytes", received, total);
            if progress.send(fraction).await.is_err() {
                warn!("Progress send failed: receiver dropped");
                return Err(SourceError::ChannelClosed);
            }
        }
    }

    file.flush()
        .await
        .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url_strips_trailing_slash() {
        let source = HttpResourceSource::new("https://example.com/resources/", "/tmp/res");
        let url = source.resource_url(&ResourceId::new("hafs_1440"));
        assert_eq!(url, "https://example.com/resources/hafs_1440.zip");
    }

    #[test]
    fn test_resource_path_uses_extension() {
        let source = HttpResourceSource::new("https://example.com", "/tmp/res");
        let path = source.resource_path(&ResourceId::new("tajweed"));
        assert_eq!(path, PathBuf::from("/tmp/res/tajweed.zip"));
    }
}
