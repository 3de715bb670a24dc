// SPDX-License-Identifier: MIT

//! External media host client.
//!
//! Uploaded files are staged to a local temp path by the route layer and
//! handed to the media host here. The staged file is always removed before
//! this module returns, success or failure.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Config;
use crate::error::AppError;

/// A successfully hosted file.
#[derive(Debug, Clone)]
pub struct UploadedMedia {
    /// Public URL of the hosted file
    pub url: String,
}

/// Client interface to the media-hosting service.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload a locally staged file; the implementation removes the staged
    /// file whether or not the upload succeeds.
    async fn upload(&self, staged: &Path) -> Result<UploadedMedia, AppError>;
}

/// Response body of the media host's upload endpoint.
#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

/// HTTP client for the real media host.
///
/// Configuration is injected at construction; there is no process-global
/// client state.
pub struct HttpMediaHost {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

impl HttpMediaHost {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: config.media_upload_url.clone(),
            api_key: config.media_api_key.clone(),
        }
    }

    async fn try_upload(&self, staged: &Path) -> Result<UploadedMedia, AppError> {
        let bytes = tokio::fs::read(staged)
            .await
            .map_err(|e| AppError::Media(format!("Failed to read staged file: {}", e)))?;

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.api_key)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Media(format!("Upload request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Media(format!(
                "Media host returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Media(format!("Invalid media host response: {}", e)))?;

        Ok(UploadedMedia { url: body.url })
    }
}

#[async_trait]
impl MediaHost for HttpMediaHost {
    async fn upload(&self, staged: &Path) -> Result<UploadedMedia, AppError> {
        let result = self.try_upload(staged).await;

        // Remove the staged temp file in every case; a failed removal is
        // only worth a warning.
        if let Err(e) = tokio::fs::remove_file(staged).await {
            tracing::warn!(path = %staged.display(), error = %e, "Failed to remove staged file");
        }

        if let Ok(media) = &result {
            tracing::info!(url = %media.url, "Media uploaded");
        }
        result
    }
}

/// Offline media host for tests and local development.
///
/// Returns deterministic URLs derived from the staged file name and counts
/// uploads so tests can assert on them.
#[derive(Default)]
pub struct MockMediaHost {
    uploads: AtomicU64,
    /// When true, every upload fails (for error-path tests).
    pub fail: bool,
}

impl MockMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            uploads: AtomicU64::new(0),
            fail: true,
        }
    }

    pub fn upload_count(&self) -> u64 {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHost for MockMediaHost {
    async fn upload(&self, staged: &Path) -> Result<UploadedMedia, AppError> {
        let _ = tokio::fs::remove_file(staged).await;

        if self.fail {
            return Err(AppError::Media("mock upload failure".to_string()));
        }

        self.uploads.fetch_add(1, Ordering::SeqCst);
        let name = staged
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        Ok(UploadedMedia {
            url: format!("https://media.test/{}", name),
        })
    }
}

/// Stage uploaded bytes to a unique temp path for the media host.
pub async fn stage_upload(filename: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    // Keep the original extension so the media host can infer the type.
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let path = std::env::temp_dir().join(format!("viewtube-{}.{}", uuid::Uuid::new_v4(), ext));

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Media(format!("Failed to stage upload: {}", e)))?;
    Ok(path)
}
