//! Where the latest published version comes from

use crate::error::{FreshenError, FreshenResult};
use crate::version::VersionManifest;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::debug;

/// Fetches the latest published version manifest
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn fetch_latest(&self) -> FreshenResult<VersionManifest>;

    /// Human-readable origin for logs and errors
    fn describe(&self) -> String;
}

/// Build a source from a config value: `http(s)://` URLs or local paths
pub fn from_location(location: &str) -> Box<dyn VersionSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Box::new(HttpVersionSource::new(location))
    } else {
        Box::new(FileVersionSource::new(location))
    }
}

/// Version resource served over HTTP(S)
pub struct HttpVersionSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpVersionSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            agent: ureq::Agent::new_with_defaults(),
        }
    }

    /// URL with a cache-busting timestamp parameter
    pub fn cache_busted_url(&self, millis: i64) -> String {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", self.url, sep, millis)
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn fetch_latest(&self) -> FreshenResult<VersionManifest> {
        let url = self.cache_busted_url(Utc::now().timestamp_millis());
        let agent = self.agent.clone();
        debug!("Fetching {}", url);

        let body = tokio::task::spawn_blocking(move || -> Result<String, String> {
            let mut response = agent
                .get(&url)
                .header("Cache-Control", "no-cache")
                .call()
                .map_err(|e| e.to_string())?;
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| FreshenError::Internal(format!("fetch task failed: {}", e)))?
        .map_err(|reason| FreshenError::fetch(&self.url, reason))?;

        VersionManifest::parse(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Version resource read from the local filesystem
pub struct FileVersionSource {
    path: PathBuf,
}

impl FileVersionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VersionSource for FileVersionSource {
    async fn fetch_latest(&self) -> FreshenResult<VersionManifest> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FreshenError::fetch(self.path.display().to_string(), e.to_string()))?;
        VersionManifest::parse(&body)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
