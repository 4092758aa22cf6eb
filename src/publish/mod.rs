//! Build-version publisher
//!
//! Run once per build. Produces one [`BuildVersion`] and makes it
//! observable from two independent surfaces:
//!
//! - the version resource (`version.json`) fetched by running clients
//! - the globals block in the served page shell, read by the running build
//!
//! The shell is validated before anything is written, so a shell without
//! the injection delimiters fails the build and leaves both files untouched.

pub mod hash;
pub mod revision;
pub mod shell;

pub use shell::{ShellGlobals, INJECT_END, INJECT_START};

use crate::config::schema::PublishConfig;
use crate::error::{FreshenError, FreshenResult};
use crate::version::{BuildVersion, VersionManifest, VersionScheme};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Result of a publish run
#[derive(Debug, Clone, Serialize)]
pub struct PublishedBuild {
    pub manifest: VersionManifest,
    pub version_file: PathBuf,
    pub shell: PathBuf,
    /// False for dry runs
    pub written: bool,
}

/// Writes the version resource and injects the shell globals
pub struct Publisher {
    config: PublishConfig,
}

impl Publisher {
    pub fn new(config: PublishConfig) -> Self {
        Self { config }
    }

    /// Publish a build stamped at `now`
    pub async fn publish(
        &self,
        now: DateTime<Utc>,
        source_revision: String,
        dry_run: bool,
    ) -> FreshenResult<PublishedBuild> {
        let shell_path = &self.config.shell;
        let shell_html = read_text(shell_path).await?;
        shell::ensure_placeholder(&shell_html, shell_path)?;

        let version = self.next_version(now).await?;
        let manifest = VersionManifest::new(version, now, source_revision);
        debug!(
            "Publishing version {} ({}, {})",
            manifest.version, self.config.scheme, manifest.source_revision
        );

        let globals = ShellGlobals {
            version: manifest.version.clone(),
            build_date: manifest.build_date.clone(),
        };
        let injected = shell::inject_globals(&shell_html, &globals, shell_path)?;

        if !dry_run {
            write_text(&self.config.version_file, &manifest.to_json_pretty()?).await?;
            write_text(shell_path, &injected).await?;
            info!(
                "Published build {} to {}",
                manifest.version,
                self.config.version_file.display()
            );
        }

        Ok(PublishedBuild {
            manifest,
            version_file: self.config.version_file.clone(),
            shell: shell_path.clone(),
            written: !dry_run,
        })
    }

    async fn next_version(&self, now: DateTime<Utc>) -> FreshenResult<BuildVersion> {
        match self.config.scheme {
            VersionScheme::Timestamp => {
                let previous = self.previous_version().await;
                Ok(BuildVersion::next_timestamp(now, previous.as_ref()))
            }
            VersionScheme::ContentHash => {
                let root = self.config.asset_root.clone();
                let skip = [self.config.shell.clone(), self.config.version_file.clone()];
                let digest = tokio::task::spawn_blocking(move || {
                    let skip: Vec<&Path> = skip.iter().map(PathBuf::as_path).collect();
                    hash::hash_asset_tree(&root, &skip)
                })
                .await
                .map_err(|e| FreshenError::Internal(format!("hash task failed: {}", e)))??;
                Ok(BuildVersion::from_content_hash(&digest))
            }
        }
    }

    /// Version from the currently published resource, if readable
    async fn previous_version(&self) -> Option<BuildVersion> {
        let body = fs::read_to_string(&self.config.version_file).await.ok()?;
        VersionManifest::parse(&body).ok().map(|m| m.version)
    }
}

async fn read_text(path: &Path) -> FreshenResult<String> {
    if !path.exists() {
        return Err(FreshenError::PathNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path)
        .await
        .map_err(|e| FreshenError::io(format!("reading {}", path.display()), e))
}

async fn write_text(path: &Path, content: &str) -> FreshenResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| FreshenError::io(format!("creating {}", parent.display()), e))?;
    }
    fs::write(path, content)
        .await
        .map_err(|e| FreshenError::io(format!("writing {}", path.display()), e))
}
