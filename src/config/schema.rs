//! Configuration schema for Freshen
//!
//! Configuration is stored at `~/.config/freshen/config.toml`, or in a
//! project-local `freshen.toml`.

use crate::purge::PurgePolicy;
use crate::version::VersionScheme;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shortest accepted polling interval in seconds
pub const MIN_POLL_INTERVAL_SECS: u64 = 30;
/// Longest accepted polling interval in seconds
pub const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Build-time publishing
    pub publish: PublishConfig,

    /// Runtime version reconciliation
    pub reconcile: ReconcileConfig,

    /// Cache purge policy
    pub purge: PurgeConfig,

    /// Client profile location
    pub profile: ProfileConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Build-time publishing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Served HTML shell carrying the injection delimiters
    pub shell: PathBuf,

    /// Where the version resource is written
    pub version_file: PathBuf,

    /// Version identifier scheme
    pub scheme: VersionScheme,

    /// Asset tree hashed by the content_hash scheme
    pub asset_root: PathBuf,

    /// Pin the recorded source revision (skips env/git detection)
    pub source_revision: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from("dist/index.html"),
            version_file: PathBuf::from("dist/version.json"),
            scheme: VersionScheme::Timestamp,
            asset_root: PathBuf::from("dist"),
            source_revision: None,
        }
    }
}

/// Runtime reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// URL or local path of the published version resource
    pub version_url: String,

    /// Seconds between version polls (0 = poll on start only)
    pub poll_interval_secs: u64,

    /// Delay between purge completion and reload
    pub reload_delay_ms: u64,

    /// Purge without prompting when a new version is detected
    pub force_update: bool,

    /// Command run to reload the client (optional)
    pub reload_command: Option<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            version_url: "dist/version.json".to_string(),
            poll_interval_secs: 60,
            reload_delay_ms: 1000,
            force_update: false,
            reload_command: None,
        }
    }
}

impl ReconcileConfig {
    /// Effective poll interval, clamped to the supported range
    pub fn poll_interval(&self) -> Option<std::time::Duration> {
        if self.poll_interval_secs == 0 {
            return None;
        }
        let secs = self
            .poll_interval_secs
            .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS);
        Some(std::time::Duration::from_secs(secs))
    }

    pub fn reload_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.reload_delay_ms)
    }
}

/// Cache purge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurgeConfig {
    /// "clear_all" (default) or "preserve_auth"
    pub policy: PurgePolicy,

    /// Extra keys kept under preserve_auth
    pub preserve_keys: Vec<String>,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            policy: PurgePolicy::ClearAll,
            preserve_keys: vec![],
        }
    }
}

/// Client profile settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Profile directory (defaults to the state dir)
    pub dir: Option<PathBuf>,
}
