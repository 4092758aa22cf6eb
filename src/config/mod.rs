//! Configuration management for Freshen

pub mod schema;

pub use schema::Config;

use crate::error::{FreshenError, FreshenResult};
use crate::storage::ClientProfile;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project-local config file, discovered by walking up from the cwd
pub const LOCAL_CONFIG_FILE: &str = "freshen.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freshen")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("freshen")
    }

    /// Get the audit log path
    pub fn audit_log_path() -> PathBuf {
        Self::state_dir().join("audit.log")
    }

    /// Client profile directory, unless the config pins one
    pub fn profile_dir(config: &Config) -> PathBuf {
        config
            .profile
            .dir
            .clone()
            .unwrap_or_else(|| ClientProfile::default_dir(&Self::state_dir()))
    }

    /// Nearest `freshen.toml` in `start` or any of its ancestors
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(LOCAL_CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub async fn load(&self) -> FreshenResult<Config> {
        self.load_merged(None).await
    }

    /// Load the global config with a project-local file layered on top
    ///
    /// Tables merge key by key; any other local value replaces the global one.
    pub async fn load_merged(&self, local: Option<&Path>) -> FreshenResult<Config> {
        let mut merged = if self.config_path.exists() {
            Self::read_table(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            toml::Table::new()
        };

        if let Some(local) = local {
            let overlay = Self::read_table(local).await?;
            merge_tables(&mut merged, overlay);
        }

        let origin = local.unwrap_or(&self.config_path);
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| FreshenError::ConfigInvalid {
                path: origin.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> FreshenResult<Config> {
        let table = Self::read_table(path).await?;
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| FreshenError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn read_table(path: &Path) -> FreshenResult<toml::Table> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FreshenError::io(format!("reading config from {}", path.display()), e))?;

        content
            .parse::<toml::Table>()
            .map_err(|e| FreshenError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> FreshenResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            FreshenError::io(format!("writing config to {}", self.config_path.display()), e)
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> FreshenResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FreshenError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Ensure the state and profile directories exist
    pub async fn ensure_state_dirs(config: &Config) -> FreshenResult<()> {
        for dir in [Self::state_dir(), Self::profile_dir(config)] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                FreshenError::io(format!("creating directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        let toml::Value::Table(incoming) = value else {
            base.insert(key, value);
            continue;
        };
        if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
            merge_tables(existing, incoming);
            continue;
        }
        base.insert(key, toml::Value::Table(incoming));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purge::PurgePolicy;
    use crate::version::VersionScheme;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("nonexistent.toml"));

        let config = manager.load().await.unwrap();
        assert_eq!(config.reconcile.poll_interval_secs, 60);
        assert_eq!(config.purge.policy, PurgePolicy::ClearAll);
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("nested").join("config.toml"));

        let mut config = Config::default();
        config.publish.scheme = VersionScheme::ContentHash;
        config.reconcile.force_update = true;

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.publish.scheme, VersionScheme::ContentHash);
        assert!(loaded.reconcile.force_update);
    }

    #[tokio::test]
    async fn local_overrides_global_per_key() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("config.toml");
        let local = temp.path().join(LOCAL_CONFIG_FILE);
        std::fs::write(
            &global,
            "[reconcile]\npoll_interval_secs = 120\nreload_delay_ms = 500\n",
        )
        .unwrap();
        std::fs::write(&local, "[reconcile]\npoll_interval_secs = 300\n").unwrap();

        let config = ConfigManager::with_path(global)
            .load_merged(Some(&local))
            .await
            .unwrap();

        assert_eq!(config.reconcile.poll_interval_secs, 300);
        assert_eq!(config.reconcile.reload_delay_ms, 500);
    }

    #[tokio::test]
    async fn invalid_config_names_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[purge]\npolicy = \"shred\"\n").unwrap();

        let err = ConfigManager::with_path(path.clone()).load().await.unwrap_err();
        match err {
            FreshenError::ConfigInvalid { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected ConfigInvalid, got {:?}", other),
        }
    }

    #[test]
    fn finds_local_config_in_ancestor() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("app").join("src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_FILE), "").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(LOCAL_CONFIG_FILE));
    }

    #[test]
    fn profile_dir_prefers_config() {
        let mut config = Config::default();
        config.profile.dir = Some(PathBuf::from("/tmp/profile"));
        assert_eq!(
            ConfigManager::profile_dir(&config),
            PathBuf::from("/tmp/profile")
        );
    }
}
