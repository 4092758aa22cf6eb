//! Cache purge routine
//!
//! Removes stale client-held state so the next load fetches fresh assets
//! and fresh API responses. Each storage area is cleared independently: a
//! failing area is logged and reported, and the remaining areas are still
//! cleared. A purge always "completes"; a half-cleared profile followed by a
//! reload beats no reload at all.
//!
//! # Policies
//!
//! | Policy | HTTP caches | local / session storage |
//! |--------|-------------|-------------------------|
//! | `clear_all` | deleted | everything removed, auth included |
//! | `preserve_auth` | deleted | everything except the allow-list |
//!
//! `clear_all` is the default: after a purge the user signs in again.

use crate::config::schema::PurgeConfig;
use crate::storage::{ClientProfile, KeyValueStore, AUTH_KEYS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// Which keys survive a purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgePolicy {
    /// Remove everything, including authentication state
    #[default]
    ClearAll,
    /// Keep the auth token, cached user and cached roles
    PreserveAuth,
}

impl fmt::Display for PurgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClearAll => write!(f, "clear_all"),
            Self::PreserveAuth => write!(f, "preserve_auth"),
        }
    }
}

/// Storage area touched by a purge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageArea {
    CacheStorage,
    Local,
    Session,
}

impl fmt::Display for StorageArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheStorage => write!(f, "cache storage"),
            Self::Local => write!(f, "local storage"),
            Self::Session => write!(f, "session storage"),
        }
    }
}

/// Outcome for one storage area
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaOutcome {
    pub area: StorageArea,
    /// Entries removed
    pub removed: usize,
    /// Failure reasons; empty when the area cleared fully
    pub errors: Vec<String>,
}

impl AreaOutcome {
    fn new(area: StorageArea) -> Self {
        Self {
            area,
            removed: 0,
            errors: vec![],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-area results of one purge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub areas: Vec<AreaOutcome>,
}

impl PurgeReport {
    /// True when every area cleared without error
    pub fn is_complete(&self) -> bool {
        self.areas.iter().all(AreaOutcome::is_ok)
    }

    pub fn removed(&self) -> usize {
        self.areas.iter().map(|a| a.removed).sum()
    }

    pub fn failed_areas(&self) -> Vec<StorageArea> {
        self.areas
            .iter()
            .filter(|a| !a.is_ok())
            .map(|a| a.area)
            .collect()
    }
}

/// Clears a client profile under a fixed policy
#[derive(Debug, Clone)]
pub struct PurgeRoutine {
    policy: PurgePolicy,
    preserved: BTreeSet<String>,
}

impl PurgeRoutine {
    pub fn new(policy: PurgePolicy) -> Self {
        Self {
            policy,
            preserved: AUTH_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Routine for the configured policy and extra allow-list keys
    pub fn from_config(config: &PurgeConfig) -> Self {
        Self::new(config.policy).with_preserved_keys(config.preserve_keys.iter().cloned())
    }

    /// Add keys kept under `preserve_auth`
    pub fn with_preserved_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserved.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn policy(&self) -> PurgePolicy {
        self.policy
    }

    /// Purge every area of `profile`; never fails
    pub async fn run(&self, profile: &ClientProfile) -> PurgeReport {
        let mut report = PurgeReport::default();

        if let Some(caches) = &profile.caches {
            let mut outcome = AreaOutcome::new(StorageArea::CacheStorage);
            match caches.names().await {
                Ok(names) => {
                    for name in names {
                        match caches.delete(&name).await {
                            Ok(true) => outcome.removed += 1,
                            Ok(false) => {}
                            Err(e) => {
                                warn!("Failed to delete cache {}: {}", name, e);
                                outcome.errors.push(format!("{}: {}", name, e));
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to enumerate cache storage: {}", e);
                    outcome.errors.push(e.to_string());
                }
            }
            report.areas.push(outcome);
        } else {
            debug!("No cache storage available, skipping");
        }

        report
            .areas
            .push(self.clear_store(StorageArea::Local, profile.local.as_ref()));
        report
            .areas
            .push(self.clear_store(StorageArea::Session, profile.session.as_ref()));

        if report.is_complete() {
            info!(
                "Purge complete ({}): removed {} entries",
                self.policy,
                report.removed()
            );
        } else {
            warn!(
                "Purge finished with failures in: {}",
                report
                    .failed_areas()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        report
    }

    fn clear_store(&self, area: StorageArea, store: &dyn KeyValueStore) -> AreaOutcome {
        let mut outcome = AreaOutcome::new(area);

        let keys = match store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Failed to list {}: {}", area, e);
                outcome.errors.push(e.to_string());
                // Still try a blanket clear under clear_all
                if self.policy == PurgePolicy::ClearAll {
                    if let Err(e) = store.clear() {
                        warn!("Failed to clear {}: {}", area, e);
                        outcome.errors.push(e.to_string());
                    }
                }
                return outcome;
            }
        };

        match self.policy {
            PurgePolicy::ClearAll => match store.clear() {
                Ok(()) => outcome.removed = keys.len(),
                Err(e) => {
                    warn!("Failed to clear {}: {}", area, e);
                    outcome.errors.push(e.to_string());
                }
            },
            PurgePolicy::PreserveAuth => {
                for key in keys.iter().filter(|k| !self.preserved.contains(*k)) {
                    match store.remove(key) {
                        Ok(()) => outcome.removed += 1,
                        Err(e) => {
                            warn!("Failed to remove {} from {}: {}", key, area, e);
                            outcome.errors.push(format!("{}: {}", key, e));
                        }
                    }
                }
            }
        }

        debug!("Cleared {} ({} entries)", area, outcome.removed);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FreshenError, FreshenResult};
    use crate::storage::{MemoryCacheStorage, MemoryStore, ACK_KEY, ROLES_KEY, TOKEN_KEY, USER_INFO_KEY};
    use std::sync::Arc;

    /// Key-value area whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> FreshenResult<Option<String>> {
            Err(FreshenError::storage("broken", "permission denied"))
        }
        fn set(&self, _key: &str, _value: &str) -> FreshenResult<()> {
            Err(FreshenError::storage("broken", "permission denied"))
        }
        fn remove(&self, _key: &str) -> FreshenResult<()> {
            Err(FreshenError::storage("broken", "permission denied"))
        }
        fn keys(&self) -> FreshenResult<Vec<String>> {
            Err(FreshenError::storage("broken", "permission denied"))
        }
        fn clear(&self) -> FreshenResult<()> {
            Err(FreshenError::storage("broken", "permission denied"))
        }
    }

    fn populated_profile() -> ClientProfile {
        let local = MemoryStore::with_entries([
            (TOKEN_KEY, "jwt"),
            (USER_INFO_KEY, "{\"name\":\"ops\"}"),
            (ROLES_KEY, "[\"admin\"]"),
            (ACK_KEY, "1000"),
            ("tablePageSize", "50"),
        ]);
        let session = MemoryStore::with_entries([("activeCounter", "3"), (TOKEN_KEY, "jwt")]);
        ClientProfile::new(
            Arc::new(local),
            Arc::new(session),
            Some(Arc::new(MemoryCacheStorage::with_caches(["precache-v1", "api"]))),
        )
    }

    #[tokio::test]
    async fn clear_all_removes_auth_too() {
        let profile = populated_profile();
        let report = PurgeRoutine::new(PurgePolicy::ClearAll).run(&profile).await;

        assert!(report.is_complete());
        assert!(profile.local.keys().unwrap().is_empty());
        assert!(profile.session.keys().unwrap().is_empty());
        let caches = profile.caches.as_ref().unwrap();
        assert!(caches.names().await.unwrap().is_empty());
        assert_eq!(report.removed(), 2 + 5 + 2);
    }

    #[tokio::test]
    async fn preserve_auth_keeps_allow_list_only() {
        let profile = populated_profile();
        let report = PurgeRoutine::new(PurgePolicy::PreserveAuth)
            .run(&profile)
            .await;

        assert!(report.is_complete());
        assert_eq!(
            profile.local.keys().unwrap(),
            vec![ROLES_KEY, TOKEN_KEY, USER_INFO_KEY]
        );
        assert!(profile.local.get(ACK_KEY).unwrap().is_none());
        assert_eq!(profile.session.keys().unwrap(), vec![TOKEN_KEY]);
    }

    #[tokio::test]
    async fn preserve_auth_honours_extra_keys() {
        let profile = populated_profile();
        let config = PurgeConfig {
            policy: PurgePolicy::PreserveAuth,
            preserve_keys: vec!["tablePageSize".to_string()],
        };
        PurgeRoutine::from_config(&config).run(&profile).await;

        assert_eq!(profile.local.get("tablePageSize").unwrap().as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn failing_area_does_not_abort_others() {
        let session = MemoryStore::with_entries([("activeCounter", "3")]);
        let profile = ClientProfile::new(
            Arc::new(BrokenStore),
            Arc::new(session),
            Some(Arc::new(MemoryCacheStorage::with_caches(["api"]))),
        );

        let report = PurgeRoutine::new(PurgePolicy::ClearAll).run(&profile).await;

        assert!(!report.is_complete());
        assert_eq!(report.failed_areas(), vec![StorageArea::Local]);
        assert!(profile.session.keys().unwrap().is_empty());
        let caches = profile.caches.as_ref().unwrap();
        assert!(caches.names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_cache_storage_is_skipped() {
        let profile = ClientProfile::new(
            Arc::new(MemoryStore::with_entries([("a", "1")])),
            Arc::new(MemoryStore::new()),
            None,
        );

        let report = PurgeRoutine::new(PurgePolicy::ClearAll).run(&profile).await;
        assert_eq!(report.areas.len(), 2);
        assert!(report.is_complete());
    }

    #[test]
    fn policy_serializes_snake_case() {
        assert_eq!(PurgePolicy::PreserveAuth.to_string(), "preserve_auth");
        let json = serde_json::to_string(&PurgePolicy::ClearAll).unwrap();
        assert_eq!(json, "\"clear_all\"");
    }
}
