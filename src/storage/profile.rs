//! Client profile: the set of storage areas one client owns

use super::{
    CacheStorage, DirCacheStorage, FileStore, KeyValueStore, MemoryCacheStorage, MemoryStore,
};
use crate::error::FreshenResult;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Local, session and HTTP cache storage of one client
#[derive(Clone)]
pub struct ClientProfile {
    pub local: Arc<dyn KeyValueStore>,
    pub session: Arc<dyn KeyValueStore>,
    /// Absent when the platform exposes no cache storage API
    pub caches: Option<Arc<dyn CacheStorage>>,
}

impl ClientProfile {
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        caches: Option<Arc<dyn CacheStorage>>,
    ) -> Self {
        Self {
            local,
            session,
            caches,
        }
    }

    /// Empty profile held entirely in memory
    pub fn in_memory() -> Self {
        Self {
            local: Arc::new(MemoryStore::new()),
            session: Arc::new(MemoryStore::new()),
            caches: Some(Arc::new(MemoryCacheStorage::default())),
        }
    }

    /// File-backed profile rooted at `dir`
    ///
    /// Layout: `local.json`, `session.json`, `caches/<name>/`.
    pub fn open(dir: &Path) -> FreshenResult<Self> {
        Ok(Self {
            local: Arc::new(FileStore::open("local", dir.join("local.json"))?),
            session: Arc::new(FileStore::open("session", dir.join("session.json"))?),
            caches: Some(Arc::new(DirCacheStorage::new(dir.join("caches")))),
        })
    }

    /// Default profile directory under the state dir
    pub fn default_dir(state_dir: &Path) -> PathBuf {
        state_dir.join("profile")
    }
}
