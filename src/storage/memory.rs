//! In-memory storage areas

use super::{CacheStorage, KeyValueStore};
use crate::error::{FreshenError, FreshenResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

fn lock<'a, T>(area: &str, m: &'a Mutex<T>) -> FreshenResult<MutexGuard<'a, T>> {
    m.lock()
        .map_err(|_| FreshenError::storage(area, "lock poisoned"))
}

/// Key-value area held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> FreshenResult<Option<String>> {
        Ok(lock("memory", &self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> FreshenResult<()> {
        lock("memory", &self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> FreshenResult<()> {
        lock("memory", &self.entries)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> FreshenResult<Vec<String>> {
        Ok(lock("memory", &self.entries)?.keys().cloned().collect())
    }

    fn clear(&self) -> FreshenResult<()> {
        lock("memory", &self.entries)?.clear();
        Ok(())
    }
}

/// Cache storage held in memory
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<BTreeSet<String>>,
}

impl MemoryCacheStorage {
    pub fn with_caches<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            caches: Mutex::new(names.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn names(&self) -> FreshenResult<Vec<String>> {
        Ok(lock("cache", &self.caches)?.iter().cloned().collect())
    }

    async fn delete(&self, name: &str) -> FreshenResult<bool> {
        Ok(lock("cache", &self.caches)?.remove(name))
    }
}
