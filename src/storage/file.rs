//! File-backed storage areas
//!
//! A [`FileStore`] persists one key-value area as a JSON object. Several
//! processes may share a profile (`watch` running while `purge` or `ack`
//! edits it), so nothing is cached in memory: every read goes to the file,
//! and every mutation is a read-modify-write under an exclusive advisory
//! lock on a sidecar `.lock` file, replacing the JSON atomically (temp file
//! + rename). A [`DirCacheStorage`] treats each subdirectory of its root as
//! one named HTTP cache.

use super::{CacheStorage, KeyValueStore};
use crate::error::{FreshenError, FreshenResult};
use async_trait::async_trait;
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type Entries = BTreeMap<String, String>;

/// Held for the duration of one mutation
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release store lock: {}", e);
        }
    }
}

/// Key-value area persisted as a JSON file
#[derive(Debug)]
pub struct FileStore {
    area: String,
    path: PathBuf,
}

impl FileStore {
    /// Open (or lazily create) the area stored at `path`
    ///
    /// An existing file is validated up front so a corrupt store fails at
    /// open rather than on first use.
    pub fn open(area: impl Into<String>, path: impl Into<PathBuf>) -> FreshenResult<Self> {
        let store = Self {
            area: area.into(),
            path: path.into(),
        };
        let entries = store.load()?;
        debug!("Opened {} store with {} keys", store.area, entries.len());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn load(&self) -> FreshenResult<Entries> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => {
                return Err(FreshenError::io(
                    format!("reading {} store {}", self.area, self.path.display()),
                    e,
                ))
            }
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| FreshenError::storage(&self.area, format!("corrupt store: {}", e)))
    }

    fn lock(&self) -> FreshenResult<StoreLock> {
        self.ensure_parent()?;
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| FreshenError::io(format!("opening {}", lock_path.display()), e))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| FreshenError::io(format!("locking {}", lock_path.display()), e))?;
        Ok(StoreLock { file })
    }

    /// Apply `f` to the current on-disk entries and write the result back
    ///
    /// The file is only replaced when `f` changed something; a failed write
    /// leaves the previous contents in place.
    fn mutate<R>(&self, f: impl FnOnce(&mut Entries) -> R) -> FreshenResult<R> {
        let _lock = self.lock()?;
        let current = self.load()?;
        let mut next = current.clone();
        let result = f(&mut next);
        if next != current {
            self.persist(&next)?;
        }
        Ok(result)
    }

    fn ensure_parent(&self) -> FreshenResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|e| FreshenError::io(format!("creating {}", parent.display()), e)),
            _ => Ok(()),
        }
    }

    fn persist(&self, entries: &Entries) -> FreshenResult<()> {
        let content = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| FreshenError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| FreshenError::io(format!("replacing {}", self.path.display()), e))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> FreshenResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> FreshenResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> FreshenResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn keys(&self) -> FreshenResult<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    fn clear(&self) -> FreshenResult<()> {
        self.mutate(|entries| entries.clear())
    }
}

/// HTTP cache storage where each subdirectory is one named cache
#[derive(Debug, Clone)]
pub struct DirCacheStorage {
    root: PathBuf,
}

impl DirCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl CacheStorage for DirCacheStorage {
    async fn names(&self) -> FreshenResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| FreshenError::io("reading cache storage directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FreshenError::io("reading cache storage entry", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> FreshenResult<bool> {
        // Names come from `names()`; refuse anything that escapes the root
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(FreshenError::storage("cache", format!("invalid cache name {:?}", name)));
        }

        let path = self.root.join(name);
        if !path.exists() {
            return Ok(false);
        }

        tokio::fs::remove_dir_all(&path)
            .await
            .map_err(|e| FreshenError::io(format!("deleting cache {}", path.display()), e))?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.json");

        let store = FileStore::open("local", &path).unwrap();
        store.set("token", "abc").unwrap();
        store.set("app_version_ack", "1000").unwrap();
        drop(store);

        let reopened = FileStore::open("local", &path).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.keys().unwrap(), vec!["app_version_ack", "token"]);
    }

    #[test]
    fn file_store_clear_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::open("session", &path).unwrap();
        store.set("draft", "x").unwrap();
        store.clear().unwrap();

        let reopened = FileStore::open("session", &path).unwrap();
        assert!(reopened.keys().unwrap().is_empty());
    }

    #[test]
    fn second_handle_sees_clear_and_does_not_restore_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.json");

        let watcher = FileStore::open("local", &path).unwrap();
        watcher.set("token", "jwt").unwrap();

        let purger = FileStore::open("local", &path).unwrap();
        purger.clear().unwrap();
        assert!(watcher.get("token").unwrap().is_none());

        watcher.set("app_version_ack", "2000").unwrap();

        let on_disk = FileStore::open("local", &path).unwrap();
        assert_eq!(on_disk.keys().unwrap(), vec!["app_version_ack"]);
    }

    #[test]
    fn failed_write_keeps_previous_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.json");

        let store = FileStore::open("local", &path).unwrap();
        store.set("token", "jwt").unwrap();

        // A directory where the temp file goes makes the write fail
        fs::create_dir_all(path.with_extension("json.tmp")).unwrap();
        assert!(store.clear().is_err());
        assert_eq!(store.keys().unwrap(), vec!["token"]);
        assert_eq!(store.get("token").unwrap().as_deref(), Some("jwt"));
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "not json").unwrap();

        let err = FileStore::open("local", &path).unwrap_err();
        assert!(matches!(err, FreshenError::Storage { .. }));
    }

    #[tokio::test]
    async fn dir_cache_storage_lists_and_deletes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("precache-v1")).unwrap();
        fs::create_dir_all(dir.path().join("api")).unwrap();
        fs::write(dir.path().join("api/entry"), "cached").unwrap();
        fs::write(dir.path().join("stray-file"), "").unwrap();

        let caches = DirCacheStorage::new(dir.path());
        assert_eq!(caches.names().await.unwrap(), vec!["api", "precache-v1"]);
        assert!(caches.delete("api").await.unwrap());
        assert!(!caches.delete("api").await.unwrap());
        assert_eq!(caches.names().await.unwrap(), vec!["precache-v1"]);
    }

    #[tokio::test]
    async fn dir_cache_storage_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let caches = DirCacheStorage::new(dir.path());
        assert!(caches.delete("../etc").await.is_err());
    }

    #[tokio::test]
    async fn missing_root_has_no_caches() {
        let dir = TempDir::new().unwrap();
        let caches = DirCacheStorage::new(dir.path().join("nope"));
        assert!(caches.names().await.unwrap().is_empty());
    }
}
