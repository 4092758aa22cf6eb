//! Persisted acknowledgment of the last accepted build

use crate::error::FreshenResult;
use crate::storage::{KeyValueStore, ACK_KEY};
use crate::version::BuildVersion;
use std::sync::Arc;
use tracing::debug;

/// Reads and writes the acknowledged version in local storage
#[derive(Clone)]
pub struct AckStore {
    store: Arc<dyn KeyValueStore>,
}

impl AckStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Acknowledged version, if any; blank values count as absent
    pub fn get(&self) -> FreshenResult<Option<BuildVersion>> {
        Ok(self
            .store
            .get(ACK_KEY)?
            .and_then(|v| BuildVersion::new(v).ok()))
    }

    pub fn set(&self, version: &BuildVersion) -> FreshenResult<()> {
        debug!("Acknowledging version {}", version);
        self.store.set(ACK_KEY, version.as_str())
    }

    pub fn clear(&self) -> FreshenResult<()> {
        self.store.remove(ACK_KEY)
    }

    /// Seed with `running` when nothing has been acknowledged yet
    ///
    /// Returns true when a value was written.
    pub fn seed(&self, running: &BuildVersion) -> FreshenResult<bool> {
        if self.get()?.is_some() {
            return Ok(false);
        }
        self.set(running)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn seed_only_when_absent() {
        let ack = AckStore::new(Arc::new(MemoryStore::new()));
        let v1 = BuildVersion::new("1000").unwrap();
        let v2 = BuildVersion::new("2000").unwrap();

        assert!(ack.seed(&v1).unwrap());
        assert!(!ack.seed(&v2).unwrap());
        assert_eq!(ack.get().unwrap(), Some(v1));
    }

    #[test]
    fn blank_value_is_absent() {
        let store = Arc::new(MemoryStore::with_entries([(ACK_KEY, "  ")]));
        let ack = AckStore::new(store);
        assert!(ack.get().unwrap().is_none());
    }
}
