//! Client storage areas
//!
//! Models the client-held state a purge has to clear:
//!
//! | Area | Trait | Lifetime |
//! |------|-------|----------|
//! | local | [`KeyValueStore`] | durable |
//! | session | [`KeyValueStore`] | per session |
//! | HTTP cache | [`CacheStorage`] | durable, optional |
//!
//! Key-value areas are synchronous like their browser counterparts; cache
//! storage enumeration and deletion are async.

pub mod file;
pub mod memory;
pub mod profile;

pub use file::{DirCacheStorage, FileStore};
pub use memory::{MemoryCacheStorage, MemoryStore};
pub use profile::ClientProfile;

use crate::error::FreshenResult;
use async_trait::async_trait;

/// Auth token key
pub const TOKEN_KEY: &str = "token";
/// Cached user object key
pub const USER_INFO_KEY: &str = "userInfo";
/// Cached role list key
pub const ROLES_KEY: &str = "roles";
/// Last acknowledged build version key
pub const ACK_KEY: &str = "app_version_ack";

/// Keys holding authentication state
pub const AUTH_KEYS: &[&str] = &[TOKEN_KEY, USER_INFO_KEY, ROLES_KEY];

/// String key-value storage area (local or session storage)
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> FreshenResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> FreshenResult<()>;

    fn remove(&self, key: &str) -> FreshenResult<()>;

    fn keys(&self) -> FreshenResult<Vec<String>>;

    fn clear(&self) -> FreshenResult<()>;
}

/// Named HTTP response caches
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of all caches
    async fn names(&self) -> FreshenResult<Vec<String>>;

    /// Delete one cache, returning whether it existed
    async fn delete(&self, name: &str) -> FreshenResult<bool>;
}
