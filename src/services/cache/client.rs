//! Key/value store behind the revocation denylist.
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Store failures. The denylist turns them into a revocation failure, so a
/// broken store rejects requests instead of letting revoked tokens in.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("{backend}: connection failed: {message}")]
    Connection {
        backend: &'static str,
        message: String,
    },
    #[error("{backend}: {command} failed: {message}")]
    Command {
        backend: &'static str,
        command: &'static str,
        message: String,
    },
}

/// String keys, string values, every entry with a TTL.
///
/// Clones share the same store.
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    fn backend_name(&self) -> &'static str;

    /// Live (not yet expired) entry present.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// `false` when a live entry already holds the key; it is left untouched.
    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// `true` when an entry was removed.
    async fn remove(&self, key: &str) -> CacheResult<bool>;
}
