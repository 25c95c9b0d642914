use async_trait::async_trait;
use std::time::Duration;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};
use crate::services::cache::{MemoryCache, ValkeyClient};

/// Store picked at start-up: Valkey when a URL is configured, otherwise
/// process memory.
#[derive(Clone, Debug)]
pub enum CacheBackend {
    Valkey(ValkeyClient),
    Memory(MemoryCache),
}

impl CacheBackend {
    pub async fn from_url(url: Option<&str>) -> Result<Self, CacheError> {
        match url {
            Some(url) => Ok(Self::Valkey(ValkeyClient::new(url).await?)),
            None => Ok(Self::Memory(MemoryCache::new())),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Valkey(_))
    }
}

#[async_trait]
impl CacheClient for CacheBackend {
    fn backend_name(&self) -> &'static str {
        match self {
            Self::Valkey(c) => c.backend_name(),
            Self::Memory(c) => c.backend_name(),
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        match self {
            Self::Valkey(c) => c.exists(key).await,
            Self::Memory(c) => c.exists(key).await,
        }
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        match self {
            Self::Valkey(c) => c.get(key).await,
            Self::Memory(c) => c.get(key).await,
        }
    }

    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        match self {
            Self::Valkey(c) => c.insert_if_absent(key, value, ttl).await,
            Self::Memory(c) => c.insert_if_absent(key, value, ttl).await,
        }
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        match self {
            Self::Valkey(c) => c.remove(key).await,
            Self::Memory(c) => c.remove(key).await,
        }
    }
}
