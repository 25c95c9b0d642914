use async_trait::async_trait;
use redis::{FromRedisValue, aio::ConnectionManager};
use std::time::Duration;

use crate::services::cache::client::{CacheClient, CacheError, CacheResult};

const BACKEND: &str = "valkey";

/// Valkey (or Redis) store; shared by every clone through the connection manager.
#[derive(Clone)]
pub struct ValkeyClient {
    manager: ConnectionManager,
}

impl std::fmt::Debug for ValkeyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValkeyClient").finish_non_exhaustive()
    }
}

impl ValkeyClient {
    /// `url` like `redis://localhost:6379/0`
    pub async fn new(url: &str) -> Result<Self, CacheError> {
        let connection = |e: redis::RedisError| CacheError::Connection {
            backend: BACKEND,
            message: e.to_string(),
        };

        let client = redis::Client::open(url).map_err(connection)?;
        let manager = client.get_connection_manager().await.map_err(connection)?;
        Ok(Self { manager })
    }

    async fn run<T: FromRedisValue>(
        &self,
        command: &'static str,
        cmd: redis::Cmd,
    ) -> CacheResult<T> {
        let mut conn = self.manager.clone();
        cmd.query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Command {
                backend: BACKEND,
                command,
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl CacheClient for ValkeyClient {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut cmd = redis::cmd("EXISTS");
        cmd.arg(key);
        let count: u64 = self.run("EXISTS", cmd).await?;
        Ok(count > 0)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run("GET", cmd).await
    }

    async fn insert_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        // PX: a token a few hundred ms from expiry still gets a live entry.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("NX").arg("PX").arg(millis);
        // OK when stored, nil when the key exists
        let reply: Option<String> = self.run("SET", cmd).await?;
        Ok(reply.is_some())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        let removed: u64 = self.run("DEL", cmd).await?;
        Ok(removed > 0)
    }
}
