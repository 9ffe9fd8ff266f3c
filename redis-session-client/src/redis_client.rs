//! Redis implementation of [`KeyValueClient`].

use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::{
    ClientError, RedisConfig, Result,
    connection::LazyConnection,
    traits::{KeyValueClient, expiry_seconds},
};

/// Redis-backed key-value client.
///
/// Cheap to share behind an `Arc`; every call clones the multiplexed
/// connection handle, so concurrent tasks need no extra locking.
pub struct RedisClient {
    config: RedisConfig,
    connection: LazyConnection,
}

impl RedisClient {
    /// Create a new client. No network I/O happens until the first command.
    pub fn new(config: RedisConfig) -> Result<Self> {
        let connection = LazyConnection::open(&config)?;
        Ok(Self { config, connection })
    }

    /// Get the configuration.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Whether the first connection has been made.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Run a command future under the configured command timeout.
    async fn bounded<T>(&self, command: impl Future<Output = RedisResult<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.command_timeout, command).await {
            Ok(result) => result.map_err(ClientError::from),
            Err(_) => Err(ClientError::Timeout(self.config.command_timeout)),
        }
    }
}

#[async_trait]
impl KeyValueClient for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.get().await?;
        let value: Option<Vec<u8>> = self.bounded(conn.get(key)).await?;
        debug!(key = %key, hit = value.is_some(), "GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, expire_after: Option<Duration>) -> Result<()> {
        // MULTI/EXEC does not roll back, so a rejected EXPIRE would leave the
        // SET applied without a TTL.
        let ttl_secs = expire_after.map(expiry_seconds).transpose()?;
        let mut conn = self.connection.get().await?;

        let mut pipe = redis::pipe();
        pipe.atomic();
        match ttl_secs {
            Some(secs) => {
                pipe.set(key, value).ignore().expire(key, secs).ignore();
            }
            None => {
                pipe.cmd("SET").arg(key).arg(value).arg("KEEPTTL").ignore();
            }
        }

        let _: () = self.bounded(pipe.query_async(&mut conn)).await?;
        debug!(
            key = %key,
            ttl_secs,
            "SET"
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.get().await?;
        let removed: u64 = self.bounded(conn.del(key)).await?;
        debug!(key = %key, removed, "DEL");
        Ok(removed > 0)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = self.connection.get().await?;
        let ttl_seconds: i64 = self.bounded(conn.ttl(key)).await?;

        match ttl_seconds {
            -2 => Ok(None), // Key doesn't exist
            -1 => Ok(None), // Key has no expiration
            seconds if seconds > 0 => Ok(Some(Duration::from_secs(seconds as u64))),
            _ => Ok(None),
        }
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.get().await?;
        let _: String = self.bounded(redis::cmd("PING").query_async(&mut conn)).await?;
        Ok(())
    }
}
