//! Lazily established, shared Redis connection.

use redis::Client;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{ClientError, RedisConfig, Result};

/// A Redis connection opened on first use.
///
/// Construction only parses the URL. The first caller of [`get`](Self::get)
/// connects; later callers receive clones of the same multiplexed
/// [`ConnectionManager`]. A failed connect leaves the cell empty so the next
/// call tries again.
pub struct LazyConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    connect_timeout: Duration,
    url: String,
}

impl LazyConnection {
    /// Prepare a connection for the given configuration without connecting.
    pub fn open(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.connection_url()?.as_str())
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            manager: OnceCell::new(),
            connect_timeout: config.connection_timeout,
            url: config.redacted_url(),
        })
    }

    /// Whether a connection has been established.
    pub fn is_connected(&self) -> bool {
        self.manager.initialized()
    }

    /// Get a handle to the shared connection, connecting if needed.
    pub async fn get(&self) -> Result<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let connect = ConnectionManager::new(self.client.clone());
                match tokio::time::timeout(self.connect_timeout, connect).await {
                    Ok(Ok(manager)) => {
                        info!(url = %self.url, "Redis connection established");
                        Ok(manager)
                    }
                    Ok(Err(e)) => {
                        warn!(url = %self.url, error = %e, "Redis connection failed");
                        Err(ClientError::Connection(e.to_string()))
                    }
                    Err(_) => {
                        warn!(
                            url = %self.url,
                            timeout_ms = self.connect_timeout.as_millis() as u64,
                            "Redis connection timed out"
                        );
                        Err(ClientError::Timeout(self.connect_timeout))
                    }
                }
            })
            .await?;

        Ok(manager.clone())
    }
}
