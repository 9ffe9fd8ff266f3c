//! # redis-session-client
//!
//! The key-value layer underneath `redis-session-store`.
//!
//! ## Features
//!
//! - **Lazy connection**: constructing a client never touches the network;
//!   the first command connects
//! - **Atomic writes**: SET and EXPIRE travel in one MULTI/EXEC batch
//! - **Bounded calls**: connect and command timeouts surface as errors
//!   instead of hanging
//! - **In-memory client**: same TTL semantics, for tests and Redis-less hosts
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redis_session_client::{KeyValueClient, RedisClient, RedisConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> redis_session_client::Result<()> {
//! let config = RedisConfig::builder()
//!     .host("localhost")
//!     .port(6379)
//!     .database(0)
//!     .build();
//!
//! let client = RedisClient::new(config)?;
//!
//! client
//!     .set("session:abc", b"payload".to_vec(), Some(Duration::from_secs(60)))
//!     .await?;
//! let value = client.get("session:abc").await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod connection;
mod error;
mod memory;
mod redis_client;
mod traits;

pub use config::{RedisConfig, RedisConfigBuilder};
pub use connection::LazyConnection;
pub use error::{ClientError, Result};
pub use memory::MemoryClient;
pub use redis_client::RedisClient;
pub use traits::{KeyValueClient, MAX_EXPIRY_SECS, expiry_seconds};

// Re-export redis crate for convenience
pub use redis;

/// Prelude for common imports.
///
/// ```
/// use redis_session_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{RedisConfig, RedisConfigBuilder};
    pub use crate::error::{ClientError, Result};
    pub use crate::memory::MemoryClient;
    pub use crate::redis_client::RedisClient;
    pub use crate::traits::KeyValueClient;
}
