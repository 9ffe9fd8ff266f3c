//! Key-value client trait definition.

use crate::error::{ClientError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Remote associative store used for session records.
///
/// Keys are passed fully built; implementations apply no prefixing.
#[async_trait]
pub trait KeyValueClient: Send + Sync {
    /// Get the raw bytes stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or has expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key` as one atomic batch.
    ///
    /// With `expire_after` the record expires after that many seconds.
    /// Without it the record keeps whatever TTL it already had.
    async fn set(&self, key: &str, value: Vec<u8>, expire_after: Option<Duration>) -> Result<()>;

    /// Delete `key`. Returns `true` if a record was removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remaining time-to-live of `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or has no expiration.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Longest expiry Redis accepts, in seconds.
///
/// Redis keeps expiry as a millisecond timestamp in an `i64`.
pub const MAX_EXPIRY_SECS: u64 = i64::MAX as u64 / 1000;

/// Whole seconds for an EXPIRE, rounding sub-second durations up.
///
/// EXPIRE with zero deletes the key, so the minimum is one second. Expiries
/// above [`MAX_EXPIRY_SECS`] fail with [`ClientError::Config`].
pub fn expiry_seconds(ttl: Duration) -> Result<i64> {
    let secs = if ttl.subsec_nanos() > 0 {
        ttl.as_secs().saturating_add(1)
    } else {
        ttl.as_secs()
    };
    if secs > MAX_EXPIRY_SECS {
        return Err(ClientError::Config(format!(
            "expiry of {} seconds exceeds the maximum of {}",
            secs, MAX_EXPIRY_SECS
        )));
    }
    Ok(secs.max(1) as i64)
}
