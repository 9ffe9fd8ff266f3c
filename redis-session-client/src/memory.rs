//! In-process implementation of [`KeyValueClient`].

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::{
    ClientError, Result,
    traits::{KeyValueClient, expiry_seconds},
};

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory key-value client with Redis-like TTL semantics.
///
/// Clones share the same keyspace. Expired records are dropped lazily when
/// touched. Time comes from [`tokio::time::Instant`], so paused test clocks
/// drive expiry.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryClient {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.len()
    }

    /// Whether the store holds no live records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn live_entry(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        if entries.get(key)?.is_expired(now) {
            entries.remove(key);
            return None;
        }
        entries.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueClient for MemoryClient {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.live_entry(key).map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Vec<u8>, expire_after: Option<Duration>) -> Result<()> {
        let ttl_secs = expire_after.map(expiry_seconds).transpose()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expires_at = match ttl_secs {
            Some(secs) => Some(
                now.checked_add(Duration::from_secs(secs as u64))
                    .ok_or_else(|| {
                        ClientError::Config(format!("expiry of {} seconds is out of range", secs))
                    })?,
            ),
            None => entries
                .get(key)
                .filter(|entry| !entry.is_expired(now))
                .and_then(|entry| entry.expires_at),
        };

        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        let removed = self.entries.lock().remove(key);
        Ok(removed.is_some_and(|entry| !entry.is_expired(now)))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = Instant::now();
        Ok(self
            .live_entry(key)
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
