//! Redis session storage implementation.

use crate::codec::SessionSerializer;
use crate::config::{SessionConfig, SessionOptions};
use crate::error::{SessionError, SessionResult};
use crate::traits::{
    RandomIdGenerator, RequestContext, SessionAttributes, SessionIdGenerator, SessionStore,
    WriteOptions,
};
use async_trait::async_trait;
use redis_session_client::{ClientError, KeyValueClient, RedisClient, expiry_seconds};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session store keeping one record per session in Redis.
///
/// The record lives under `key_prefix ++ sid`, holds the encoded
/// attributes, and carries a TTL when an expiry is configured or passed
/// with the write.
///
/// Generic over the [`KeyValueClient`] so the same store runs against
/// [`MemoryClient`](redis_session_client::MemoryClient) in tests.
///
/// # Examples
///
/// ```no_run
/// use redis_session_store::{RedisSessionStore, SessionOptions, SessionAttributes, WriteOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RedisSessionStore::from_options(
///         SessionOptions::new().key_prefix("myapp-").expire_after(3600),
///     )?;
///
///     let (sid, mut attributes) = store.load_session(None).await?;
///     attributes.set("user_id", 123)?;
///     store.save_session(&sid, &attributes, &WriteOptions::new()).await?;
///
///     Ok(())
/// }
/// ```
pub struct RedisSessionStore<C = RedisClient> {
    client: C,
    config: SessionConfig,
    serializer: Arc<dyn SessionSerializer>,
    id_generator: Arc<dyn SessionIdGenerator>,
}

impl RedisSessionStore<RedisClient> {
    /// Create a store backed by Redis.
    ///
    /// Only prepares the client; the connection is made by the first
    /// operation.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let client = RedisClient::new(config.redis().clone())?;

        info!(
            url = %config.redis().redacted_url(),
            namespace = %config.namespace(),
            key_prefix = %config.key_prefix(),
            expire_after_secs = config.expire_after().map(|ttl| ttl.as_secs()),
            "Redis session store configured"
        );

        Ok(Self::with_client(config, client))
    }

    /// Merge options over the defaults and create a store.
    pub fn from_options(options: SessionOptions) -> SessionResult<Self> {
        Self::new(SessionConfig::from_options(options)?)
    }
}

impl<C: KeyValueClient> RedisSessionStore<C> {
    /// Create a store over an existing client.
    pub fn with_client(config: SessionConfig, client: C) -> Self {
        let serializer = config.serializer().build();
        Self {
            client,
            config,
            serializer,
            id_generator: Arc::new(RandomIdGenerator),
        }
    }

    /// Replace the session id generator.
    pub fn with_id_generator(mut self, generator: impl SessionIdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    /// Replace the attribute serializer.
    pub fn with_serializer(mut self, serializer: impl SessionSerializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Load a session.
    ///
    /// Without a session id (or with an empty one) a new id is generated.
    /// A missing record yields empty attributes. A record that cannot be
    /// decoded is an error, never an empty session.
    pub async fn load_session(
        &self,
        session_id: Option<&str>,
    ) -> SessionResult<(String, SessionAttributes)> {
        let sid = match session_id {
            Some(sid) if !sid.is_empty() => sid.to_string(),
            _ => self.id_generator.generate(),
        };
        let key = self.config.storage_key(&sid);

        let data = self.client.get(&key).await.map_err(|e| self.store_error(e))?;

        let attributes = match data {
            Some(bytes) => self.serializer.decode(&bytes).map_err(|e| {
                warn!(
                    namespace = %self.config.namespace(),
                    serializer = self.serializer.name(),
                    bytes = bytes.len(),
                    error = %e,
                    "Stored session could not be decoded"
                );
                e
            })?,
            None => SessionAttributes::new(),
        };

        debug!(
            namespace = %self.config.namespace(),
            attributes = attributes.len(),
            "Session loaded"
        );

        Ok((sid, attributes))
    }

    /// Save a session and return its id.
    ///
    /// The value and its expiry are written in one atomic batch. The expiry
    /// is `options.expire_after`, else the configured default; with neither,
    /// an existing TTL on the record is left as it was.
    pub async fn save_session(
        &self,
        session_id: &str,
        attributes: &SessionAttributes,
        options: &WriteOptions,
    ) -> SessionResult<String> {
        if session_id.is_empty() {
            return Err(SessionError::InvalidSessionId(
                "session id must not be empty".to_string(),
            ));
        }

        let expire_after = options.expire_after.or(self.config.expire_after());
        if let Some(ttl) = expire_after {
            expiry_seconds(ttl).map_err(|err| match err {
                ClientError::Config(msg) => SessionError::InvalidExpiry(msg),
                other => other.into(),
            })?;
        }

        let key = self.config.storage_key(session_id);
        let bytes = self.serializer.encode(attributes)?;

        debug!(
            namespace = %self.config.namespace(),
            bytes = bytes.len(),
            expire_after_secs = expire_after.map(|ttl| ttl.as_secs()),
            "Saving session"
        );

        self.client
            .set(&key, bytes, expire_after)
            .await
            .map_err(|e| self.store_error(e))?;

        Ok(session_id.to_string())
    }

    /// Delete a session. Deleting a missing session is not an error.
    pub async fn delete_session(&self, session_id: &str) -> SessionResult<()> {
        let key = self.config.storage_key(session_id);
        let removed = self
            .client
            .delete(&key)
            .await
            .map_err(|e| self.store_error(e))?;

        debug!(namespace = %self.config.namespace(), removed, "Session deleted");
        Ok(())
    }

    /// Remaining lifetime of a session record.
    ///
    /// `None` when the session is absent or never expires.
    pub async fn session_ttl(&self, session_id: &str) -> SessionResult<Option<Duration>> {
        let key = self.config.storage_key(session_id);
        self.client.ttl(&key).await.map_err(|e| self.store_error(e))
    }

    /// Check that the backing store is reachable.
    pub async fn health_check(&self) -> SessionResult<()> {
        self.client.ping().await.map_err(|e| self.store_error(e))
    }

    fn store_error(&self, err: redis_session_client::ClientError) -> SessionError {
        if err.is_unavailable() {
            warn!(
                namespace = %self.config.namespace(),
                error = %err,
                "Session store unavailable"
            );
        }
        err.into()
    }
}

#[async_trait]
impl<C: KeyValueClient> SessionStore for RedisSessionStore<C> {
    async fn get_session(
        &self,
        _ctx: &dyn RequestContext,
        sid: Option<&str>,
    ) -> SessionResult<(String, SessionAttributes)> {
        self.load_session(sid).await
    }

    async fn set_session(
        &self,
        _ctx: &dyn RequestContext,
        sid: &str,
        attributes: &SessionAttributes,
        options: &WriteOptions,
    ) -> SessionResult<String> {
        self.save_session(sid, attributes, options).await
    }

    async fn destroy_session(&self, ctx: &dyn RequestContext) -> SessionResult<()> {
        match ctx.cookie(self.config.key()) {
            Some(sid) if !sid.is_empty() => self.delete_session(&sid).await,
            _ => {
                debug!(cookie = %self.config.key(), "No session cookie; nothing to destroy");
                Ok(())
            }
        }
    }
}
