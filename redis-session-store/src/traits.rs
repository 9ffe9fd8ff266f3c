//! Session store trait definition and the types that cross it.

use crate::error::{SessionError, SessionResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map;
use std::time::Duration;

/// Attributes of one session.
///
/// A mapping from attribute name to any JSON-representable value. Order is
/// not preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionAttributes(HashMap<String, Value>);

impl SessionAttributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value, deserialized into `T`.
    ///
    /// Returns `None` if the attribute is missing or has a different shape.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get the raw JSON value of an attribute.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a value.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> SessionResult<()> {
        let json_value =
            serde_json::to_value(value).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.0.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Insert a raw JSON value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove an attribute.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Check if an attribute exists.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Get all attribute names.
    pub fn keys(&self) -> Vec<&String> {
        self.0.keys().collect()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove every attribute.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterate over attributes.
    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl From<HashMap<String, Value>> for SessionAttributes {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for SessionAttributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for SessionAttributes {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SessionAttributes {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-write options supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Expiry for this write; falls back to the configured default.
    pub expire_after: Option<Duration>,
}

impl WriteOptions {
    /// Options with no per-write override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the expiry for this write.
    pub fn with_expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = Some(ttl);
        self
    }
}

/// The slice of an incoming request the store needs.
///
/// Only used to find the session cookie when destroying a session.
pub trait RequestContext: Send + Sync {
    /// Value of the named cookie, if the request carries it.
    fn cookie(&self, name: &str) -> Option<String>;
}

impl RequestContext for HashMap<String, String> {
    fn cookie(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Produces identifiers for new sessions.
///
/// Identifiers must be unguessable; they are the only credential the
/// client presents.
pub trait SessionIdGenerator: Send + Sync {
    /// Generate a fresh identifier.
    fn generate(&self) -> String;
}

/// 32 lowercase hex characters from a random (v4) UUID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl SessionIdGenerator for RandomIdGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Generate a new unique session ID.
pub fn generate_session_id() -> String {
    RandomIdGenerator.generate()
}

/// Session store contract invoked by the host framework's session
/// middleware.
///
/// The host owns cookies, signing and the request cycle; the store only
/// moves attributes in and out of the backend.
///
/// # Examples
///
/// ```ignore
/// use redis_session_store::{SessionStore, SessionResult, WriteOptions};
///
/// async fn handle(store: &impl SessionStore, ctx: &dyn RequestContext) -> SessionResult<()> {
///     let (sid, mut attributes) = store.get_session(ctx, ctx.cookie("rack.session").as_deref()).await?;
///     attributes.set("visits", attributes.get::<u32>("visits").unwrap_or(0) + 1)?;
///     store.set_session(ctx, &sid, &attributes, &WriteOptions::new()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session for `sid`.
    ///
    /// With no `sid` a new identifier is generated. A session that was
    /// never written, or has expired, comes back empty.
    async fn get_session(
        &self,
        ctx: &dyn RequestContext,
        sid: Option<&str>,
    ) -> SessionResult<(String, SessionAttributes)>;

    /// Persist `attributes` under `sid` and return the `sid`.
    async fn set_session(
        &self,
        ctx: &dyn RequestContext,
        sid: &str,
        attributes: &SessionAttributes,
        options: &WriteOptions,
    ) -> SessionResult<String>;

    /// Delete the session named by the request's session cookie.
    async fn destroy_session(&self, ctx: &dyn RequestContext) -> SessionResult<()>;
}
