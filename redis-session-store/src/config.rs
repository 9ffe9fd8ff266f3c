//! Session configuration.
//!
//! [`SessionOptions`] is what the host supplies: every field optional, with
//! the legacy `expires` alias still accepted. [`SessionConfig`] is the merged,
//! validated result and cannot change once built.

use crate::codec::SerializerKind;
use crate::error::{SessionError, SessionResult};
use redis_session_client::{MAX_EXPIRY_SECS, RedisConfig};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Default cookie name carrying the session id.
pub const DEFAULT_KEY: &str = "rack.session";

/// Default logical namespace.
pub const DEFAULT_NAMESPACE: &str = "rack:session";

/// Raw session options, as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Cookie field name
    pub key: Option<String>,
    /// Cookie signing secret, passed through to the host
    pub secret: Option<String>,
    /// Redis host
    pub host: Option<String>,
    /// Redis port
    pub port: Option<i64>,
    /// Redis database index
    pub db: Option<i64>,
    /// Redis ACL username
    pub username: Option<String>,
    /// Redis password
    pub password: Option<String>,
    /// Connect with TLS
    pub tls: Option<bool>,
    /// Prepended verbatim to every session id to form the storage key
    pub key_prefix: Option<String>,
    /// Logical grouping label
    pub namespace: Option<String>,
    /// Session expiry in seconds
    pub expire_after: Option<u64>,
    /// Legacy spelling of `expire_after`
    pub expires: Option<u64>,
    /// Connect timeout, in (fractional) seconds when deserialized
    #[serde(with = "optional_seconds")]
    pub connection_timeout: Option<Duration>,
    /// Command timeout, in (fractional) seconds when deserialized
    #[serde(with = "optional_seconds")]
    pub command_timeout: Option<Duration>,
    /// Attribute encoding
    pub serializer: Option<SerializerKind>,
}

impl SessionOptions {
    /// Empty options; every field falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from the process environment.
    ///
    /// Recognized variables: `SESSION_KEY`, `SESSION_SECRET`,
    /// `SESSION_NAMESPACE`, `SESSION_KEY_PREFIX`, `SESSION_EXPIRE_AFTER`,
    /// `SESSION_EXPIRES`, `SESSION_SERIALIZER`, `REDIS_HOST`, `REDIS_PORT`,
    /// `REDIS_DB`, `REDIS_USERNAME`, `REDIS_PASSWORD`, `REDIS_TLS`.
    pub fn from_env() -> SessionResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read options through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> SessionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |name: &str| -> SessionResult<Option<i64>> { parse_var(&lookup, name) };
        let seconds = |name: &str| -> SessionResult<Option<u64>> { parse_var(&lookup, name) };

        let serializer = match lookup("SESSION_SERIALIZER") {
            Some(raw) => Some(match raw.trim().to_lowercase().as_str() {
                "binary" => SerializerKind::Binary,
                "json" => SerializerKind::Json,
                other => {
                    return Err(SessionError::ConnectionConfig(format!(
                        "SESSION_SERIALIZER: unknown serializer '{}'",
                        other
                    )));
                }
            }),
            None => None,
        };

        Ok(Self {
            key: lookup("SESSION_KEY"),
            secret: lookup("SESSION_SECRET"),
            host: lookup("REDIS_HOST"),
            port: number("REDIS_PORT")?,
            db: number("REDIS_DB")?,
            username: lookup("REDIS_USERNAME"),
            password: lookup("REDIS_PASSWORD"),
            tls: lookup("REDIS_TLS").map(|raw| parse_flag("REDIS_TLS", &raw)).transpose()?,
            key_prefix: lookup("SESSION_KEY_PREFIX"),
            namespace: lookup("SESSION_NAMESPACE"),
            expire_after: seconds("SESSION_EXPIRE_AFTER")?,
            expires: seconds("SESSION_EXPIRES")?,
            connection_timeout: None,
            command_timeout: None,
            serializer,
        })
    }

    /// Set the cookie field name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the cookie signing secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the Redis host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the Redis port.
    pub fn port(mut self, port: i64) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the Redis database index.
    pub fn db(mut self, db: i64) -> Self {
        self.db = Some(db);
        self
    }

    /// Set Redis ACL credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the Redis password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enable TLS.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.tls = Some(enabled);
        self
    }

    /// Set the storage key prefix.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set the namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the expiry in seconds.
    pub fn expire_after(mut self, seconds: u64) -> Self {
        self.expire_after = Some(seconds);
        self
    }

    /// Set the expiry through the legacy `expires` option.
    pub fn expires(mut self, seconds: u64) -> Self {
        self.expires = Some(seconds);
        self
    }

    /// Set the connect timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Set the command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Select the attribute encoding.
    pub fn serializer(mut self, kind: SerializerKind) -> Self {
        self.serializer = Some(kind);
        self
    }
}

fn parse_flag(name: &str, raw: &str) -> SessionResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SessionError::ConnectionConfig(format!(
            "{}: expected a boolean, got '{}'",
            name, other
        ))),
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> SessionResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            SessionError::ConnectionConfig(format!("{}: cannot parse '{}': {}", name, raw, e))
        }),
        None => Ok(None),
    }
}

/// Merged, validated session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    key: String,
    secret: Option<String>,
    namespace: String,
    key_prefix: String,
    expire_after: Option<Duration>,
    serializer: SerializerKind,
    redis: RedisConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            secret: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            key_prefix: String::new(),
            expire_after: None,
            serializer: SerializerKind::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Merge `options` over the defaults and validate the result.
    ///
    /// `expires` is used only when `expire_after` is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use redis_session_store::{SessionConfig, SessionOptions};
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::from_options(
    ///     SessionOptions::new().key_prefix("myapp-").expires(30),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(config.storage_key("abc"), "myapp-abc");
    /// assert_eq!(config.expire_after(), Some(Duration::from_secs(30)));
    /// ```
    pub fn from_options(options: SessionOptions) -> SessionResult<Self> {
        let defaults = Self::default();

        let port = match options.port {
            Some(port) => u16::try_from(port)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| {
                    SessionError::ConnectionConfig(format!(
                        "port must be between 1 and 65535, got {}",
                        port
                    ))
                })?,
            None => defaults.redis.port,
        };

        let expire_after = match options.expire_after.or(options.expires) {
            Some(0) => {
                return Err(SessionError::ConnectionConfig(
                    "expire_after must be at least one second".to_string(),
                ));
            }
            Some(seconds) if seconds > MAX_EXPIRY_SECS => {
                return Err(SessionError::ConnectionConfig(format!(
                    "expire_after must be at most {} seconds, got {}",
                    MAX_EXPIRY_SECS, seconds
                )));
            }
            Some(seconds) => Some(Duration::from_secs(seconds)),
            None => None,
        };

        let mut redis = defaults.redis;
        redis.host = options.host.unwrap_or(redis.host);
        redis.port = port;
        redis.database = options.db.unwrap_or(redis.database);
        redis.username = options.username;
        redis.password = options.password;
        redis.tls = options.tls.unwrap_or(redis.tls);
        redis.connection_timeout = options
            .connection_timeout
            .unwrap_or(redis.connection_timeout);
        redis.command_timeout = options.command_timeout.unwrap_or(redis.command_timeout);
        redis.validate()?;

        Ok(Self {
            key: options.key.unwrap_or(defaults.key),
            secret: options.secret,
            namespace: options.namespace.unwrap_or(defaults.namespace),
            key_prefix: options.key_prefix.unwrap_or(defaults.key_prefix),
            expire_after,
            serializer: options.serializer.unwrap_or(defaults.serializer),
            redis,
        })
    }

    /// Build the configuration from the process environment.
    pub fn from_env() -> SessionResult<Self> {
        Self::from_options(SessionOptions::from_env()?)
    }

    /// Cookie field name carrying the session id.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cookie signing secret, if any. Not used by the store itself.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Logical namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Storage key prefix.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Default expiry applied to every write.
    pub fn expire_after(&self) -> Option<Duration> {
        self.expire_after
    }

    /// Attribute encoding.
    pub fn serializer(&self) -> SerializerKind {
        self.serializer
    }

    /// Connection settings for the key-value store.
    pub fn redis(&self) -> &RedisConfig {
        &self.redis
    }

    /// Build the storage key for a session id.
    pub fn storage_key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}

mod optional_seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
