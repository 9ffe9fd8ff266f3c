//! Redis connection configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::{Host, Url};

use crate::{ClientError, Result};

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database index selected after connecting.
    #[serde(default)]
    pub database: i64,
    /// Username for Redis 6+ ACL.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// Use TLS (`rediss://`).
    #[serde(default)]
    pub tls: bool,
    /// Upper bound for establishing the connection.
    #[serde(with = "humantime_serde", default = "default_connection_timeout")]
    pub connection_timeout: Duration,
    /// Upper bound for a single command or batch.
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub command_timeout: Duration,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: 0,
            username: None,
            password: None,
            tls: false,
            connection_timeout: default_connection_timeout(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl RedisConfig {
    /// Create a configuration for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Create a builder.
    pub fn builder() -> RedisConfigBuilder {
        RedisConfigBuilder::new()
    }

    /// Check host, port, database and timeouts for malformed values.
    pub fn validate(&self) -> Result<()> {
        Host::parse(&self.host)
            .map_err(|e| ClientError::Config(format!("invalid host '{}': {}", self.host, e)))?;

        if self.port == 0 {
            return Err(ClientError::Config("port must be between 1 and 65535".to_string()));
        }

        if self.database < 0 {
            return Err(ClientError::Config(format!(
                "database index must not be negative, got {}",
                self.database
            )));
        }

        if self.connection_timeout.is_zero() {
            return Err(ClientError::Config(
                "connection timeout must be greater than zero".to_string(),
            ));
        }

        if self.command_timeout.is_zero() {
            return Err(ClientError::Config(
                "command timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full Redis URL with auth and database.
    ///
    /// Credentials are percent-encoded.
    pub fn connection_url(&self) -> Result<String> {
        self.validate()?;

        let scheme = if self.tls { "rediss" } else { "redis" };
        let host = Host::parse(&self.host)
            .map_err(|e| ClientError::Config(format!("invalid host '{}': {}", self.host, e)))?;

        let mut url = Url::parse(&format!(
            "{}://{}:{}/{}",
            scheme, host, self.port, self.database
        ))
        .map_err(|e| ClientError::Config(e.to_string()))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| ClientError::Config("username cannot be set on this URL".to_string()))?;
        }

        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| ClientError::Config("password cannot be set on this URL".to_string()))?;
        }

        Ok(url.into())
    }

    /// Connection URL with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        format!("{}://{}:{}/{}", scheme, self.host, self.port, self.database)
    }
}

/// Builder for Redis configuration.
#[derive(Default)]
pub struct RedisConfigBuilder {
    config: RedisConfig,
}

impl RedisConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: RedisConfig::default(),
        }
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the database number.
    pub fn database(mut self, db: i64) -> Self {
        self.config.database = db;
        self
    }

    /// Set the username (Redis 6+ ACL).
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Enable TLS.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.config.tls = enabled;
        self
    }

    /// Set the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Set the command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RedisConfig {
        self.config
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
