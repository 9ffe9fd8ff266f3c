//! Client error types.

use std::time::Duration;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Key-value client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The store could not be reached or the connection dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Connect or command exceeded its time bound.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The store answered with an error reply.
    #[error("Command error: {0}")]
    Command(String),

    /// Malformed connection configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Check if this error means the store is unavailable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

impl From<redis::RedisError> for ClientError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(ClientError::Connection("refused".into()).is_unavailable());
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_unavailable());
        assert!(!ClientError::Command("WRONGTYPE".into()).is_unavailable());
        assert!(!ClientError::Config("bad port".into()).is_unavailable());
    }

    #[test]
    fn test_redis_io_error_is_connection() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: ClientError = redis::RedisError::from(io).into();
        assert!(err.is_unavailable());
    }
}
