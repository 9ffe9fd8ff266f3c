//! Error types for session operations.

use redis_session_client::ClientError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The key-value store could not be reached or timed out
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored bytes could not be decoded into session attributes
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Malformed configuration detected at construction
    #[error("Connection configuration error: {0}")]
    ConnectionConfig(String),

    /// Session attributes could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid session ID
    #[error("Invalid session ID: {0}")]
    InvalidSessionId(String),

    /// A per-write expiry outside the range the store accepts
    #[error("Invalid expiry: {0}")]
    InvalidExpiry(String),

    /// The store rejected a command
    #[error("Session store error: {0}")]
    Store(String),
}

impl SessionError {
    /// Check if the store was unreachable.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<ClientError> for SessionError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Connection(_) | ClientError::Timeout(_) => {
                Self::StoreUnavailable(err.to_string())
            }
            ClientError::Config(msg) => Self::ConnectionConfig(msg),
            ClientError::Command(msg) => Self::Store(msg),
        }
    }
}
