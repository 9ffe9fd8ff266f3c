//! Server-side session storage in Redis.
//!
//! Session attributes live in Redis under `key_prefix ++ session_id`
//! instead of in a signed cookie. The cookie only carries the id; the host
//! framework owns cookie parsing, signing and the request cycle and calls
//! into a [`SessionStore`].
//!
//! # Operations
//!
//! - **load**: missing id ⇒ a freshly generated one; missing record ⇒ empty
//!   attributes; undecodable record ⇒ [`SessionError::Deserialization`]
//! - **save**: SET and EXPIRE in one atomic batch; returns the id
//! - **destroy**: DEL, idempotent
//!
//! # Configuration
//!
//! | option | default |
//! |---|---|
//! | `key` | `rack.session` |
//! | `namespace` | `rack:session` |
//! | `host` | `localhost` |
//! | `port` | `6379` |
//! | `db` | `0` |
//! | `key_prefix` | empty |
//! | `expire_after` (legacy `expires`) | none |
//!
//! # Examples
//!
//! ```no_run
//! use redis_session_store::*;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SessionError> {
//!     let store = RedisSessionStore::from_options(
//!         SessionOptions::new()
//!             .host("localhost")
//!             .key_prefix("myapp-")
//!             .expire_after(3600),
//!     )?;
//!
//!     // A request without a session cookie
//!     let request: HashMap<String, String> = HashMap::new();
//!     let (sid, mut session) = store.get_session(&request, None).await?;
//!
//!     session.set("user_id", 123)?;
//!     store
//!         .set_session(&request, &sid, &session, &WriteOptions::new())
//!         .await?;
//!
//!     // Logout: the host passes the request carrying the session cookie
//!     let request = HashMap::from([("rack.session".to_string(), sid)]);
//!     store.destroy_session(&request).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod redis_session;
pub mod traits;

pub use codec::{BinaryCodec, JsonCodec, SerializerKind, SessionSerializer};
pub use config::{SessionConfig, SessionOptions};
pub use error::{SessionError, SessionResult};
pub use redis_session::RedisSessionStore;
pub use traits::{
    RandomIdGenerator, RequestContext, SessionAttributes, SessionIdGenerator, SessionStore,
    WriteOptions, generate_session_id,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::codec::{SerializerKind, SessionSerializer};
    pub use crate::config::{SessionConfig, SessionOptions};
    pub use crate::error::{SessionError, SessionResult};
    pub use crate::redis_session::RedisSessionStore;
    pub use crate::traits::{
        RequestContext, SessionAttributes, SessionIdGenerator, SessionStore, WriteOptions,
        generate_session_id,
    };
    pub use redis_session_client::{KeyValueClient, MemoryClient, RedisClient};
}
