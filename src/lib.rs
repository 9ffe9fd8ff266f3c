// redis-session - server-side web sessions stored in Redis
//
// The session cookie carries only an id; attributes live in Redis under
// `key_prefix ++ id`. Host frameworks plug in through the `SessionStore`
// trait.

// Re-export the store
pub use redis_session_store::*;

// Re-export the key-value layer
pub use redis_session_client as client;
pub use redis_session_client::{KeyValueClient, MemoryClient, RedisClient, RedisConfig};

// Prelude for common imports
pub mod prelude {
    pub use redis_session_store::prelude::*;
}
