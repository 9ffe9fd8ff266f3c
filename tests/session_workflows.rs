//! Integration tests for the common session workflows.
//!
//! Everything runs against the in-memory client; the tests at the bottom
//! need a Redis server on localhost and are ignored by default.

use redis_session::prelude::*;
use redis_session::{BinaryCodec, RedisConfig};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn memory_store(options: SessionOptions) -> RedisSessionStore<MemoryClient> {
    init_tracing();
    let config = SessionConfig::from_options(options).unwrap();
    RedisSessionStore::with_client(config, MemoryClient::new())
}

fn request_with_cookie(name: &str, sid: &str) -> HashMap<String, String> {
    HashMap::from([(name.to_string(), sid.to_string())])
}

// =============================================================================
// Request Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_login_visit_logout() {
    let store = memory_store(SessionOptions::new().key_prefix("app-").expire_after(1800));
    let anonymous: HashMap<String, String> = HashMap::new();

    // First request: no cookie, new session
    let (sid, mut session) = store.get_session(&anonymous, None).await.unwrap();
    assert!(session.is_empty());

    session.set("user_id", 42).unwrap();
    session.set("roles", vec!["admin"]).unwrap();
    let sid = store
        .set_session(&anonymous, &sid, &session, &WriteOptions::new())
        .await
        .unwrap();

    // Follow-up request carries the cookie
    let request = request_with_cookie("rack.session", &sid);
    let (same_sid, loaded) = store.get_session(&request, Some(&sid)).await.unwrap();
    assert_eq!(same_sid, sid);
    assert_eq!(loaded.get::<i64>("user_id"), Some(42));
    assert_eq!(loaded.get::<Vec<String>>("roles"), Some(vec!["admin".to_string()]));

    let ttl = store.session_ttl(&sid).await.unwrap().unwrap();
    assert!(ttl > Duration::ZERO && ttl <= Duration::from_secs(1800));

    // Logout
    store.destroy_session(&request).await.unwrap();
    let (_, after_logout) = store.get_session(&request, Some(&sid)).await.unwrap();
    assert!(after_logout.is_empty());
    assert!(store.client().is_empty());
}

#[tokio::test]
async fn test_store_behind_trait_object() {
    let store: Arc<dyn SessionStore> = Arc::new(memory_store(SessionOptions::new()));
    let request: HashMap<String, String> = HashMap::new();

    let (sid, mut session) = store.get_session(&request, None).await.unwrap();
    session.set("theme", "dark").unwrap();
    store
        .set_session(&request, &sid, &session, &WriteOptions::new())
        .await
        .unwrap();

    let (_, loaded) = store.get_session(&request, Some(&sid)).await.unwrap();
    assert_eq!(loaded.get::<String>("theme"), Some("dark".to_string()));
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let store = Arc::new(memory_store(SessionOptions::new()));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let (sid, mut session) = store.load_session(None).await.unwrap();
            session.set("n", i).unwrap();
            store
                .save_session(&sid, &session, &WriteOptions::new())
                .await
                .unwrap();
            (sid, i)
        }));
    }

    let mut sids = Vec::new();
    for handle in handles {
        let (sid, i) = handle.await.unwrap();
        let (_, session) = store.load_session(Some(&sid)).await.unwrap();
        assert_eq!(session.get::<i32>("n"), Some(i));
        sids.push(sid);
    }

    sids.sort();
    sids.dedup();
    assert_eq!(sids.len(), 16);
}

// =============================================================================
// Expiry Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_session_expires_after_ttl() {
    let store = memory_store(SessionOptions::new().expires(30));
    let mut session = SessionAttributes::new();
    session.set("cart", json!([1, 2, 3])).unwrap();
    store
        .save_session("shopper", &session, &WriteOptions::new())
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(29)).await;
    let (_, still_there) = store.load_session(Some("shopper")).await.unwrap();
    assert_eq!(still_there, session);

    tokio::time::advance(Duration::from_secs(2)).await;
    let (sid, expired) = store.load_session(Some("shopper")).await.unwrap();
    assert_eq!(sid, "shopper");
    assert!(expired.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resave_with_expiry_resets_ttl() {
    let store = memory_store(SessionOptions::new().expire_after(60));
    let session = SessionAttributes::new();

    store
        .save_session("active", &session, &WriteOptions::new())
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(50)).await;
    store
        .save_session("active", &session, &WriteOptions::new())
        .await
        .unwrap();
    tokio::time::advance(Duration::from_secs(50)).await;

    assert_eq!(
        store.session_ttl("active").await.unwrap(),
        Some(Duration::from_secs(10))
    );
}

// =============================================================================
// Data Integrity Tests
// =============================================================================

#[tokio::test]
async fn test_records_use_versioned_format() {
    let store = memory_store(SessionOptions::new().key_prefix("v:"));
    let mut session = SessionAttributes::new();
    session.set("a", 1).unwrap();
    store
        .save_session("fmt", &session, &WriteOptions::new())
        .await
        .unwrap();

    let raw = store.client().get("v:fmt").await.unwrap().unwrap();
    assert_eq!(&raw[..3], b"RS\x01");
    assert_eq!(BinaryCodec.decode(&raw).unwrap(), session);
}

#[tokio::test]
async fn test_corrupt_record_surfaces_error() {
    let store = memory_store(SessionOptions::new());
    store
        .client()
        .set("broken", vec![b'R', b'S', 1, 0, 0, 0, 5], None)
        .await
        .unwrap();

    let err = store.load_session(Some("broken")).await.unwrap_err();
    assert!(matches!(err, SessionError::Deserialization(_)));
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_configuration_from_json_document() {
    let options: SessionOptions = serde_json::from_value(json!({
        "key": "_shop_session",
        "secret": "not-used-by-the-store",
        "host": "redis.internal",
        "port": 6380,
        "db": 1,
        "key_prefix": "shop:",
        "namespace": "shop:session",
        "expires": 900
    }))
    .unwrap();

    let config = SessionConfig::from_options(options).unwrap();
    assert_eq!(config.key(), "_shop_session");
    assert_eq!(config.secret(), Some("not-used-by-the-store"));
    assert_eq!(config.namespace(), "shop:session");
    assert_eq!(config.storage_key("xyz"), "shop:xyz");
    assert_eq!(config.expire_after(), Some(Duration::from_secs(900)));
    assert_eq!(
        config.redis().connection_url().unwrap(),
        "redis://redis.internal:6380/1"
    );
}

#[test]
fn test_malformed_configuration_rejected_at_construction() {
    let err = RedisSessionStore::from_options(SessionOptions::new().port(0))
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::ConnectionConfig(_)));
}

// =============================================================================
// Live Redis Tests
// =============================================================================

fn live_store(prefix: &str) -> RedisSessionStore {
    init_tracing();
    let options = SessionOptions::new()
        .host("127.0.0.1")
        .db(15)
        .key_prefix(prefix)
        .connection_timeout(Duration::from_secs(2));
    RedisSessionStore::from_options(options).unwrap()
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_round_trip_and_ttl() {
    let store = live_store("redis-session-it:");
    store.health_check().await.unwrap();

    let mut session = SessionAttributes::new();
    session.set("user_id", 7).unwrap();
    session.set("nested", json!({"a": [true, null]})).unwrap();

    let sid = generate_session_id();
    store
        .save_session(
            &sid,
            &session,
            &WriteOptions::new().with_expire_after(Duration::from_secs(30)),
        )
        .await
        .unwrap();

    let (_, loaded) = store.load_session(Some(&sid)).await.unwrap();
    assert_eq!(loaded, session);

    let ttl = store.session_ttl(&sid).await.unwrap().unwrap();
    assert!(ttl > Duration::ZERO && ttl <= Duration::from_secs(30));

    store.delete_session(&sid).await.unwrap();
    store.delete_session(&sid).await.unwrap();
    let (_, gone) = store.load_session(Some(&sid)).await.unwrap();
    assert!(gone.is_empty());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_prefix_isolation() {
    let a = live_store("redis-session-a:");
    let b = live_store("redis-session-b:");
    let sid = generate_session_id();

    let mut session = SessionAttributes::new();
    session.set("owner", "a").unwrap();
    a.save_session(&sid, &session, &WriteOptions::new())
        .await
        .unwrap();

    let (_, seen_by_b) = b.load_session(Some(&sid)).await.unwrap();
    assert!(seen_by_b.is_empty());

    a.delete_session(&sid).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_redis_is_reported() {
    let config = RedisConfig::builder()
        .host("127.0.0.1")
        .port(1)
        .connection_timeout(Duration::from_secs(2))
        .build();
    let client = RedisClient::new(config).unwrap();
    let store = RedisSessionStore::with_client(SessionConfig::default(), client);

    let err = store.load_session(Some("x")).await.unwrap_err();
    assert!(err.is_store_unavailable());
}
