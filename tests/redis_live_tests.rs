//! Live Redis Tests
//!
//! Run against a disposable Redis on the configured host with
//! `cargo test -- --ignored`. Every key they write is prefixed and removed.

use redis::AsyncCommands;
use redis_snapshot::{
    snapshot::EngineOptions, source::RedisSource, Config, KeyKind, SnapshotEngine,
};

const PREFIX: &str = "redis_snapshot_test:";

async fn seed(config: &Config) -> redis::aio::MultiplexedConnection {
    let url = format!("redis://{}:{}/{}", config.redis_host, config.redis_port, config.redis_db);
    let client = redis::Client::open(url).unwrap();
    let mut conn = client.get_multiplexed_tokio_connection().await.unwrap();

    let _: () = conn.set(format!("{}string", PREFIX), "hello").await.unwrap();
    let _: () = conn
        .rpush(format!("{}list", PREFIX), &["x", "y", "z"][..])
        .await
        .unwrap();
    let _: () = conn
        .sadd(format!("{}set", PREFIX), &["b", "a"][..])
        .await
        .unwrap();
    let _: () = conn
        .zadd_multiple(format!("{}zset", PREFIX), &[(2, "second"), (1, "first")])
        .await
        .unwrap();
    let _: () = conn
        .hset_multiple(format!("{}hash", PREFIX), &[("k", "v"), ("a", "b")])
        .await
        .unwrap();
    conn
}

async fn cleanup(conn: &mut redis::aio::MultiplexedConnection) {
    for suffix in ["string", "list", "set", "zset", "hash"] {
        let _: () = conn.del(format!("{}{}", PREFIX, suffix)).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_snapshot_against_live_redis() {
    let config = Config::from_env();
    let mut conn = seed(&config).await;

    let source = RedisSource::from_config(&config).unwrap();
    let engine = SnapshotEngine::new(source, EngineOptions::default());
    let snapshot = engine.take_snapshot().await;
    cleanup(&mut conn).await;

    let snapshot = snapshot.unwrap();
    let entry = |suffix: &str| snapshot.get(&format!("{}{}", PREFIX, suffix)).unwrap().clone();

    assert_eq!(entry("string").kind, KeyKind::String);
    assert_eq!(entry("string").display, "hello");
    assert_eq!(entry("list").display, "[x, y, z]");
    assert_eq!(entry("set").display, "[a, b]");
    assert_eq!(entry("zset").kind, KeyKind::SortedSet);
    assert_eq!(entry("zset").display, "[first, second]");
    assert_eq!(entry("hash").display, "{a: b, k: v}");
}
