//! Eviction policies exercised through the full pipeline, not just the
//! underlying store: each test drives `GET` commands through
//! [`csc::InvalidationPipeline::execute_command`] and checks which entries
//! survive once capacity is exceeded.

use crate::cache_invalidation::support::FakeConnection;
use csc::{CacheConfiguration, EvictionPolicy, InvalidationPipeline};
use std::time::Duration;

async fn get(pipeline: &InvalidationPipeline, key: &str) {
    pipeline.execute_command("GET", &[key.as_bytes().to_vec()]).await.unwrap();
}

#[tokio::test]
async fn lru_evicts_least_recently_used() {
    let conn = FakeConnection::new();
    conn.set("a", "1");
    conn.set("b", "2");
    conn.set("c", "3");

    let config = CacheConfiguration::builder()
        .max_size(2)
        .eviction_policy(EvictionPolicy::Lru)
        .build()
        .unwrap();
    let pipeline = InvalidationPipeline::builder(conn.clone(), config).build();
    pipeline.start().await.unwrap();

    get(&pipeline, "a").await;
    get(&pipeline, "b").await;
    get(&pipeline, "a").await; // "a" is now more recent than "b"
    get(&pipeline, "c").await; // should evict "b"

    assert_eq!(pipeline.store().currsize(), 2);
    conn.remove("a"); // if "a" were evicted this GET would see Nil instead
    conn.remove("c");
    assert_eq!(
        pipeline.execute_command("GET", &[b"a".to_vec()]).await.unwrap(),
        csc::Reply::Bulk(b"1".to_vec()),
        "a should still be a hit from the cache"
    );
    assert_eq!(
        pipeline.execute_command("GET", &[b"c".to_vec()]).await.unwrap(),
        csc::Reply::Bulk(b"3".to_vec()),
        "c should still be a hit from the cache"
    );
    assert_eq!(
        pipeline.execute_command("GET", &[b"b".to_vec()]).await.unwrap(),
        csc::Reply::Nil,
        "b was evicted and the backing value was removed, so a miss falls through to Nil"
    );
}

#[tokio::test]
async fn lfu_evicts_least_frequently_used() {
    let conn = FakeConnection::new();
    conn.set("a", "1");
    conn.set("b", "2");
    conn.set("c", "3");

    let config = CacheConfiguration::builder()
        .max_size(2)
        .eviction_policy(EvictionPolicy::Lfu)
        .build()
        .unwrap();
    let pipeline = InvalidationPipeline::builder(conn.clone(), config).build();
    pipeline.start().await.unwrap();

    get(&pipeline, "a").await;
    get(&pipeline, "a").await;
    get(&pipeline, "a").await; // "a" accessed three times
    get(&pipeline, "b").await; // "b" accessed once
    get(&pipeline, "c").await; // evicts "b", the least frequently used

    conn.remove("a");
    conn.remove("c");
    assert_eq!(
        pipeline.execute_command("GET", &[b"a".to_vec()]).await.unwrap(),
        csc::Reply::Bulk(b"1".to_vec())
    );
    assert_eq!(
        pipeline.execute_command("GET", &[b"c".to_vec()]).await.unwrap(),
        csc::Reply::Bulk(b"3".to_vec())
    );
}

#[tokio::test]
async fn ttl_entries_expire_and_are_refetched() {
    let conn = FakeConnection::new();
    conn.set("a", "1");

    let config = CacheConfiguration::builder()
        .max_size(10)
        .eviction_policy(EvictionPolicy::Ttl)
        .ttl(Duration::from_millis(20))
        .build()
        .unwrap();
    let pipeline = InvalidationPipeline::builder(conn.clone(), config).build();
    pipeline.start().await.unwrap();

    get(&pipeline, "a").await;
    assert_eq!(pipeline.store().currsize(), 1);
    assert_eq!(conn.send_count.load(std::sync::atomic::Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(40)).await;
    get(&pipeline, "a").await;
    assert_eq!(
        conn.send_count.load(std::sync::atomic::Ordering::SeqCst),
        2,
        "the expired entry should have been a miss, forcing a second send"
    );
}

#[tokio::test]
async fn random_eviction_keeps_store_within_capacity() {
    let conn = FakeConnection::new();
    for i in 0..10 {
        conn.set(&format!("k{i}"), "v");
    }

    let config = CacheConfiguration::builder()
        .max_size(3)
        .eviction_policy(EvictionPolicy::Random)
        .build()
        .unwrap();
    let pipeline = InvalidationPipeline::builder(conn, config).build();
    pipeline.start().await.unwrap();

    for i in 0..10 {
        get(&pipeline, &format!("k{i}")).await;
    }

    assert_eq!(pipeline.store().currsize(), 3);
}
