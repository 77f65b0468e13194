//! Disconnects, server flushes, and health-check-driven invalidation.

use crate::cache_invalidation::support::FakeConnection;
use csc::{CacheConfiguration, InvalidationPipeline, PipelineState, Reply};
use std::time::Duration;

fn config() -> CacheConfiguration {
    CacheConfiguration::builder().max_size(128).build().unwrap()
}

#[tokio::test]
async fn disconnect_mid_session_clears_store_and_closes_pipeline() {
    let conn = FakeConnection::new();
    conn.set("a", "1");
    conn.set("b", "2");

    let pipeline = InvalidationPipeline::builder(conn.clone(), config()).build();
    pipeline.start().await.unwrap();
    pipeline.execute_command("GET", &[b"a".to_vec()]).await.unwrap();
    pipeline.execute_command("GET", &[b"b".to_vec()]).await.unwrap();
    assert_eq!(pipeline.store().currsize(), 2);

    conn.disconnect();
    let result = pipeline.execute_command("GET", &[b"c".to_vec()]).await;
    assert!(result.is_err());
    assert_eq!(pipeline.store().currsize(), 0);
    assert_eq!(pipeline.state(), PipelineState::Closed);

    let retry = pipeline.execute_command("GET", &[b"a".to_vec()]).await;
    assert!(retry.is_err(), "a closed pipeline should keep rejecting commands");
}

#[tokio::test]
async fn flush_command_clears_the_whole_store() {
    let conn = FakeConnection::new();
    conn.set("a", "1");
    conn.set("b", "2");
    conn.set("c", "3");

    let pipeline = InvalidationPipeline::builder(conn, config()).build();
    pipeline.start().await.unwrap();
    for key in ["a", "b", "c"] {
        pipeline.execute_command("GET", &[key.as_bytes().to_vec()]).await.unwrap();
    }
    assert_eq!(pipeline.store().currsize(), 3);

    let reply = pipeline.execute_command("FLUSHALL", &[]).await.unwrap();
    assert_eq!(reply, Reply::Status("OK".into()));
    assert_eq!(pipeline.store().currsize(), 0);
}

#[tokio::test(start_paused = true)]
async fn periodic_health_check_applies_pushes_without_application_traffic() {
    let conn = FakeConnection::new();
    conn.set("a", "1");

    let config = CacheConfiguration::builder()
        .max_size(128)
        .health_check_interval(Duration::from_millis(50))
        .build()
        .unwrap();
    let pipeline = InvalidationPipeline::builder(conn.clone(), config).build();
    pipeline.start().await.unwrap();
    pipeline.execute_command("GET", &[b"a".to_vec()]).await.unwrap();
    assert_eq!(pipeline.store().currsize(), 1);

    conn.push_invalidation(Some(vec!["a"]));
    tokio::time::advance(Duration::from_millis(120)).await;
    tokio::task::yield_now().await;

    assert_eq!(
        pipeline.store().currsize(),
        0,
        "the background health check should have drained the push with no GET in between"
    );
}
