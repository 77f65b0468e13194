//! A single server push can name several keys at once; every fingerprint
//! that touched any of them must be dropped, and fingerprints that touched
//! none of them must survive.

use crate::cache_invalidation::support::FakeConnection;
use csc::{CacheConfiguration, Reply};
use csc::InvalidationPipeline;

fn config() -> CacheConfiguration {
    CacheConfiguration::builder().max_size(128).build().unwrap()
}

#[tokio::test]
async fn push_naming_several_keys_drops_only_matching_entries() {
    let conn = FakeConnection::new();
    conn.set("user:1", "alice");
    conn.set("user:2", "bob");
    conn.set("user:3", "carol");

    let pipeline = InvalidationPipeline::builder(conn.clone(), config()).build();
    pipeline.start().await.unwrap();

    pipeline.execute_command("GET", &[b"user:1".to_vec()]).await.unwrap();
    pipeline.execute_command("GET", &[b"user:2".to_vec()]).await.unwrap();
    pipeline.execute_command("GET", &[b"user:3".to_vec()]).await.unwrap();
    assert_eq!(pipeline.store().currsize(), 3);

    pipeline.on_invalidation_message(Some(vec![b"user:1".to_vec(), b"user:2".to_vec()]));
    assert_eq!(pipeline.store().currsize(), 1, "only the entries touching user:1 or user:2 should be dropped");

    conn.remove("user:3");
    assert_eq!(
        pipeline.execute_command("GET", &[b"user:3".to_vec()]).await.unwrap(),
        Reply::Bulk(b"carol".to_vec()),
        "user:3 survived the push and should still be served from cache"
    );
}

#[tokio::test]
async fn multi_key_command_is_invalidated_by_any_touched_key() {
    let conn = FakeConnection::new();
    conn.set("a", "1");
    conn.set("b", "2");

    let pipeline = InvalidationPipeline::builder(conn.clone(), config()).build();
    pipeline.start().await.unwrap();

    pipeline
        .execute_command("MGET", &[b"a".to_vec(), b"b".to_vec()])
        .await
        .unwrap();
    assert_eq!(pipeline.store().currsize(), 1);

    pipeline.on_invalidation_message(Some(vec![b"b".to_vec()]));
    assert_eq!(
        pipeline.store().currsize(),
        0,
        "invalidating only one of MGET's two touched keys must still drop the entry"
    );
}
