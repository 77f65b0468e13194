//! A shared in-memory stand-in for a live database connection.
//!
//! Every test in this module drives [`csc::InvalidationPipeline`] against one
//! of these instead of a socket: `set`/`remove` mutate the backing map the
//! way a server-side write would, and `push_invalidation` queues the push
//! message a real connection would have decoded off the wire.

use csc::{Connection, ConnectionError, PushMessage, Reply};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeConnection {
    values: Mutex<HashMap<String, Vec<u8>>>,
    pending: Mutex<Vec<PushMessage>>,
    connected: AtomicBool,
    pub send_count: AtomicUsize,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { connected: AtomicBool::new(true), ..Default::default() })
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.lock().unwrap().insert(key.to_string(), value.as_bytes().to_vec());
    }

    pub fn remove(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }

    pub fn push_invalidation(&self, keys: Option<Vec<&str>>) {
        let message = PushMessage::Invalidate(keys.map(|ks| ks.into_iter().map(|k| k.as_bytes().to_vec()).collect()));
        self.pending.lock().unwrap().push(message);
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl Connection for FakeConnection {
    fn send<'a>(&'a self, cmd: &'a str, args: &'a [Vec<u8>]) -> BoxFuture<'a, Result<Reply, ConnectionError>> {
        Box::pin(async move {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if !self.connected.load(Ordering::SeqCst) {
                return Err(ConnectionError::Disconnected);
            }
            let values = self.values.lock().unwrap();
            match cmd {
                "GET" => {
                    let key = String::from_utf8_lossy(&args[0]).to_string();
                    Ok(values.get(&key).cloned().map(Reply::Bulk).unwrap_or(Reply::Nil))
                }
                "MGET" => {
                    let replies = args
                        .iter()
                        .map(|a| values.get(&String::from_utf8_lossy(a).to_string()).cloned().unwrap_or_default())
                        .collect();
                    Ok(Reply::Array(replies))
                }
                "FLUSHALL" | "FLUSHDB" => Ok(Reply::Status("OK".into())),
                "HRANDFIELD" | "SRANDMEMBER" => Ok(Reply::Bulk(b"nondeterministic".to_vec())),
                _ => Ok(Reply::Nil),
            }
        })
    }

    fn poll_invalidations(&self) -> BoxFuture<'_, Vec<PushMessage>> {
        Box::pin(async move { std::mem::take(&mut *self.pending.lock().unwrap()) })
    }

    fn begin_tracking(&self) -> BoxFuture<'_, Result<(), ConnectionError>> {
        Box::pin(async { Ok(()) })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn protocol_version(&self) -> u8 {
        3
    }
}
