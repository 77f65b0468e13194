//! Observability events emitted by the cache store.

use crate::fingerprint::Fingerprint;
use csc_core::CacheEvent;
use std::time::Instant;

/// An event emitted by a [`crate::store::CacheStore`].
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A lookup found a live entry.
    Hit { fingerprint: Fingerprint, timestamp: Instant },
    /// A lookup found no entry, or a TTL-expired one.
    Miss { fingerprint: Fingerprint, timestamp: Instant },
    /// A new entry was inserted.
    Insert { fingerprint: Fingerprint, timestamp: Instant },
    /// An entry was evicted to make room for a new one.
    Eviction { fingerprint: Fingerprint, timestamp: Instant },
}

impl CacheEvent for StoreEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StoreEvent::Hit { .. } => "hit",
            StoreEvent::Miss { .. } => "miss",
            StoreEvent::Insert { .. } => "insert",
            StoreEvent::Eviction { .. } => "eviction",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            StoreEvent::Hit { timestamp, .. }
            | StoreEvent::Miss { timestamp, .. }
            | StoreEvent::Insert { timestamp, .. }
            | StoreEvent::Eviction { timestamp, .. } => *timestamp,
        }
    }
}
