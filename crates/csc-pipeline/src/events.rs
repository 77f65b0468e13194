//! Observability events emitted by the invalidation pipeline.

use csc_core::CacheEvent;
use csc_store::DatabaseKey;
use std::time::Instant;

/// An event emitted by an [`crate::pipeline::InvalidationPipeline`].
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The server acknowledged the "begin tracking" handshake.
    TrackingStarted { timestamp: Instant },
    /// A server push invalidated specific keys.
    Invalidation { keys: Vec<DatabaseKey>, timestamp: Instant },
    /// A server push invalidated everything (null-keyed push, or a
    /// recognized flush command).
    Flush { timestamp: Instant },
    /// The connection disconnected; the store was cleared.
    Disconnect { timestamp: Instant },
}

impl CacheEvent for PipelineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::TrackingStarted { .. } => "tracking_started",
            PipelineEvent::Invalidation { .. } => "invalidation",
            PipelineEvent::Flush { .. } => "flush",
            PipelineEvent::Disconnect { .. } => "disconnect",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PipelineEvent::TrackingStarted { timestamp }
            | PipelineEvent::Flush { timestamp }
            | PipelineEvent::Disconnect { timestamp } => *timestamp,
            PipelineEvent::Invalidation { timestamp, .. } => *timestamp,
        }
    }
}
