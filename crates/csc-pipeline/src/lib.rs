//! The invalidation pipeline: binds a [`csc_store::CacheStore`] to a live
//! connection, applying the server's push-based invalidation stream and
//! running the periodic health check that keeps it flowing.

mod connection;
mod error;
mod events;
mod pipeline;
mod state;

pub use connection::{Connection, PushMessage, Reply};
pub use error::{ConnectionError, PipelineError};
pub use events::PipelineEvent;
pub use pipeline::{InvalidationPipeline, InvalidationPipelineBuilder};
pub use state::{PipelineState, PipelineStateTracker};
