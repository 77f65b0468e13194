//! A client-side cache for key-value database clients, with server-assisted
//! invalidation.
//!
//! This crate re-exports the three pieces of the cache family as a single
//! entry point:
//!
//! - [`store`] ([`csc_store`]): the eviction-aware cache store, its
//!   configuration, and the command catalogue that decides what is
//!   cacheable.
//! - [`pipeline`] ([`csc_pipeline`], behind the `pipeline` feature): binds a
//!   store to a live connection and applies the server's invalidation
//!   stream.
//! - [`core`] ([`csc_core`]): shared primitives (the event system) used by
//!   both.
//!
//! Most callers only need the re-exports at the crate root below; the module
//! aliases are there for code that wants to name a sub-crate's types
//! explicitly.

pub use csc_core as core;
pub use csc_store as store;

#[cfg(feature = "pipeline")]
pub use csc_pipeline as pipeline;

pub use csc_store::{
    CacheConfiguration, CacheConfigurationBuilder, CacheStore, ConfigurationError, DatabaseKey,
    EvictionPolicy, Fingerprint, StoreEvent,
};

#[cfg(feature = "pipeline")]
pub use csc_pipeline::{
    Connection, ConnectionError, InvalidationPipeline, InvalidationPipelineBuilder,
    PipelineError, PipelineEvent, PipelineState, PushMessage, Reply,
};
