//! Shared infrastructure for the client-side cache crates.
//!
//! This crate provides the small event system used by `csc-store` and
//! `csc-pipeline` for observability: a trait per event, a listener
//! collection, and a closure adapter. It mirrors the shape used throughout
//! this workspace's other resilience patterns so the cache's observability
//! surface looks like everything else's.

mod events;

pub use events::{BoxedEventListener, CacheEvent, EventListener, EventListeners, FnListener};
