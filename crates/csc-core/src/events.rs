//! Minimal event system shared by the cache store and the invalidation pipeline.
//!
//! Both crates emit observability events through the same small vocabulary:
//! a trait object per event, a `Vec` of listeners, and a panic-isolated
//! `emit`. There is no queueing or backpressure here — listeners run inline
//! on the thread that triggered the event, so they must be cheap.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event emitted by the cache or the invalidation pipeline.
pub trait CacheEvent: Send + Sync + fmt::Debug {
    /// Short, stable name for the event (e.g. `"hit"`, `"invalidated"`).
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;
}

/// Receives events emitted through an [`EventListeners`] collection.
pub trait EventListener<E: CacheEvent>: Send + Sync {
    /// Called synchronously when `event` occurs.
    fn on_event(&self, event: &E);
}

/// A boxed, shared event listener.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// An ordered collection of listeners for a single event type.
#[derive(Clone)]
pub struct EventListeners<E: CacheEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: CacheEvent> EventListeners<E> {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Registers a listener.
    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits `event` to every registered listener.
    ///
    /// A listener that panics is caught so the remaining listeners still
    /// run; one misbehaving observer must not take down the cache.
    pub fn emit(&self, event: &E) {
        for (_index, listener) in self.listeners.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            if let Err(_panic_payload) = result {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    listener_index = _index,
                    event_type = event.event_type(),
                    "cache event listener panicked"
                );

                #[cfg(feature = "metrics")]
                {
                    let counter =
                        metrics::counter!("csc_event_listener_panics_total", "event" => event.event_type());
                    counter.increment(1);
                }
            }
        }
    }

    /// Returns `true` if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: CacheEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts a plain closure into an [`EventListener`].
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _marker: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Wraps `f` as a listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: CacheEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
