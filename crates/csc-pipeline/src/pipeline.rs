//! The binding between a [`CacheStore`] and a live [`Connection`]: tracking
//! handshake, invalidation delivery, disconnect/flush handling, and the
//! periodic health check that keeps invalidations flowing without
//! application traffic.

use crate::connection::{Connection, PushMessage, Reply};
use crate::error::{ConnectionError, PipelineError};
use crate::events::PipelineEvent;
use crate::state::{PipelineState, PipelineStateTracker};
use csc_core::{EventListeners, FnListener};
use csc_store::{CacheConfiguration, CacheStore, DatabaseKey, Fingerprint};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;

/// Binds one [`CacheStore`] to one [`Connection`], keeping the store
/// consistent with the server's invalidation stream.
///
/// Cheap to clone: every field is independently `Arc`-backed, so cloning a
/// pipeline hands out another handle onto the same store, connection, and
/// background health-check task rather than duplicating any of them.
#[derive(Clone)]
pub struct InvalidationPipeline {
    connection: Arc<dyn Connection>,
    store: Arc<CacheStore<Reply>>,
    config: CacheConfiguration,
    state: PipelineStateTracker,
    listeners: EventListeners<PipelineEvent>,
    health_check_task: Arc<AsyncMutex<Option<JoinHandle<()>>>>,
}

impl InvalidationPipeline {
    /// Creates a builder for configuring event listeners before the
    /// pipeline starts.
    pub fn builder(connection: Arc<dyn Connection>, config: CacheConfiguration) -> InvalidationPipelineBuilder {
        InvalidationPipelineBuilder::new(connection, config)
    }

    fn from_parts(connection: Arc<dyn Connection>, config: CacheConfiguration, listeners: EventListeners<PipelineEvent>) -> Self {
        let store = Arc::new(CacheStore::new(&config));
        Self {
            connection,
            store,
            config,
            state: PipelineStateTracker::new(),
            listeners,
            health_check_task: Arc::new(AsyncMutex::new(None)),
        }
    }

    /// The cache store this pipeline maintains. Exposed so application code
    /// can read `currsize()`/`eviction_policy()`/`get()` directly; the only
    /// mutator in the public surface is [`CacheStore::clear`].
    pub fn store(&self) -> &CacheStore<Reply> {
        &self.store
    }

    /// The pipeline's current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state.state()
    }

    /// Performs the tracking handshake and spawns the background
    /// health-check task. Must be called once before `execute_command` is
    /// expected to cache anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ProtocolTooOld`] if the connection has
    /// not negotiated RESP3: push-type invalidation messages cannot be
    /// told apart from ordinary replies under older protocol versions, so
    /// caching cannot be enabled.
    pub async fn start(&self) -> Result<(), PipelineError> {
        if self.connection.protocol_version() < 3 {
            return Err(csc_store::ConfigurationError::ProtocolTooOld.into());
        }

        self.connection.begin_tracking().await?;
        self.state.mark_ready();
        self.listeners.emit(&PipelineEvent::TrackingStarted { timestamp: Instant::now() });

        let weak_self = WeakPipeline::from(self);
        let interval = self.config.health_check_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(pipeline) = weak_self.upgrade() else {
                    return;
                };
                if pipeline.state() != PipelineState::Ready {
                    return;
                }
                pipeline.health_check().await;
            }
        });
        *self.health_check_task.lock().await = Some(handle);

        Ok(())
    }

    /// Executes one command: passes non-cacheable commands straight
    /// through, serves cache hits without touching the connection, and on
    /// miss sends the command, inserts the reply (only if non-error), and
    /// recognizes a successful flush.
    pub async fn execute_command(&self, cmd: &str, args: &[Vec<u8>]) -> Result<Reply, PipelineError> {
        let name = cmd.to_ascii_uppercase();

        if self.state.is_caching() && csc_store::is_flush_command(&name) {
            let reply = self.send_passthrough(&name, args).await?;
            self.on_server_flush().await;
            return Ok(reply);
        }

        if !self.state.is_caching() || !self.config.is_allowed_to_cache(&name) {
            return self.send_passthrough(&name, args).await;
        }

        let fp = Fingerprint::new(&name, args.to_vec());
        if let Some(reply) = self.store.get(&fp) {
            return Ok(reply);
        }

        let deps: HashSet<DatabaseKey> = csc_store::touched_keys(&name, args).into_iter().collect();
        let reply = self.send_passthrough(&name, args).await?;

        self.store.set(&fp, reply.clone(), deps);
        Ok(reply)
    }

    async fn send_passthrough(&self, name: &str, args: &[Vec<u8>]) -> Result<Reply, PipelineError> {
        match self.connection.send(name, args).await {
            Ok(reply) => Ok(reply),
            Err(ConnectionError::Disconnected) => {
                self.on_disconnect().await;
                Err(PipelineError::Connection(ConnectionError::Disconnected))
            }
            Err(other) => Err(PipelineError::Connection(other)),
        }
    }

    /// Applies one server push: `None` clears everything, `Some(keys)`
    /// invalidates only those keys.
    pub fn on_invalidation_message(&self, keys: Option<Vec<DatabaseKey>>) {
        match keys {
            None => {
                self.store.clear();
                self.listeners.emit(&PipelineEvent::Flush { timestamp: Instant::now() });
            }
            Some(keys) => {
                for key in &keys {
                    self.store.invalidate_key(key);
                }
                self.listeners.emit(&PipelineEvent::Invalidation { keys, timestamp: Instant::now() });
            }
        }
    }

    /// Clears the store in response to a disconnect and moves the pipeline
    /// to `Closed`. Idempotent.
    pub async fn on_disconnect(&self) {
        self.state.mark_draining();
        self.store.clear();
        self.state.mark_closed();
        self.listeners.emit(&PipelineEvent::Disconnect { timestamp: Instant::now() });
    }

    /// Clears the store in response to a recognized flush, without
    /// affecting the pipeline's lifecycle state.
    pub async fn on_server_flush(&self) {
        self.store.clear();
        self.listeners.emit(&PipelineEvent::Flush { timestamp: Instant::now() });
    }

    /// Drains any invalidation pushes the connection has already received
    /// and applies them. Called by the background health-check task, and
    /// safe to call directly from a test that wants to avoid sleeping.
    pub async fn health_check(&self) {
        for message in self.connection.poll_invalidations().await {
            match message {
                PushMessage::Invalidate(keys) => self.on_invalidation_message(keys),
            }
        }
    }
}

/// A weak handle onto a pipeline's shared state, used by the background
/// health-check task so a closed pipeline can be dropped freely instead of
/// being kept alive by its own polling loop.
struct WeakPipeline {
    connection: std::sync::Weak<dyn Connection>,
    store: std::sync::Weak<CacheStore<Reply>>,
    config: CacheConfiguration,
    state: PipelineStateTracker,
    listeners: EventListeners<PipelineEvent>,
}

impl From<&InvalidationPipeline> for WeakPipeline {
    fn from(pipeline: &InvalidationPipeline) -> Self {
        Self {
            connection: Arc::downgrade(&pipeline.connection),
            store: Arc::downgrade(&pipeline.store),
            config: pipeline.config.clone(),
            state: pipeline.state.clone(),
            listeners: pipeline.listeners.clone(),
        }
    }
}

impl WeakPipeline {
    fn upgrade(&self) -> Option<InvalidationPipeline> {
        Some(InvalidationPipeline {
            connection: self.connection.upgrade()?,
            store: self.store.upgrade()?,
            config: self.config.clone(),
            state: self.state.clone(),
            listeners: self.listeners.clone(),
            health_check_task: Arc::new(AsyncMutex::new(None)),
        })
    }
}

/// Builder for [`InvalidationPipeline`], following this codebase's pattern
/// of registering event callbacks before construction.
pub struct InvalidationPipelineBuilder {
    connection: Arc<dyn Connection>,
    config: CacheConfiguration,
    listeners: EventListeners<PipelineEvent>,
}

impl InvalidationPipelineBuilder {
    fn new(connection: Arc<dyn Connection>, config: CacheConfiguration) -> Self {
        Self {
            connection,
            config,
            listeners: EventListeners::new(),
        }
    }

    /// Registers a callback invoked whenever keys are invalidated.
    pub fn on_invalidation<F>(mut self, f: F) -> Self
    where
        F: Fn(&[DatabaseKey]) + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &PipelineEvent| {
            if let PipelineEvent::Invalidation { keys, .. } = event {
                f(keys);
            }
        }));
        self
    }

    /// Registers a callback invoked on disconnect.
    pub fn on_disconnect<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &PipelineEvent| {
            if matches!(event, PipelineEvent::Disconnect { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked whenever the store is flushed.
    pub fn on_flush<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.add(FnListener::new(move |event: &PipelineEvent| {
            if matches!(event, PipelineEvent::Flush { .. }) {
                f();
            }
        }));
        self
    }

    /// Builds the pipeline. Call [`InvalidationPipeline::start`] afterward
    /// to perform the tracking handshake and begin health-checking.
    pub fn build(self) -> InvalidationPipeline {
        InvalidationPipeline::from_parts(self.connection, self.config, self.listeners)
    }
}
