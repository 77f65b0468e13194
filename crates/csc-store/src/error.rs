use thiserror::Error;

/// Errors returned by [`crate::config::CacheConfigurationBuilder::build`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationError {
    /// `max_size` was set to zero; the store needs room for at least one entry.
    #[error("max_size must be greater than zero")]
    ZeroMaxSize,

    /// The TTL eviction policy was selected but no TTL was set.
    #[error("eviction policy is TTL but no ttl was configured")]
    MissingTtl,

    /// Caching was requested against a connection that has not negotiated
    /// RESP3, so push-type invalidation messages cannot be distinguished
    /// from ordinary replies.
    #[error("client-side caching requires protocol version 3 (RESP3)")]
    ProtocolTooOld,
}
