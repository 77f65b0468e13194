//! Immutable cache policy, built through [`CacheConfigurationBuilder`].

use crate::catalogue;
use crate::eviction::EvictionPolicy;
use crate::error::ConfigurationError;
use std::time::Duration;

const DEFAULT_MAX_SIZE: usize = 128;
const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// Immutable policy governing a [`crate::store::CacheStore`]: capacity, TTL,
/// eviction strategy, and which commands are eligible for caching at all.
#[derive(Debug, Clone)]
pub struct CacheConfiguration {
    max_size: usize,
    ttl: Option<Duration>,
    eviction_policy: EvictionPolicy,
    health_check_interval: Duration,
}

impl CacheConfiguration {
    /// Creates a builder seeded with this codebase's defaults: LRU eviction,
    /// 128 entries, no TTL, a 1 second health-check interval.
    pub fn builder() -> CacheConfigurationBuilder {
        CacheConfigurationBuilder::new()
    }

    /// Maximum number of entries the store may hold.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The configured TTL, if any. `None` means entries never expire by age.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// The eviction policy selected for this configuration.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.eviction_policy
    }

    /// How often the pipeline should poll the connection for pending
    /// invalidation pushes in the absence of application traffic.
    pub fn health_check_interval(&self) -> Duration {
        self.health_check_interval
    }

    /// Whether `command_name` is eligible for caching.
    ///
    /// Backed by the static command catalogue; unknown commands and known
    /// nondeterministic readers (`HRANDFIELD`, `SRANDMEMBER`, `RANDOMKEY`)
    /// are not cacheable even though some of them are read-only.
    pub fn is_allowed_to_cache(&self, command_name: &str) -> bool {
        catalogue::lookup(&command_name.to_ascii_uppercase()).cacheable
    }

    /// Whether `n` entries would exceed `max_size`.
    pub fn exceeds_max_size(&self, n: usize) -> bool {
        n > self.max_size
    }
}

/// Builder for [`CacheConfiguration`].
///
/// Unlike some builders in this workspace, `build()` is fallible: a
/// contradictory combination of options (zero capacity, or TTL eviction
/// with no TTL set) is a configuration mistake, not a forgotten setter, so
/// it is reported rather than silently coerced or panicked on.
#[derive(Debug, Clone)]
pub struct CacheConfigurationBuilder {
    max_size: usize,
    ttl: Option<Duration>,
    eviction_policy: EvictionPolicy,
    health_check_interval: Duration,
}

impl CacheConfigurationBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: None,
            eviction_policy: EvictionPolicy::default(),
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
        }
    }

    /// Sets the maximum number of entries in the store.
    ///
    /// Default: 128.
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    /// Sets the time-to-live for cached entries.
    ///
    /// Default: `None` (no expiration by age).
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Selects the eviction policy.
    ///
    /// Default: [`EvictionPolicy::Lru`].
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Sets how often the pipeline polls the connection for pending
    /// invalidation pushes.
    ///
    /// Default: 1 second.
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ZeroMaxSize`] if `max_size` is zero, or
    /// [`ConfigurationError::MissingTtl`] if the eviction policy is
    /// [`EvictionPolicy::Ttl`] with no TTL configured.
    pub fn build(self) -> Result<CacheConfiguration, ConfigurationError> {
        if self.max_size == 0 {
            return Err(ConfigurationError::ZeroMaxSize);
        }
        if self.eviction_policy == EvictionPolicy::Ttl && self.ttl.is_none() {
            return Err(ConfigurationError::MissingTtl);
        }

        Ok(CacheConfiguration {
            max_size: self.max_size,
            ttl: self.ttl,
            eviction_policy: self.eviction_policy,
            health_check_interval: self.health_check_interval,
        })
    }
}

impl Default for CacheConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
