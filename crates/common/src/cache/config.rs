//! Cache configuration types and builder patterns

use std::time::Duration;

/// Storage key prefix for durable cache entries
///
/// Entries live under `"cache:entry:" + key`. Changing this constant (or
/// [`CACHE_METADATA_KEY`]) breaks compatibility with data persisted by
/// earlier app versions; treat it as a versioned format.
pub const CACHE_ENTRY_PREFIX: &str = "cache:entry:";

/// Storage key for the persisted cache metadata record
pub const CACHE_METADATA_KEY: &str = "cache:metadata";

/// Configuration for the persistent cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live applied when `set` is called without an explicit TTL
    pub default_ttl: Duration,

    /// Maximum number of entries held in the in-memory tier
    ///
    /// The durable tier is not bounded by this limit; eviction only drops the
    /// in-memory copy.
    pub max_memory_entries: usize,

    /// Interval between background cleanup passes
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            max_memory_entries: 50,
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Durable storage key for a cache entry
    pub(crate) fn entry_key(&self, key: &str) -> String {
        format!("{CACHE_ENTRY_PREFIX}{key}")
    }
}

/// Builder for [`CacheConfig`] with fluent API
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default time-to-live
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    /// Set the in-memory tier capacity
    pub fn max_memory_entries(mut self, max: usize) -> Self {
        self.config.max_memory_entries = max;
        self
    }

    /// Set the background cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.config.cleanup_interval = interval;
        self
    }

    /// Build the configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::config.
    use super::*;

    /// Validates `CacheConfig::default` behavior for the cache config default
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `config.default_ttl` equals `Duration::from_secs(300)`.
    /// - Confirms `config.max_memory_entries` equals `50`.
    /// - Confirms `config.cleanup_interval` equals `Duration::from_secs(3600)`.
    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();

        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.max_memory_entries, 50);
        assert_eq!(config.cleanup_interval, Duration::from_secs(3600));
    }

    /// Validates `CacheConfig::builder` behavior for the cache config builder
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `config.default_ttl` equals `Duration::from_secs(60)`.
    /// - Confirms `config.max_memory_entries` equals `10`.
    /// - Confirms `config.cleanup_interval` equals `Duration::from_secs(600)`.
    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(60))
            .max_memory_entries(10)
            .cleanup_interval(Duration::from_secs(600))
            .build();

        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert_eq!(config.max_memory_entries, 10);
        assert_eq!(config.cleanup_interval, Duration::from_secs(600));
    }

    /// Validates `CacheConfig::default` behavior for the entry key layout
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms `config.entry_key("points")` equals `"cache:entry:points"`.
    #[test]
    fn test_entry_key_layout() {
        let config = CacheConfig::default();
        assert_eq!(config.entry_key("points"), "cache:entry:points");
    }
}
