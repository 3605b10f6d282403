//! Near-cache options.

use std::time::Duration;

/// Configuration for one near-cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearCacheOptions {
    /// Maximum number of locally held entries. Oldest entries are evicted first.
    pub max_entries: usize,
    /// Age after which a local copy is discarded even without invalidation.
    pub local_ttl: Duration,
    /// Delay between an invalidation being published and it reaching this cache.
    pub propagation_delay: Duration,
    /// Ignore invalidations caused by this cache's own writes.
    pub noloop: bool,
}

impl Default for NearCacheOptions {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            local_ttl: Duration::from_secs(300),
            propagation_delay: Duration::from_millis(25),
            noloop: true,
        }
    }
}

impl NearCacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset for the scenario string map: 1024 entries, 5 minute local TTL.
    pub fn map_preset() -> Self {
        Self::default()
    }

    /// Preset for the scenario bucket: 512 entries, 2 minute local TTL.
    pub fn bucket_preset() -> Self {
        Self::default()
            .with_max_entries(512)
            .with_local_ttl(Duration::from_secs(120))
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    pub fn with_local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = ttl;
        self
    }

    pub fn with_propagation_delay(mut self, delay: Duration) -> Self {
        self.propagation_delay = delay;
        self
    }

    pub fn with_noloop(mut self, noloop: bool) -> Self {
        self.noloop = noloop;
        self
    }
}
