//! Store adapter: the one surface scenarios talk to.
//!
//! Bundles near-cached views of the reserved collections with an anonymous
//! remote handle that bypasses every near-cache. Writes through the remote
//! handle look, to the near-caches, like writes from another instance.

use std::sync::Arc;

use driftlab_core::{
    DriftResult, HealthCheck, SCENARIO_BUCKET_NAME, SCENARIO_HASH_NAME, SCENARIO_MAP_NAME,
};

use crate::cache::{CacheStats, NearCache, NearCacheOptions, NearCachedBucket, NearCachedMap};
use crate::remote::{RemoteHandle, RemoteStore};

/// Near-cache settings for the reserved collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub map: NearCacheOptions,
    pub hash: NearCacheOptions,
    pub bucket: NearCacheOptions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            map: NearCacheOptions::map_preset(),
            hash: NearCacheOptions::map_preset(),
            bucket: NearCacheOptions::bucket_preset(),
        }
    }
}

impl StoreConfig {
    /// Apply the same propagation delay to every collection.
    pub fn with_propagation_delay(mut self, delay: std::time::Duration) -> Self {
        self.map = self.map.with_propagation_delay(delay);
        self.hash = self.hash.with_propagation_delay(delay);
        self.bucket = self.bucket.with_propagation_delay(delay);
        self
    }

    /// Apply the same NOLOOP setting to every collection.
    pub fn with_noloop(mut self, noloop: bool) -> Self {
        self.map = self.map.with_noloop(noloop);
        self.hash = self.hash.with_noloop(noloop);
        self.bucket = self.bucket.with_noloop(noloop);
        self
    }
}

/// Per-collection near-cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterStats {
    pub map: CacheStats,
    pub hash: CacheStats,
    pub bucket: CacheStats,
}

/// Uniform access to the reserved collections.
#[derive(Clone)]
pub struct StoreAdapter {
    map: NearCachedMap,
    hash: NearCachedMap,
    bucket: NearCachedBucket,
    remote: RemoteHandle,
}

impl StoreAdapter {
    /// Connect near-caches for every reserved collection.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(store: Arc<dyn RemoteStore>, config: &StoreConfig) -> Self {
        let map = NearCache::connect(SCENARIO_MAP_NAME, Arc::clone(&store), config.map.clone());
        let hash = NearCache::connect(SCENARIO_HASH_NAME, Arc::clone(&store), config.hash.clone());
        let bucket =
            NearCache::connect(SCENARIO_BUCKET_NAME, Arc::clone(&store), config.bucket.clone());
        Self {
            map: NearCachedMap::new(map),
            hash: NearCachedMap::new(hash),
            bucket: NearCachedBucket::new(bucket),
            remote: RemoteHandle::anonymous(store),
        }
    }

    /// Near-cached string map.
    pub fn map(&self) -> &NearCachedMap {
        &self.map
    }

    /// Near-cached map whose values are field maps.
    pub fn hash(&self) -> &NearCachedMap {
        &self.hash
    }

    /// Near-cached single-value bucket.
    pub fn bucket(&self) -> &NearCachedBucket {
        &self.bucket
    }

    /// Direct connection to the authoritative store.
    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    pub fn stats(&self) -> AdapterStats {
        AdapterStats {
            map: self.map.stats(),
            hash: self.hash.stats(),
            bucket: self.bucket.stats(),
        }
    }

    /// Ping the remote store and report latency.
    pub async fn health(&self) -> HealthCheck {
        let start = std::time::Instant::now();
        match self.remote.ping().await {
            Ok(()) => HealthCheck::healthy("store").with_latency(start.elapsed().as_millis() as u64),
            Err(e) => HealthCheck::unhealthy("store", e.to_string()),
        }
    }

    /// Ping helper used by readiness checks that only need pass/fail.
    pub async fn ping(&self) -> DriftResult<()> {
        self.remote.ping().await
    }
}
