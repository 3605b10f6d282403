//! Typed views over a [`NearCache`]: a field map and a single-value bucket.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use driftlab_core::{DriftResult, ValidationError};

use super::freshness::{CacheRead, Freshness};
use super::near::NearCache;
use super::stats::CacheStats;
use crate::value::StoredValue;

/// Local slot used by buckets, which hold a single value.
const BUCKET_SLOT: &str = "";

// ============================================================================
// MAP
// ============================================================================

/// Near-cached view of a remote map key.
#[derive(Clone)]
pub struct NearCachedMap {
    cache: Arc<NearCache>,
}

impl NearCachedMap {
    pub fn new(cache: Arc<NearCache>) -> Self {
        Self { cache }
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    pub fn near_cache(&self) -> &Arc<NearCache> {
        &self.cache
    }

    /// Read a field, serving the local copy when one is held.
    pub async fn get(&self, field: &str) -> DriftResult<Option<StoredValue>> {
        let freshness = self.cache.default_freshness();
        Ok(self.read(field, freshness).await?.into_value())
    }

    /// Read a field under an explicit freshness contract.
    pub async fn read(
        &self,
        field: &str,
        freshness: Freshness,
    ) -> DriftResult<CacheRead<Option<StoredValue>>> {
        if let Some(hit) = self.cache.lookup(field, &freshness) {
            return Ok(hit.map(Some));
        }
        self.cache.record_miss();
        let value = self.cache.remote().hget(self.name(), field).await?;
        match &value {
            Some(v) => self.cache.fill(field, v.clone()),
            None => self.cache.forget(field),
        }
        Ok(CacheRead::from_remote(value))
    }

    /// Write through to the remote store and keep the value locally.
    pub async fn put(&self, field: &str, value: impl Into<StoredValue>) -> DriftResult<()> {
        let value = value.into();
        self.cache
            .remote()
            .hset(self.name(), field, value.clone())
            .await?;
        self.cache.fill(field, value);
        Ok(())
    }

    pub async fn remove(&self, field: &str) -> DriftResult<bool> {
        let removed = self.cache.remote().hdel(self.name(), field).await?;
        self.cache.forget(field);
        Ok(removed)
    }

    /// Reload the whole map from the remote store, replacing every local copy.
    pub async fn read_all(&self) -> DriftResult<BTreeMap<String, StoredValue>> {
        let all = self.cache.remote().hgetall(self.name()).await?;
        self.cache.clear_local();
        for (field, value) in all.iter().take(self.cache.options().max_entries) {
            self.cache.fill(field, value.clone());
        }
        tracing::debug!(cache = %self.name(), entries = all.len(), "Full reload");
        Ok(all)
    }

    /// Apply a server-side TTL to the whole map.
    pub async fn expire(&self, ttl: Duration) -> DriftResult<bool> {
        self.cache.remote().expire(self.name(), ttl).await
    }

    pub async fn remaining_ttl_millis(&self) -> DriftResult<i64> {
        self.cache.remote().remaining_ttl_millis(self.name()).await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

// ============================================================================
// BUCKET
// ============================================================================

/// Near-cached view of a remote single-value key.
#[derive(Clone)]
pub struct NearCachedBucket {
    cache: Arc<NearCache>,
}

impl NearCachedBucket {
    pub fn new(cache: Arc<NearCache>) -> Self {
        Self { cache }
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    pub fn near_cache(&self) -> &Arc<NearCache> {
        &self.cache
    }

    pub async fn get(&self) -> DriftResult<Option<String>> {
        let freshness = self.cache.default_freshness();
        if let Some(hit) = self.cache.lookup(BUCKET_SLOT, &freshness) {
            return Ok(hit.into_value().into_text());
        }
        self.cache.record_miss();
        let value = self.cache.remote().get(self.name()).await?;
        match &value {
            Some(v) => self.cache.fill(BUCKET_SLOT, StoredValue::text(v.as_str())),
            None => self.cache.forget(BUCKET_SLOT),
        }
        Ok(value)
    }

    /// Set the value with an optional server-side TTL.
    pub async fn set(&self, value: &str, ttl: Option<Duration>) -> DriftResult<()> {
        if ttl.is_some_and(|t| t.is_zero()) {
            return Err(ValidationError::invalid("ttl", "must be positive").into());
        }
        self.cache.remote().set(self.name(), value, ttl).await?;
        self.cache.fill(BUCKET_SLOT, StoredValue::text(value));
        Ok(())
    }

    pub async fn delete(&self) -> DriftResult<bool> {
        let removed = self.cache.remote().delete(self.name()).await?;
        self.cache.forget(BUCKET_SLOT);
        Ok(removed)
    }

    pub async fn remaining_ttl_millis(&self) -> DriftResult<i64> {
        self.cache.remote().remaining_ttl_millis(self.name()).await
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
