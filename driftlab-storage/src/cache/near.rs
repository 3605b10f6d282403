//! Near-cache core: a local layer kept loosely in sync with one remote key.
//!
//! Each [`NearCache`] tracks a single remote key (a map or a bucket). A
//! background listener consumes the tracking channel and drops local copies
//! once an invalidation's propagation delay has elapsed. Reads that miss
//! locally fall through to the remote store and refill the local layer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::freshness::{CacheRead, Freshness};
use super::options::NearCacheOptions;
use super::stats::{CacheStats, Counters};
use crate::remote::{ClientId, Invalidation, RemoteHandle, RemoteStore};
use crate::value::StoredValue;

#[derive(Debug, Clone)]
struct LocalEntry {
    value: StoredValue,
    cached_at: DateTime<Utc>,
    loaded_at: Instant,
}

struct LocalLayer {
    entries: DashMap<String, LocalEntry>,
    counters: Counters,
    options: NearCacheOptions,
}

impl LocalLayer {
    fn lookup(&self, slot: &str, max_age: Duration) -> Option<CacheRead<StoredValue>> {
        let now = Instant::now();
        let expired = {
            let guard = self.entries.get(slot)?;
            let entry = guard.value();
            let age = now.saturating_duration_since(entry.loaded_at);
            if age <= max_age {
                self.counters.hit();
                return Some(CacheRead::from_cache(entry.value.clone(), entry.cached_at));
            }
            age > self.options.local_ttl
        };
        if expired && self.entries.remove(slot).is_some() {
            self.counters.evicted();
        }
        None
    }

    fn store(&self, slot: &str, value: StoredValue) {
        if !self.entries.contains_key(slot) && self.entries.len() >= self.options.max_entries {
            self.evict_oldest();
        }
        self.entries.insert(
            slot.to_string(),
            LocalEntry {
                value,
                cached_at: Utc::now(),
                loaded_at: Instant::now(),
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().loaded_at)
            .map(|e| e.key().clone());
        if let Some(slot) = oldest {
            if self.entries.remove(&slot).is_some() {
                self.counters.evicted();
            }
        }
    }

    fn apply(&self, invalidation: &Invalidation) -> usize {
        let dropped = match &invalidation.field {
            Some(field) => usize::from(self.entries.remove(field).is_some()),
            None => self.clear(),
        };
        self.counters.invalidated(dropped as u64);
        dropped
    }

    fn clear(&self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    fn memory_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.key().len() as u64 + e.value().value.approx_bytes())
            .sum()
    }
}

/// Local cache layered over one remote key.
pub struct NearCache {
    name: String,
    client: ClientId,
    remote: RemoteHandle,
    local: Arc<LocalLayer>,
    listener: JoinHandle<()>,
}

impl NearCache {
    /// Connect a near-cache for `name` and start its tracking listener.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(
        name: impl Into<String>,
        store: Arc<dyn RemoteStore>,
        options: NearCacheOptions,
    ) -> Arc<Self> {
        let name = name.into();
        let client = ClientId::new();
        let remote = RemoteHandle::for_client(store, client);
        let local = Arc::new(LocalLayer {
            entries: DashMap::new(),
            counters: Counters::default(),
            options,
        });
        // Subscribe before spawning so no write after `connect` returns is missed.
        let rx = remote.subscribe();
        let listener = tokio::spawn(track(name.clone(), client, Arc::clone(&local), rx));
        tracing::debug!(cache = %name, client = %client, "Near-cache connected");

        Arc::new(Self {
            name,
            client,
            remote,
            local,
            listener,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client_id(&self) -> ClientId {
        self.client
    }

    /// Remote connection used by this cache; writes carry this cache's client id.
    pub fn remote(&self) -> &RemoteHandle {
        &self.remote
    }

    pub fn options(&self) -> &NearCacheOptions {
        &self.local.options
    }

    /// Default freshness for plain reads: anything inside the local TTL.
    pub fn default_freshness(&self) -> Freshness {
        Freshness::best_effort(self.local.options.local_ttl)
    }

    pub fn stats(&self) -> CacheStats {
        self.local.counters.snapshot(
            self.local.entries.len() as u64,
            self.local.memory_bytes(),
        )
    }

    pub fn local_len(&self) -> usize {
        self.local.entries.len()
    }

    /// Whether `slot` currently has a local copy, without touching counters.
    pub fn is_cached(&self, slot: &str) -> bool {
        self.local.entries.contains_key(slot)
    }

    /// Drop every local copy.
    pub fn clear_local(&self) -> usize {
        self.local.clear()
    }

    pub(crate) fn lookup(&self, slot: &str, freshness: &Freshness) -> Option<CacheRead<StoredValue>> {
        match freshness {
            Freshness::Consistent => None,
            Freshness::BestEffort { max_staleness } => {
                let max_age = (*max_staleness).min(self.local.options.local_ttl);
                self.local.lookup(slot, max_age)
            }
        }
    }

    pub(crate) fn record_miss(&self) {
        self.local.counters.miss();
    }

    pub(crate) fn fill(&self, slot: &str, value: StoredValue) {
        self.local.store(slot, value);
    }

    pub(crate) fn forget(&self, slot: &str) {
        self.local.entries.remove(slot);
    }
}

impl Drop for NearCache {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn track(
    name: String,
    client: ClientId,
    local: Arc<LocalLayer>,
    mut rx: broadcast::Receiver<Invalidation>,
) {
    let delay = local.options.propagation_delay;
    let noloop = local.options.noloop;
    loop {
        match rx.recv().await {
            Ok(invalidation) => {
                if invalidation.key != name {
                    continue;
                }
                if noloop && invalidation.origin == Some(client) {
                    continue;
                }
                if let Some(deadline) = invalidation.published_at.checked_add(delay) {
                    tokio::time::sleep_until(deadline).await;
                }
                let dropped = local.apply(&invalidation);
                tracing::debug!(
                    cache = %name,
                    field = ?invalidation.field,
                    cause = ?invalidation.cause,
                    dropped,
                    "Applied invalidation"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                let dropped = local.clear();
                local.counters.invalidated(dropped as u64);
                tracing::warn!(
                    cache = %name,
                    skipped,
                    dropped,
                    "Tracking channel lagged, cleared local cache"
                );
            }
            Err(RecvError::Closed) => break,
        }
    }
}
