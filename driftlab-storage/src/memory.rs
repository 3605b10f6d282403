//! In-memory authoritative store.
//!
//! Keys expire lazily on access and actively via a reaper task. Both paths
//! publish an `Expired` invalidation so near-caches observe server-side
//! expiry the same way they observe writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockWriteGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use driftlab_core::{DriftResult, StoreError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::remote::{
    ClientId, Invalidation, InvalidationCause, RemoteStore, TTL_MISSING, TTL_PERSISTENT,
};
use crate::value::StoredValue;

/// Default tracking channel capacity.
pub const DEFAULT_TRACKING_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
enum Data {
    Value(String),
    Hash(BTreeMap<String, StoredValue>),
}

#[derive(Debug, Clone)]
struct Entry {
    data: Data,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    fn approx_bytes(&self) -> u64 {
        match &self.data {
            Data::Value(v) => v.len() as u64,
            Data::Hash(fields) => fields
                .iter()
                .map(|(k, v)| k.len() as u64 + v.approx_bytes())
                .sum(),
        }
    }
}

type Keyspace = HashMap<String, Entry>;

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

/// Thread-safe in-memory [`RemoteStore`].
pub struct InMemoryRemoteStore {
    keyspace: RwLock<Keyspace>,
    tracking: broadcast::Sender<Invalidation>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::with_tracking_capacity(DEFAULT_TRACKING_CAPACITY)
    }

    pub fn with_tracking_capacity(capacity: usize) -> Self {
        let (tracking, _) = broadcast::channel(capacity.max(1));
        Self {
            keyspace: RwLock::new(HashMap::new()),
            tracking,
        }
    }

    /// Start the background reaper. It stops once the store is dropped.
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                match store.purge_expired() {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(expired = n, "Reaped expired keys"),
                    Err(e) => tracing::warn!(error = %e, "Expiry reaper failed"),
                }
            }
        })
    }

    /// Remove every expired key now. Returns how many were removed.
    pub fn purge_expired(&self) -> DriftResult<usize> {
        let now = Instant::now();
        let expired: Vec<String> = {
            let mut guard = self.write()?;
            let keys: Vec<String> = guard
                .iter()
                .filter(|(_, e)| e.is_expired(now))
                .map(|(k, _)| k.clone())
                .collect();
            for key in &keys {
                guard.remove(key);
            }
            keys
        };
        for key in &expired {
            self.publish(Invalidation::new(key.as_str(), None, InvalidationCause::Expired, None));
        }
        Ok(expired.len())
    }

    /// Number of live keys.
    pub fn len(&self) -> DriftResult<usize> {
        let now = Instant::now();
        let guard = self
            .keyspace
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.values().filter(|e| !e.is_expired(now)).count())
    }

    pub fn is_empty(&self) -> DriftResult<bool> {
        Ok(self.len()? == 0)
    }

    fn write(&self) -> DriftResult<RwLockWriteGuard<'_, Keyspace>> {
        Ok(self
            .keyspace
            .write()
            .map_err(|_| StoreError::LockPoisoned)?)
    }

    fn publish(&self, invalidation: Invalidation) {
        // No receivers is not an error: nobody is tracking yet.
        let _ = self.tracking.send(invalidation);
    }

    /// Run `f` against the live key space with `key` already expired if due.
    fn with_key<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Keyspace) -> DriftResult<R>,
    ) -> DriftResult<R> {
        let now = Instant::now();
        let (expired, result) = {
            let mut guard = self.write()?;
            let expired = match guard.get(key) {
                Some(entry) if entry.is_expired(now) => {
                    guard.remove(key);
                    true
                }
                _ => false,
            };
            (expired, f(&mut guard))
        };
        if expired {
            self.publish(Invalidation::new(key, None, InvalidationCause::Expired, None));
        }
        result
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn get(&self, key: &str) -> DriftResult<Option<String>> {
        self.with_key(key, |ks| match ks.get(key) {
            None => Ok(None),
            Some(Entry { data: Data::Value(v), .. }) => Ok(Some(v.clone())),
            Some(_) => Err(wrong_type(key, "string").into()),
        })
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
        origin: Option<ClientId>,
    ) -> DriftResult<()> {
        self.with_key(key, |ks| {
            if let Some(Entry { data: Data::Hash(_), .. }) = ks.get(key) {
                return Err(wrong_type(key, "string").into());
            }
            ks.insert(
                key.to_string(),
                Entry {
                    data: Data::Value(value.to_string()),
                    expires_at: ttl.and_then(|t| Instant::now().checked_add(t)),
                },
            );
            Ok(())
        })?;
        self.publish(Invalidation::new(key, None, InvalidationCause::Write, origin));
        Ok(())
    }

    async fn delete(&self, key: &str, origin: Option<ClientId>) -> DriftResult<bool> {
        let removed = self.with_key(key, |ks| Ok(ks.remove(key).is_some()))?;
        if removed {
            self.publish(Invalidation::new(key, None, InvalidationCause::Delete, origin));
        }
        Ok(removed)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> DriftResult<bool> {
        self.with_key(key, |ks| match ks.get_mut(key) {
            Some(entry) => {
                // A TTL past the clock's range leaves the key persistent.
                entry.expires_at = Instant::now().checked_add(ttl);
                Ok(true)
            }
            None => Ok(false),
        })
    }

    async fn remaining_ttl_millis(&self, key: &str) -> DriftResult<i64> {
        self.with_key(key, |ks| {
            Ok(match ks.get(key) {
                None => TTL_MISSING,
                Some(Entry { expires_at: None, .. }) => TTL_PERSISTENT,
                Some(Entry {
                    expires_at: Some(deadline),
                    ..
                }) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    i64::try_from(left.as_millis()).unwrap_or(i64::MAX)
                }
            })
        })
    }

    async fn hget(&self, key: &str, field: &str) -> DriftResult<Option<StoredValue>> {
        self.with_key(key, |ks| match ks.get(key) {
            None => Ok(None),
            Some(Entry { data: Data::Hash(fields), .. }) => Ok(fields.get(field).cloned()),
            Some(_) => Err(wrong_type(key, "hash").into()),
        })
    }

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: StoredValue,
        origin: Option<ClientId>,
    ) -> DriftResult<()> {
        self.with_key(key, |ks| {
            let entry = ks.entry(key.to_string()).or_insert_with(|| Entry {
                data: Data::Hash(BTreeMap::new()),
                expires_at: None,
            });
            match &mut entry.data {
                Data::Hash(fields) => {
                    fields.insert(field.to_string(), value);
                    Ok(())
                }
                Data::Value(_) => Err(wrong_type(key, "hash").into()),
            }
        })?;
        self.publish(Invalidation::new(
            key,
            Some(field.to_string()),
            InvalidationCause::Write,
            origin,
        ));
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str, origin: Option<ClientId>) -> DriftResult<bool> {
        let removed = self.with_key(key, |ks| {
            let (removed, now_empty) = match ks.get_mut(key) {
                None => (false, false),
                Some(Entry { data: Data::Hash(fields), .. }) => {
                    let removed = fields.remove(field).is_some();
                    (removed, fields.is_empty())
                }
                Some(_) => return Err(wrong_type(key, "hash").into()),
            };
            if now_empty {
                ks.remove(key);
            }
            Ok(removed)
        })?;
        if removed {
            self.publish(Invalidation::new(
                key,
                Some(field.to_string()),
                InvalidationCause::Delete,
                origin,
            ));
        }
        Ok(removed)
    }

    async fn hgetall(&self, key: &str) -> DriftResult<BTreeMap<String, StoredValue>> {
        self.with_key(key, |ks| match ks.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Entry { data: Data::Hash(fields), .. }) => Ok(fields.clone()),
            Some(_) => Err(wrong_type(key, "hash").into()),
        })
    }

    async fn resident_bytes(&self) -> DriftResult<u64> {
        let now = Instant::now();
        let guard = self
            .keyspace
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard
            .iter()
            .filter(|(_, e)| !e.is_expired(now))
            .map(|(k, e)| k.len() as u64 + e.approx_bytes())
            .sum())
    }

    async fn ping(&self) -> DriftResult<()> {
        self.keyspace
            .read()
            .map(|_| ())
            .map_err(|_| StoreError::LockPoisoned.into())
    }

    fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.tracking.subscribe()
    }
}
