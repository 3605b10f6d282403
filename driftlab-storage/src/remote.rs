//! Remote store capability.
//!
//! [`RemoteStore`] is the authoritative key space. Every mutation is
//! published on the tracking channel as an [`Invalidation`] so near-caches
//! can drop local copies. [`RemoteHandle`] is a client connection to the
//! store: it stamps its writes with an optional [`ClientId`] so a near-cache
//! can recognise (and skip) invalidations it caused itself.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use driftlab_core::DriftResult;
use tokio::sync::broadcast;
use tokio::time::Instant;
use uuid::Uuid;

use crate::value::StoredValue;

/// Remaining-TTL sentinel for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// Remaining-TTL sentinel for a key that exists without expiry.
pub const TTL_PERSISTENT: i64 = -1;

// ============================================================================
// TRACKING
// ============================================================================

/// Identity of a connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationCause {
    Write,
    Delete,
    Expired,
}

/// Change notification for a key, or for one field of a map key.
#[derive(Debug, Clone)]
pub struct Invalidation {
    pub key: String,
    /// `None` invalidates every field cached under `key`.
    pub field: Option<String>,
    pub cause: InvalidationCause,
    pub origin: Option<ClientId>,
    pub published_at: Instant,
}

impl Invalidation {
    pub fn new(
        key: impl Into<String>,
        field: Option<String>,
        cause: InvalidationCause,
        origin: Option<ClientId>,
    ) -> Self {
        Self {
            key: key.into(),
            field,
            cause,
            origin,
            published_at: Instant::now(),
        }
    }
}

// ============================================================================
// CAPABILITY
// ============================================================================

/// Authoritative remote key space.
///
/// Single-value keys and map keys share one namespace; using a key with the
/// wrong kind of operation fails with `StoreError::WrongType`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> DriftResult<Option<String>>;

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
        origin: Option<ClientId>,
    ) -> DriftResult<()>;

    async fn delete(&self, key: &str, origin: Option<ClientId>) -> DriftResult<bool>;

    /// Set a TTL on an existing key. Returns false if the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> DriftResult<bool>;

    /// Remaining TTL in milliseconds, or [`TTL_MISSING`] / [`TTL_PERSISTENT`].
    async fn remaining_ttl_millis(&self, key: &str) -> DriftResult<i64>;

    async fn hget(&self, key: &str, field: &str) -> DriftResult<Option<StoredValue>>;

    async fn hset(
        &self,
        key: &str,
        field: &str,
        value: StoredValue,
        origin: Option<ClientId>,
    ) -> DriftResult<()>;

    async fn hdel(&self, key: &str, field: &str, origin: Option<ClientId>) -> DriftResult<bool>;

    async fn hgetall(&self, key: &str) -> DriftResult<BTreeMap<String, StoredValue>>;

    /// Approximate bytes currently held by the store.
    async fn resident_bytes(&self) -> DriftResult<u64>;

    async fn ping(&self) -> DriftResult<()>;

    /// Subscribe to the tracking channel.
    fn subscribe(&self) -> broadcast::Receiver<Invalidation>;
}

// ============================================================================
// HANDLE
// ============================================================================

/// A client connection to a [`RemoteStore`].
#[derive(Clone)]
pub struct RemoteHandle {
    store: Arc<dyn RemoteStore>,
    origin: Option<ClientId>,
}

impl RemoteHandle {
    /// Connection whose writes carry no client identity.
    pub fn anonymous(store: Arc<dyn RemoteStore>) -> Self {
        Self { store, origin: None }
    }

    /// Connection whose writes are attributed to `client`.
    pub fn for_client(store: Arc<dyn RemoteStore>, client: ClientId) -> Self {
        Self {
            store,
            origin: Some(client),
        }
    }

    pub fn origin(&self) -> Option<ClientId> {
        self.origin
    }

    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }

    pub async fn get(&self, key: &str) -> DriftResult<Option<String>> {
        self.store.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> DriftResult<()> {
        self.store.set(key, value, ttl, self.origin).await
    }

    pub async fn delete(&self, key: &str) -> DriftResult<bool> {
        self.store.delete(key, self.origin).await
    }

    pub async fn expire(&self, key: &str, ttl: Duration) -> DriftResult<bool> {
        self.store.expire(key, ttl).await
    }

    pub async fn remaining_ttl_millis(&self, key: &str) -> DriftResult<i64> {
        self.store.remaining_ttl_millis(key).await
    }

    pub async fn hget(&self, key: &str, field: &str) -> DriftResult<Option<StoredValue>> {
        self.store.hget(key, field).await
    }

    pub async fn hset(&self, key: &str, field: &str, value: StoredValue) -> DriftResult<()> {
        self.store.hset(key, field, value, self.origin).await
    }

    pub async fn hdel(&self, key: &str, field: &str) -> DriftResult<bool> {
        self.store.hdel(key, field, self.origin).await
    }

    pub async fn hgetall(&self, key: &str) -> DriftResult<BTreeMap<String, StoredValue>> {
        self.store.hgetall(key).await
    }

    pub async fn resident_bytes(&self) -> DriftResult<u64> {
        self.store.resident_bytes().await
    }

    pub async fn ping(&self) -> DriftResult<()> {
        self.store.ping().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Invalidation> {
        self.store.subscribe()
    }
}
