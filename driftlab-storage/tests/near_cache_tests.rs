//! Near-Cache Tracking Tests
//!
//! The near-cache holds a stale copy until the invalidation for a remote
//! write has propagated, then serves the remote value. Self-originated
//! invalidations are ignored under NOLOOP, a lagged tracking receiver
//! clears everything, and capacity evicts the oldest entry.

use std::sync::Arc;
use std::time::Duration;

use driftlab_core::DriftResult;
use driftlab_storage::{
    Freshness, InMemoryRemoteStore, NearCache, NearCacheOptions, NearCachedBucket, NearCachedMap,
    RemoteHandle, RemoteStore, StoredValue,
};

// ============================================================================
// HELPERS
// ============================================================================

fn connect_map(
    store: &Arc<InMemoryRemoteStore>,
    options: NearCacheOptions,
) -> (NearCachedMap, RemoteHandle) {
    let shared: Arc<dyn RemoteStore> = store.clone();
    let cache = NearCache::connect("test:map", Arc::clone(&shared), options);
    (NearCachedMap::new(cache), RemoteHandle::anonymous(shared))
}

fn text(value: &str) -> Option<StoredValue> {
    Some(StoredValue::text(value))
}

// ============================================================================
// PROPAGATION
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stale_until_propagation_delay_elapses() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let options = NearCacheOptions::map_preset().with_propagation_delay(Duration::from_millis(300));
    let (map, remote) = connect_map(&store, options);

    map.put("k", "v1").await?;
    remote.hset("test:map", "k", StoredValue::text("v2")).await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(map.get("k").await?, text("v1"));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!map.near_cache().is_cached("k"));
    assert_eq!(map.get("k").await?, text("v2"));
    assert_eq!(map.stats().invalidations, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_noloop_ignores_own_writes() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let (map, _) = connect_map(&store, NearCacheOptions::map_preset());
    map.put("k", "v1").await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(map.near_cache().is_cached("k"));
    assert_eq!(map.stats().invalidations, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_without_noloop_own_writes_invalidate() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let (map, _) = connect_map(&store, NearCacheOptions::map_preset().with_noloop(false));
    map.put("k", "v1").await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!map.near_cache().is_cached("k"));
    assert_eq!(map.get("k").await?, text("v1"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_other_keys_do_not_invalidate() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let (map, remote) = connect_map(&store, NearCacheOptions::map_preset());
    map.put("k", "v1").await?;
    remote.hset("test:other", "k", StoredValue::text("x")).await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(map.near_cache().is_cached("k"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lagged_receiver_clears_local_layer() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::with_tracking_capacity(1));
    let (map, remote) = connect_map(&store, NearCacheOptions::map_preset());
    map.put("a", "1").await?;
    for i in 0..4 {
        remote
            .hset("test:map", "other", StoredValue::text(i.to_string()))
            .await?;
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!map.near_cache().is_cached("a"));
    assert!(map.stats().invalidations >= 1);
    Ok(())
}

// ============================================================================
// LOCAL LAYER
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_capacity_evicts_oldest_entry() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let (map, _) = connect_map(&store, NearCacheOptions::map_preset().with_max_entries(2));
    for field in ["a", "b", "c"] {
        map.put(field, field).await?;
        tokio::time::advance(Duration::from_millis(1)).await;
    }

    assert_eq!(map.near_cache().local_len(), 2);
    assert!(!map.near_cache().is_cached("a"));
    assert!(map.near_cache().is_cached("c"));
    assert_eq!(map.stats().evictions, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_consistent_read_bypasses_local_copy() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let options = NearCacheOptions::map_preset().with_propagation_delay(Duration::from_secs(10));
    let (map, remote) = connect_map(&store, options);
    map.put("k", "v1").await?;
    remote.hset("test:map", "k", StoredValue::text("v2")).await?;

    let stale = map.read("k", Freshness::best_effort(Duration::from_secs(60))).await?;
    assert!(stale.was_cache_hit());
    assert_eq!(stale.into_value(), text("v1"));

    let fresh = map.read("k", Freshness::consistent()).await?;
    assert!(fresh.was_cache_miss());
    assert_eq!(fresh.into_value(), text("v2"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_read_all_replaces_local_copies() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let options = NearCacheOptions::map_preset().with_propagation_delay(Duration::from_secs(10));
    let (map, remote) = connect_map(&store, options);
    map.put("x", "old").await?;
    remote.hset("test:map", "x", StoredValue::text("new")).await?;
    remote.hset("test:map", "y", StoredValue::text("2")).await?;

    let all = map.read_all().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(map.near_cache().local_len(), 2);
    assert_eq!(map.get("x").await?, text("new"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_local_ttl_expires_entries() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let options = NearCacheOptions::map_preset().with_local_ttl(Duration::from_millis(50));
    let (map, _) = connect_map(&store, options);
    map.put("k", "v").await?;

    tokio::time::advance(Duration::from_millis(100)).await;
    assert_eq!(map.get("k").await?, text("v"));
    let stats = map.stats();
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.misses, 1);
    Ok(())
}

// ============================================================================
// BUCKET
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_bucket_server_expiry_reaches_near_cache() -> DriftResult<()> {
    let store = Arc::new(InMemoryRemoteStore::new());
    let reaper = store.spawn_reaper(Duration::from_millis(20));
    let shared: Arc<dyn RemoteStore> = store.clone();
    let bucket = NearCachedBucket::new(NearCache::connect(
        "test:bucket",
        shared,
        NearCacheOptions::bucket_preset(),
    ));

    bucket.set("v", Some(Duration::from_millis(100))).await?;
    assert_eq!(bucket.get().await?, Some("v".to_string()));
    assert!(bucket.remaining_ttl_millis().await? > 0);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!bucket.near_cache().is_cached(""));
    assert_eq!(bucket.get().await?, None);
    assert_eq!(bucket.remaining_ttl_millis().await?, -2);
    reaper.abort();
    Ok(())
}

#[tokio::test]
async fn test_bucket_rejects_zero_ttl() {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryRemoteStore::new());
    let bucket = NearCachedBucket::new(NearCache::connect(
        "test:bucket",
        store,
        NearCacheOptions::bucket_preset(),
    ));
    let result = bucket.set("v", Some(Duration::ZERO)).await;
    assert!(matches!(result, Err(e) if e.kind() == "ValidationError"));
}

// ============================================================================
// PROPERTIES
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime builds")
    }

    proptest! {
        /// The remote field always holds the last value written to it.
        #[test]
        fn prop_remote_hash_is_last_write_wins(values in prop::collection::vec("[a-z0-9]{1,8}", 1..20)) {
            let observed = runtime().block_on(async {
                let store = Arc::new(InMemoryRemoteStore::new());
                let remote = RemoteHandle::anonymous(store.clone());
                for value in &values {
                    remote.hset("prop:map", "field", StoredValue::text(value.as_str())).await?;
                }
                remote.hget("prop:map", "field").await
            });

            let expected = values.last().map(|v| StoredValue::text(v.as_str()));
            prop_assert_eq!(observed.ok().flatten(), expected);
        }

        /// Plain keys behave the same way and never count twice.
        #[test]
        fn prop_string_keys_count_once(values in prop::collection::vec("[a-z]{1,6}", 1..10)) {
            let (last, len) = runtime().block_on(async {
                let store = Arc::new(InMemoryRemoteStore::new());
                let remote = RemoteHandle::anonymous(store.clone());
                for value in &values {
                    remote.set("prop:key", value, None).await?;
                }
                let last = remote.get("prop:key").await?;
                DriftResult::Ok((last, store.len()?))
            }).expect("store operations succeed");

            prop_assert_eq!(last.as_deref(), values.last().map(String::as_str));
            prop_assert_eq!(len, 1);
        }
    }
}
