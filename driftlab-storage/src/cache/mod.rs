//! Near-cache layer with explicit freshness.
//!
//! A [`NearCache`] holds client-local copies of one remote key and drops
//! them when the tracking channel reports a change. Staleness is explicit:
//! reads take a [`Freshness`] and return [`CacheRead<T>`], which records
//! whether the value came from the local layer and how old it was.
//!
//! # Example
//!
//! ```ignore
//! let cache = NearCache::connect("scenario:csc-map", store, NearCacheOptions::map_preset());
//! let map = NearCachedMap::new(cache);
//!
//! map.put("k1", "v1").await?;
//! let read = map.read("k1", Freshness::best_effort(Duration::from_secs(60))).await?;
//! assert!(read.was_cache_hit());
//! ```

pub mod freshness;
pub mod near;
pub mod options;
pub mod stats;
pub mod views;

pub use freshness::{CacheRead, Freshness};
pub use near::NearCache;
pub use options::NearCacheOptions;
pub use stats::CacheStats;
pub use views::{NearCachedBucket, NearCachedMap};
