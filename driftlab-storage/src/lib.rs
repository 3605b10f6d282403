//! DRIFTLAB Storage - Remote Store, Near-Cache and Cluster Directory
//!
//! Defines the remote store capability and its in-memory implementation,
//! the near-cache layered over it, the store adapter scenarios talk to, and
//! the cluster directory read by topology inspection.

pub mod adapter;
pub mod cache;
pub mod cluster;
pub mod memory;
pub mod remote;
pub mod value;

pub use adapter::{AdapterStats, StoreAdapter, StoreConfig};
pub use cache::{
    CacheRead, CacheStats, Freshness, NearCache, NearCacheOptions, NearCachedBucket,
    NearCachedMap,
};
pub use cluster::{
    ClusterConfig, ClusterDirectory, ClusterNode, NodeSpec, SimulatedNode, StaticClusterDirectory,
};
pub use memory::{InMemoryRemoteStore, DEFAULT_TRACKING_CAPACITY};
pub use remote::{
    ClientId, Invalidation, InvalidationCause, RemoteHandle, RemoteStore, TTL_MISSING,
    TTL_PERSISTENT,
};
pub use value::{FieldMap, StoredValue};
