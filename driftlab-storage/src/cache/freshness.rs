//! Freshness contracts for near-cache reads.
//!
//! Callers state how stale a local copy may be, and every read comes back
//! wrapped in [`CacheRead<T>`] so the caller can see whether it was served
//! locally and how old the local copy was.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Freshness requirement for near-cache reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Freshness {
    /// Serve the local copy if it is no older than `max_staleness`.
    ///
    /// Invalidation is still honoured: a copy dropped by the tracking
    /// channel is never served regardless of its age.
    BestEffort {
        /// Maximum acceptable age of the local copy.
        max_staleness: Duration,
    },

    /// Skip the local layer, read the remote store and refresh the local copy.
    #[default]
    Consistent,
}

impl Freshness {
    pub fn best_effort(max_staleness: Duration) -> Self {
        Self::BestEffort { max_staleness }
    }

    pub fn consistent() -> Self {
        Self::Consistent
    }

    pub fn is_best_effort(&self) -> bool {
        matches!(self, Self::BestEffort { .. })
    }

    pub fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }

    /// Max staleness for BestEffort, zero for Consistent.
    pub fn max_staleness(&self) -> Duration {
        match self {
            Self::BestEffort { max_staleness } => *max_staleness,
            Self::Consistent => Duration::ZERO,
        }
    }
}

/// Result of a near-cache read, carrying where it came from.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
    value: T,
    /// When the local copy was loaded (or now, for a remote read).
    cached_at: DateTime<Utc>,
    was_cache_hit: bool,
}

impl<T> CacheRead<T> {
    /// Read served from the local layer.
    pub fn from_cache(value: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            was_cache_hit: true,
        }
    }

    /// Read served by the remote store.
    pub fn from_remote(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// Age of the data at the time of the call.
    pub fn staleness(&self) -> Duration {
        (Utc::now() - self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }

    pub fn map<U, F>(self, f: F) -> CacheRead<U>
    where
        F: FnOnce(T) -> U,
    {
        CacheRead {
            value: f(self.value),
            cached_at: self.cached_at,
            was_cache_hit: self.was_cache_hit,
        }
    }
}

impl<T> AsRef<T> for CacheRead<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_variants() {
        let f = Freshness::best_effort(Duration::from_secs(60));
        assert!(f.is_best_effort());
        assert_eq!(f.max_staleness(), Duration::from_secs(60));

        let f = Freshness::default();
        assert!(f.is_consistent());
        assert_eq!(f.max_staleness(), Duration::ZERO);
    }

    #[test]
    fn test_cache_read_hit_and_miss() {
        let hit = CacheRead::from_cache("v", Utc::now());
        assert!(hit.was_cache_hit());

        let miss = CacheRead::from_remote(42);
        assert!(miss.was_cache_miss());
        assert_eq!(miss.into_value(), 42);
    }

    #[test]
    fn test_cache_read_staleness() {
        let past = Utc::now() - chrono::Duration::seconds(5);
        let read = CacheRead::from_cache("v", past);
        let staleness = read.staleness();
        assert!(staleness >= Duration::from_secs(4));
        assert!(staleness <= Duration::from_secs(10));
    }

    #[test]
    fn test_cache_read_map_keeps_origin() {
        let read = CacheRead::from_cache(7, Utc::now()).map(|v| v.to_string());
        assert!(read.was_cache_hit());
        assert_eq!(read.value(), "7");
    }
}
