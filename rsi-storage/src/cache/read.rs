//! Outcome of an aggregate cache read.

use std::sync::Arc;
use std::time::Duration;

use rsi_core::{AggregateSnapshot, CatalogError};

/// Result of [`super::AggregateCache::read`], carrying where the data came
/// from.
#[derive(Debug, Clone)]
pub enum AggregateRead {
    /// A refresh ran for this read and succeeded.
    Refreshed(Arc<AggregateSnapshot>),

    /// Served from memory without touching the store.
    Cached {
        snapshot: Arc<AggregateSnapshot>,
        /// Time left before the snapshot becomes eligible for refresh.
        expires_in: Duration,
    },

    /// The refresh failed; the last good snapshot is served instead.
    Stale {
        snapshot: Arc<AggregateSnapshot>,
        error: CatalogError,
    },

    /// The refresh failed and nothing has ever been cached.
    Unavailable { error: CatalogError },
}

impl AggregateRead {
    /// The snapshot to serve, if any.
    pub fn snapshot(&self) -> Option<&Arc<AggregateSnapshot>> {
        match self {
            AggregateRead::Refreshed(snapshot)
            | AggregateRead::Cached { snapshot, .. }
            | AggregateRead::Stale { snapshot, .. } => Some(snapshot),
            AggregateRead::Unavailable { .. } => None,
        }
    }

    /// Whether the snapshot predates this read.
    pub fn served_from_cache(&self) -> bool {
        matches!(
            self,
            AggregateRead::Cached { .. } | AggregateRead::Stale { .. }
        )
    }

    /// The refresh failure, if one occurred.
    pub fn error(&self) -> Option<&CatalogError> {
        match self {
            AggregateRead::Stale { error, .. } | AggregateRead::Unavailable { error } => {
                Some(error)
            }
            _ => None,
        }
    }

    /// Short label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            AggregateRead::Refreshed(_) => "refreshed",
            AggregateRead::Cached { .. } => "cached",
            AggregateRead::Stale { .. } => "stale",
            AggregateRead::Unavailable { .. } => "unavailable",
        }
    }
}

/// Counters describing how an aggregate cache has been serving reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from a fresh snapshot.
    pub hits: u64,
    /// Refresh attempts against the store.
    pub refreshes: u64,
    /// Failed refresh attempts.
    pub failures: u64,
    /// Reads that waited on another caller's refresh.
    pub coalesced: u64,
}

impl CacheStats {
    /// Fraction of reads that did not pay for a refresh (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.coalesced + self.refreshes;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.coalesced) as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rsi_core::References;

    fn snapshot() -> Arc<AggregateSnapshot> {
        Arc::new(AggregateSnapshot::assemble(&[], References::default(), Utc::now()))
    }

    #[test]
    fn test_accessors() {
        let refreshed = AggregateRead::Refreshed(snapshot());
        assert!(!refreshed.served_from_cache());
        assert!(refreshed.error().is_none());

        let stale = AggregateRead::Stale {
            snapshot: snapshot(),
            error: CatalogError::unavailable("down"),
        };
        assert!(stale.served_from_cache());
        assert!(stale.snapshot().is_some());
        assert!(stale.error().is_some());

        let cold = AggregateRead::Unavailable {
            error: CatalogError::unavailable("down"),
        };
        assert!(cold.snapshot().is_none());
        assert!(!cold.served_from_cache());
        assert_eq!(cold.outcome(), "unavailable");
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 6,
            refreshes: 2,
            failures: 1,
            coalesced: 2,
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);
        assert!((CacheStats::default().hit_rate() - 0.0).abs() < 0.001);
    }
}
