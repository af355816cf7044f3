//! TTL cache with stale fallback and single-flight refresh.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use rsi_core::{AggregateSnapshot, CatalogError};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::read::{AggregateRead, CacheStats};
use super::SnapshotSource;

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<AggregateSnapshot>>,
    /// When the refresh that produced `snapshot` started.
    refreshed_at: Option<Instant>,
    /// Completed refresh attempts, successful or not.
    attempts: u64,
    /// Error of the most recent attempt; cleared on success.
    last_error: Option<CatalogError>,
}

impl CacheState {
    fn fresh(&self, ttl: Duration, now: Instant) -> Option<(Arc<AggregateSnapshot>, Duration)> {
        let snapshot = self.snapshot.as_ref()?;
        let age = now.saturating_duration_since(self.refreshed_at?);
        (age < ttl).then(|| (Arc::clone(snapshot), ttl - age))
    }
}

/// Aggregate snapshot cache owned by one front door.
///
/// The snapshot is replaced wholesale on refresh and handed out as an
/// `Arc`, so readers holding an older snapshot keep a complete view.
#[derive(Debug)]
pub struct AggregateCache {
    ttl: Duration,
    state: RwLock<CacheState>,
    /// Held for the duration of a refresh.
    in_flight: Mutex<()>,
    hits: AtomicU64,
    refreshes: AtomicU64,
    failures: AtomicU64,
    coalesced: AtomicU64,
}

impl AggregateCache {
    /// Create an empty cache. A zero TTL refreshes on every read while still
    /// falling back to the last good snapshot on failure.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState::default()),
            in_flight: Mutex::new(()),
            hits: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The current snapshot regardless of age.
    pub async fn current(&self) -> Option<Arc<AggregateSnapshot>> {
        self.state.read().await.snapshot.clone()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
        }
    }

    /// Serve the aggregate snapshot, refreshing from `source` when needed.
    ///
    /// Callers that arrive while a refresh is running wait for it and share
    /// its outcome instead of starting their own.
    pub async fn read<S>(&self, source: &S) -> AggregateRead
    where
        S: SnapshotSource + ?Sized,
    {
        let observed = {
            let state = self.state.read().await;
            if let Some((snapshot, expires_in)) = state.fresh(self.ttl, Instant::now()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return AggregateRead::Cached {
                    snapshot,
                    expires_in,
                };
            }
            state.attempts
        };

        let _in_flight = self.in_flight.lock().await;

        {
            let state = self.state.read().await;
            if state.attempts != observed {
                if let Some(read) = self.settled(&state) {
                    self.coalesced.fetch_add(1, Ordering::Relaxed);
                    return read;
                }
            }
        }

        self.refresh(source).await
    }

    /// Outcome of a refresh that completed while this caller was waiting.
    fn settled(&self, state: &CacheState) -> Option<AggregateRead> {
        let snapshot = state.snapshot.clone();
        match (&state.last_error, snapshot) {
            (Some(error), Some(snapshot)) => Some(AggregateRead::Stale {
                snapshot,
                error: error.clone(),
            }),
            (Some(error), None) => Some(AggregateRead::Unavailable {
                error: error.clone(),
            }),
            (None, Some(snapshot)) => {
                let expires_in = state
                    .fresh(self.ttl, Instant::now())
                    .map(|(_, left)| left)
                    .unwrap_or(Duration::ZERO);
                Some(AggregateRead::Cached {
                    snapshot,
                    expires_in,
                })
            }
            (None, None) => None,
        }
    }

    async fn refresh<S>(&self, source: &S) -> AggregateRead
    where
        S: SnapshotSource + ?Sized,
    {
        let started = Instant::now();
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(ttl_secs = self.ttl.as_secs(), "Refreshing aggregate snapshot");

        let result = source.load_snapshot().await;

        let mut state = self.state.write().await;
        state.attempts += 1;

        match result {
            Ok(mut snapshot) => {
                if let Some(previous) = &state.snapshot {
                    if snapshot.captured_at <= previous.captured_at {
                        snapshot.captured_at = previous.captured_at + TimeDelta::microseconds(1);
                    }
                }
                let snapshot = Arc::new(snapshot);
                state.snapshot = Some(Arc::clone(&snapshot));
                state.refreshed_at = Some(started);
                state.last_error = None;

                tracing::info!(
                    products = snapshot.products.len(),
                    references = snapshot.references.total_len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Aggregate snapshot refreshed"
                );
                AggregateRead::Refreshed(snapshot)
            }
            Err(error) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                state.last_error = Some(error.clone());

                match state.snapshot.clone() {
                    Some(snapshot) => {
                        tracing::warn!(
                            error = %error,
                            captured_at = %snapshot.captured_at,
                            "Aggregate refresh failed, serving stale snapshot"
                        );
                        AggregateRead::Stale { snapshot, error }
                    }
                    None => {
                        tracing::error!(
                            error = %error,
                            "Aggregate refresh failed with nothing cached"
                        );
                        AggregateRead::Unavailable { error }
                    }
                }
            }
        }
    }
}
