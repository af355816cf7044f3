//! Read-through cache for the aggregate catalog snapshot.
//!
//! One [`AggregateCache`] is built per front door and injected into its
//! handlers. A snapshot younger than the TTL is served without touching the
//! store. An expired or missing snapshot triggers a single in-flight refresh
//! that concurrent callers wait on. When a refresh fails the last good
//! snapshot is served with the failure attached.
//!
//! # Example
//!
//! ```ignore
//! let cache = AggregateCache::new(Duration::from_secs(300));
//! match cache.read(&catalog).await {
//!     AggregateRead::Unavailable { error } => return Err(error.into()),
//!     read => render(read.snapshot()),
//! }
//! ```

pub mod aggregate;
pub mod read;

pub use aggregate::AggregateCache;
pub use read::{AggregateRead, CacheStats};

use async_trait::async_trait;
use rsi_core::{AggregateSnapshot, CatalogResult};

/// Producer of fresh aggregate snapshots.
///
/// Implemented by [`crate::Catalog`]; tests provide scripted sources.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Read every collection and assemble a snapshot.
    async fn load_snapshot(&self) -> CatalogResult<AggregateSnapshot>;
}
