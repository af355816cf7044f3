//! RSI Storage - Store Trait, Catalog Operations and Aggregate Cache
//!
//! Defines the persistence seam ([`CatalogStore`]), an in-process
//! implementation used by tests and local runs, the catalog operations
//! built on top of any store, and the read-through aggregate cache.
//! The PostgreSQL implementation lives in rsi-api.

pub mod cache;
pub mod catalog;
pub mod memory;
pub mod resolve;
pub mod seed;

pub use cache::{AggregateCache, AggregateRead, CacheStats, SnapshotSource};
pub use catalog::Catalog;
pub use memory::InMemoryStore;
pub use resolve::resolve_references;
pub use seed::DEFAULT_REFERENCES;

use async_trait::async_trait;
use rsi_core::{CatalogResult, Product, ProductId, ReferenceItem, ReferenceItemId, ReferenceKind};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Persistence for the six reference collections and products.
///
/// Implementations return reference lists oldest first and product lists
/// newest first. "Missing" is reported through `Option`/`bool` returns;
/// `Err` is reserved for store failures.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // ========================================================================
    // REFERENCE OPERATIONS
    // ========================================================================

    /// List every item of a collection, ordered by `created_at` ascending.
    async fn reference_list(&self, kind: ReferenceKind) -> CatalogResult<Vec<ReferenceItem>>;

    /// Get one item by id.
    async fn reference_get(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<Option<ReferenceItem>>;

    /// Fetch the subset of `ids` that exist in the collection.
    ///
    /// Order of the result is unspecified.
    async fn reference_find_many(
        &self,
        kind: ReferenceKind,
        ids: &[ReferenceItemId],
    ) -> CatalogResult<Vec<ReferenceItem>>;

    /// Insert a new item.
    async fn reference_insert(&self, kind: ReferenceKind, item: &ReferenceItem)
        -> CatalogResult<()>;

    /// Replace an item's display name, returning the updated item.
    async fn reference_rename(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
        display_name: &str,
    ) -> CatalogResult<Option<ReferenceItem>>;

    /// Delete one item. Returns false when it did not exist.
    async fn reference_delete(&self, kind: ReferenceKind, id: ReferenceItemId)
        -> CatalogResult<bool>;

    /// Delete every item of a collection, returning how many were removed.
    async fn reference_clear(&self, kind: ReferenceKind) -> CatalogResult<u64>;

    /// Number of items in a collection.
    async fn reference_count(&self, kind: ReferenceKind) -> CatalogResult<u64>;

    // ========================================================================
    // PRODUCT OPERATIONS
    // ========================================================================

    /// List every product with bare reference ids, newest first.
    async fn product_list(&self) -> CatalogResult<Vec<Product>>;

    /// Get one product by id.
    async fn product_get(&self, id: ProductId) -> CatalogResult<Option<Product>>;

    /// Insert a new product.
    async fn product_insert(&self, product: &Product) -> CatalogResult<()>;

    /// Replace every field of an existing product. Returns false when absent.
    async fn product_replace(&self, product: &Product) -> CatalogResult<bool>;

    /// Delete one product. Returns false when it did not exist.
    async fn product_delete(&self, id: ProductId) -> CatalogResult<bool>;

    /// Delete every product, returning how many were removed.
    async fn product_clear(&self) -> CatalogResult<u64>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> CatalogResult<()>;
}
