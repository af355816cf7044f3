//! Catalog operations over any [`CatalogStore`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::try_join_all;
use rsi_core::{
    normalize_display_name, AggregateSnapshot, CatalogError, CatalogResult, EntityIdType, Product,
    ProductDraft, ProductId, ProductView, ReferenceIndex, ReferenceItem, ReferenceItemId,
    ReferenceKind, References,
};
use tracing::Instrument;

use crate::cache::SnapshotSource;
use crate::resolve::resolve_references;
use crate::seed::defaults_for;
use crate::CatalogStore;

/// Data access layer used by the HTTP handlers and the aggregate cache.
///
/// # Dangling references
///
/// Deleting a reference item never touches products. A product keeps the
/// deleted id in storage; expanded views skip ids with no matching document.
/// The id is purged the next time the product is updated, because updates
/// re-resolve every submitted id.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    // ========================================================================
    // REFERENCE COLLECTIONS
    // ========================================================================

    /// Every item of a collection, oldest first.
    pub async fn reference_list(&self, kind: ReferenceKind) -> CatalogResult<Vec<ReferenceItem>> {
        self.store.reference_list(kind).await
    }

    pub async fn reference_get(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<Option<ReferenceItem>> {
        self.store.reference_get(kind, id).await
    }

    /// Add an item. The display name is trimmed and must not be blank.
    pub async fn reference_add(
        &self,
        kind: ReferenceKind,
        display_name: &str,
    ) -> CatalogResult<ReferenceItem> {
        let item = ReferenceItem::new(display_name)?;
        self.store.reference_insert(kind, &item).await?;
        tracing::info!(collection = %kind, id = %item.id, "Reference item added");
        Ok(item)
    }

    /// Replace an item's display name. Id and creation time are unchanged.
    pub async fn reference_rename(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
        display_name: &str,
    ) -> CatalogResult<Option<ReferenceItem>> {
        let display_name = normalize_display_name(display_name)?;
        self.store.reference_rename(kind, id, &display_name).await
    }

    /// Delete one item without cascading to products.
    pub async fn reference_delete(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<bool> {
        let deleted = self.store.reference_delete(kind, id).await?;
        if deleted {
            tracing::info!(collection = %kind, id = %id, "Reference item deleted");
        }
        Ok(deleted)
    }

    /// Delete every item of a collection.
    pub async fn reference_reset(&self, kind: ReferenceKind) -> CatalogResult<u64> {
        let removed = self.store.reference_clear(kind).await?;
        tracing::info!(collection = %kind, removed, "Reference collection cleared");
        Ok(removed)
    }

    // ========================================================================
    // PRODUCTS
    // ========================================================================

    /// Every product, newest first, with references expanded.
    pub async fn product_list(&self) -> CatalogResult<Vec<ProductView>> {
        let products = self.store.product_list().await?;
        let index = self.index_for(&products).await?;
        Ok(products.iter().map(|p| p.expand(&index)).collect())
    }

    /// One product with references expanded.
    pub async fn product_get(&self, id: ProductId) -> CatalogResult<Option<ProductView>> {
        let Some(product) = self.store.product_get(id).await? else {
            return Ok(None);
        };
        let index = self.index_for(std::slice::from_ref(&product)).await?;
        Ok(Some(product.expand(&index)))
    }

    /// One product as stored, with bare reference ids.
    pub async fn product_get_raw(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        self.store.product_get(id).await
    }

    /// Resolve a draft's references and persist it as a new product.
    ///
    /// The name is trimmed but may be empty; only reference display names
    /// are mandatory.
    pub async fn product_add(&self, draft: &ProductDraft) -> CatalogResult<Product> {
        let id = ProductId::now_v7();
        let references = resolve_references(self.store(), &draft.references)
            .instrument(tracing::debug_span!("resolve_references", product = %id))
            .await?;
        let product = Product {
            id,
            name: draft.name.trim().to_string(),
            link: draft.link.trim().to_string(),
            description: draft.description.clone(),
            references,
            created_at: Utc::now(),
        };
        self.store.product_insert(&product).await?;
        tracing::info!(id = %product.id, "Product added");
        Ok(product)
    }

    /// Replace every field of an existing product, re-resolving references.
    ///
    /// Id and creation time are kept. Returns `None` when the product does
    /// not exist.
    pub async fn product_update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> CatalogResult<Option<Product>> {
        let Some(existing) = self.store.product_get(id).await? else {
            return Ok(None);
        };
        let references = resolve_references(self.store(), &draft.references)
            .instrument(tracing::debug_span!("resolve_references", product = %id))
            .await?;
        let product = Product {
            id: existing.id,
            name: draft.name.trim().to_string(),
            link: draft.link.trim().to_string(),
            description: draft.description.clone(),
            references,
            created_at: existing.created_at,
        };
        if !self.store.product_replace(&product).await? {
            return Ok(None);
        }
        tracing::info!(id = %product.id, "Product updated");
        Ok(Some(product))
    }

    pub async fn product_delete(&self, id: ProductId) -> CatalogResult<bool> {
        let deleted = self.store.product_delete(id).await?;
        if deleted {
            tracing::info!(id = %id, "Product deleted");
        }
        Ok(deleted)
    }

    /// Delete every product.
    pub async fn product_reset(&self) -> CatalogResult<u64> {
        let removed = self.store.product_clear().await?;
        tracing::info!(removed, "Products cleared");
        Ok(removed)
    }

    // ========================================================================
    // AGGREGATE
    // ========================================================================

    /// Read all seven collections concurrently and assemble a snapshot.
    ///
    /// The first failing read fails the whole aggregate.
    pub async fn aggregate(&self) -> CatalogResult<AggregateSnapshot> {
        let captured_at = Utc::now();
        let store = self.store();
        let (products, origins, colors, types, categories, raw_materials, processes) =
            tokio::try_join!(
                store.product_list(),
                store.reference_list(ReferenceKind::Origin),
                store.reference_list(ReferenceKind::Color),
                store.reference_list(ReferenceKind::Type),
                store.reference_list(ReferenceKind::Category),
                store.reference_list(ReferenceKind::RawMaterial),
                store.reference_list(ReferenceKind::ManufacturingProcess),
            )?;

        let references = References {
            categories,
            raw_materials,
            origins,
            types,
            colors,
            processes,
        };
        Ok(AggregateSnapshot::assemble(&products, references, captured_at))
    }

    // ========================================================================
    // SEEDING
    // ========================================================================

    /// Insert the default reference items into every empty collection.
    ///
    /// Returns the number of items inserted.
    pub async fn seed_defaults(&self) -> CatalogResult<usize> {
        let mut inserted = 0;
        for kind in ReferenceKind::ALL {
            if self.store.reference_count(kind).await? > 0 {
                continue;
            }
            for name in defaults_for(kind) {
                self.reference_add(kind, name).await?;
                inserted += 1;
            }
        }
        if inserted > 0 {
            tracing::info!(inserted, "Seeded default reference data");
        }
        Ok(inserted)
    }

    /// Look up every reference id used by `products`.
    async fn index_for(&self, products: &[Product]) -> CatalogResult<ReferenceIndex> {
        let lookups = ReferenceKind::ALL.into_iter().map(|kind| {
            let mut seen = HashSet::new();
            let ids: Vec<ReferenceItemId> = products
                .iter()
                .flat_map(|p| p.references.get(kind).iter().copied())
                .filter(|id| seen.insert(*id))
                .collect();
            async move {
                if ids.is_empty() {
                    return Ok((kind, Vec::new()));
                }
                let items = self.store.reference_find_many(kind, &ids).await?;
                Ok::<_, CatalogError>((kind, items))
            }
        });

        let mut index = ReferenceIndex::new();
        for (kind, items) in try_join_all(lookups).await? {
            for item in items {
                index.insert(kind, item);
            }
        }
        Ok(index)
    }
}

#[async_trait]
impl SnapshotSource for Catalog {
    async fn load_snapshot(&self) -> CatalogResult<AggregateSnapshot> {
        self.aggregate().await
    }
}
