//! In-process store.
//!
//! Holds every collection in `RwLock`ed maps. Besides backing tests and
//! local runs it can simulate an unreachable or slow backing store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use rsi_core::{
    sort_by_creation, sort_newest_first, CatalogError, CatalogResult, EntityIdType, Product,
    ProductId, ReferenceItem, ReferenceItemId, ReferenceKind, StorageError,
};

use crate::CatalogStore;

type ReferenceTable = HashMap<ReferenceKind, HashMap<ReferenceItemId, ReferenceItem>>;

/// In-memory [`CatalogStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    references: RwLock<ReferenceTable>,
    products: RwLock<HashMap<ProductId, Product>>,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    list_calls: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StorageError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Delay every subsequent operation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of `reference_list` and `product_list` calls served so far.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of stored products.
    pub fn product_count(&self) -> usize {
        self.products.read().map(|p| p.len()).unwrap_or(0)
    }

    async fn enter(&self, operation: &str) -> CatalogResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::unavailable(format!(
                "in-memory store offline during {}",
                operation
            )));
        }
        Ok(())
    }

    fn refs_read(&self) -> CatalogResult<RwLockReadGuard<'_, ReferenceTable>> {
        self.references
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn refs_write(&self) -> CatalogResult<RwLockWriteGuard<'_, ReferenceTable>> {
        self.references
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn products_read(&self) -> CatalogResult<RwLockReadGuard<'_, HashMap<ProductId, Product>>> {
        self.products
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn products_write(&self) -> CatalogResult<RwLockWriteGuard<'_, HashMap<ProductId, Product>>> {
        self.products
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn reference_list(&self, kind: ReferenceKind) -> CatalogResult<Vec<ReferenceItem>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("reference_list").await?;
        let table = self.refs_read()?;
        let mut items: Vec<ReferenceItem> = table
            .get(&kind)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default();
        sort_by_creation(&mut items);
        Ok(items)
    }

    async fn reference_get(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<Option<ReferenceItem>> {
        self.enter("reference_get").await?;
        let table = self.refs_read()?;
        Ok(table.get(&kind).and_then(|items| items.get(&id)).cloned())
    }

    async fn reference_find_many(
        &self,
        kind: ReferenceKind,
        ids: &[ReferenceItemId],
    ) -> CatalogResult<Vec<ReferenceItem>> {
        self.enter("reference_find_many").await?;
        let table = self.refs_read()?;
        let Some(items) = table.get(&kind) else {
            return Ok(Vec::new());
        };
        let wanted: HashSet<&ReferenceItemId> = ids.iter().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }

    async fn reference_insert(
        &self,
        kind: ReferenceKind,
        item: &ReferenceItem,
    ) -> CatalogResult<()> {
        self.enter("reference_insert").await?;
        let mut table = self.refs_write()?;
        let items = table.entry(kind).or_default();
        if items.contains_key(&item.id) {
            return Err(StorageError::InsertFailed {
                collection: kind.collection().to_string(),
                reason: format!("{} {} already exists", ReferenceItemId::ENTITY_NAME, item.id),
            }
            .into());
        }
        items.insert(item.id, item.clone());
        Ok(())
    }

    async fn reference_rename(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
        display_name: &str,
    ) -> CatalogResult<Option<ReferenceItem>> {
        self.enter("reference_rename").await?;
        let mut table = self.refs_write()?;
        Ok(table
            .get_mut(&kind)
            .and_then(|items| items.get_mut(&id))
            .map(|item| {
                item.display_name = display_name.to_string();
                item.clone()
            }))
    }

    async fn reference_delete(
        &self,
        kind: ReferenceKind,
        id: ReferenceItemId,
    ) -> CatalogResult<bool> {
        self.enter("reference_delete").await?;
        let mut table = self.refs_write()?;
        Ok(table
            .get_mut(&kind)
            .map(|items| items.remove(&id).is_some())
            .unwrap_or(false))
    }

    async fn reference_clear(&self, kind: ReferenceKind) -> CatalogResult<u64> {
        self.enter("reference_clear").await?;
        let mut table = self.refs_write()?;
        Ok(table.remove(&kind).map(|items| items.len() as u64).unwrap_or(0))
    }

    async fn reference_count(&self, kind: ReferenceKind) -> CatalogResult<u64> {
        self.enter("reference_count").await?;
        let table = self.refs_read()?;
        Ok(table.get(&kind).map(|items| items.len() as u64).unwrap_or(0))
    }

    async fn product_list(&self) -> CatalogResult<Vec<Product>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("product_list").await?;
        let products = self.products_read()?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        sort_newest_first(&mut all);
        Ok(all)
    }

    async fn product_get(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        self.enter("product_get").await?;
        Ok(self.products_read()?.get(&id).cloned())
    }

    async fn product_insert(&self, product: &Product) -> CatalogResult<()> {
        self.enter("product_insert").await?;
        let mut products = self.products_write()?;
        if products.contains_key(&product.id) {
            return Err(StorageError::InsertFailed {
                collection: "products".to_string(),
                reason: format!("{} {} already exists", ProductId::ENTITY_NAME, product.id),
            }
            .into());
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn product_replace(&self, product: &Product) -> CatalogResult<bool> {
        self.enter("product_replace").await?;
        let mut products = self.products_write()?;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn product_delete(&self, id: ProductId) -> CatalogResult<bool> {
        self.enter("product_delete").await?;
        Ok(self.products_write()?.remove(&id).is_some())
    }

    async fn product_clear(&self) -> CatalogResult<u64> {
        self.enter("product_clear").await?;
        let mut products = self.products_write()?;
        let removed = products.len() as u64;
        products.clear();
        Ok(removed)
    }

    async fn ping(&self) -> CatalogResult<()> {
        self.enter("ping").await
    }
}
