//! End-to-end smoke tests against PostgreSQL.
//!
//! Run with `--features db-tests` and the `RSI_DB_*` variables pointing at a
//! scratch database; every collection is cleared first.

#![cfg(feature = "db-tests")]

#[path = "support/db.rs"]
mod db_support;

use std::sync::Arc;
use std::time::Duration;

use db_support::test_pg_store;
use rsi_storage::{AggregateCache, AggregateRead};
use rsi_test_utils::{fixtures, Catalog, CatalogStore, EntityIdType, ReferenceItemId, ReferenceKind};

#[tokio::test]
async fn smoke_test_full_catalog_chain() {
    let store = Arc::new(test_pg_store().await);
    let catalog = Catalog::new(store.clone());

    catalog.product_reset().await.unwrap();
    for kind in ReferenceKind::ALL {
        catalog.reference_reset(kind).await.unwrap();
    }

    // Seeding fills every empty collection exactly once
    let inserted = catalog.seed_defaults().await.unwrap();
    assert!(inserted >= ReferenceKind::ALL.len());
    assert_eq!(catalog.seed_defaults().await.unwrap(), 0);

    let origins = catalog.reference_list(ReferenceKind::Origin).await.unwrap();
    let names: Vec<_> = origins.iter().map(|o| o.display_name.as_str()).collect();
    assert_eq!(names, ["Pakistan", "Iran", "Afghanistan", "India", "Turkey"]);

    // Rename keeps identity
    let india = origins[3].clone();
    let renamed = catalog
        .reference_rename(ReferenceKind::Origin, india.id, "Bharat")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(renamed.id, india.id);
    assert_eq!(renamed.created_at, india.created_at);

    // Product with one real and one dangling reference
    let colors = catalog.reference_list(ReferenceKind::Color).await.unwrap();
    let draft = fixtures::draft_referencing(
        "Smoke Rug",
        &[
            (ReferenceKind::Origin, india.id),
            (ReferenceKind::Color, colors[0].id),
            (ReferenceKind::Color, ReferenceItemId::now_v7()),
        ],
    );
    let product = catalog.product_add(&draft).await.unwrap();
    assert_eq!(product.references.colors, vec![colors[0].id]);

    let view = catalog.product_get(product.id).await.unwrap().unwrap();
    assert_eq!(view.references.origins[0].display_name, "Bharat");

    // Aggregate through a cache
    let cache = AggregateCache::new(Duration::from_secs(60));
    let read = cache.read(&catalog).await;
    assert!(matches!(read, AggregateRead::Refreshed(_)));
    let snapshot = read.snapshot().unwrap();
    assert_eq!(snapshot.products.len(), 1);
    assert_eq!(snapshot.references.origins.len(), 5);
    assert!(cache.read(&catalog).await.served_from_cache());

    // Cleanup
    assert!(catalog.product_delete(product.id).await.unwrap());
    assert!(catalog.product_get(product.id).await.unwrap().is_none());
    assert!(store.ping().await.is_ok());
}
