//! RSI Test Utilities
//!
//! Shared test infrastructure for the RSI workspace:
//! - Proptest generators for catalog entity types
//! - Fixtures for in-memory catalogs and common drafts
//! - An outage assertion over `CatalogResult`

// Re-export the in-process store from its source crate
pub use rsi_storage::{Catalog, CatalogStore, InMemoryStore};

// Re-export core types for convenience
pub use rsi_core::{
    AggregateSnapshot, CatalogError, CatalogResult, EntityIdType, Product, ProductDraft, ProductId,
    ProductView, ReferenceItem, ReferenceItemId, ReferenceKind, References, StorageError,
    Timestamp, ValidationError,
};

use std::sync::Arc;

use proptest::prelude::*;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating catalog entities.

    use super::*;

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_reference_item_id() -> impl Strategy<Value = ReferenceItemId> {
        arb_uuid().prop_map(ReferenceItemId::new)
    }

    /// Generate an already-trimmed, non-blank display name.
    pub fn arb_display_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9#-]{1,12}( [A-Za-z0-9#-]{1,12}){0,2}"
    }

    pub fn arb_reference_kind() -> impl Strategy<Value = ReferenceKind> {
        prop_oneof![
            Just(ReferenceKind::Origin),
            Just(ReferenceKind::Color),
            Just(ReferenceKind::Type),
            Just(ReferenceKind::Category),
            Just(ReferenceKind::RawMaterial),
            Just(ReferenceKind::ManufacturingProcess),
        ]
    }

    /// Generate a list of raw reference id strings, valid UUIDs only.
    pub fn arb_raw_ids() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_uuid().prop_map(|u| u.to_string()), 0..3)
    }

    /// Generate a product draft with random (mostly unknown) reference ids.
    pub fn arb_product_draft() -> impl Strategy<Value = ProductDraft> {
        (
            arb_display_name(),
            "https://example\\.com/[a-z]{1,10}",
            "[ -~]{0,64}",
            prop::collection::vec(arb_raw_ids(), 6),
        )
            .prop_map(|(name, link, description, mut lists)| {
                let mut references = References::default();
                for kind in ReferenceKind::ALL {
                    references.set(kind, lists.pop().unwrap_or_default());
                }
                ProductDraft {
                    name,
                    link,
                    description,
                    references,
                }
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;

    /// An empty in-memory store and a catalog over it.
    ///
    /// The store handle stays available for outage and latency simulation.
    pub fn memory_catalog() -> (Arc<InMemoryStore>, Catalog) {
        let store = Arc::new(InMemoryStore::new());
        let catalog = Catalog::new(store.clone());
        (store, catalog)
    }

    /// A draft with the given name and no references.
    pub fn product_draft(name: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            link: format!("https://example.com/{}", name.to_lowercase().replace(' ', "-")),
            description: format!("{} description", name),
            references: References::default(),
        }
    }

    /// A draft referencing the given items, one collection per pair.
    pub fn draft_referencing(
        name: &str,
        refs: &[(ReferenceKind, ReferenceItemId)],
    ) -> ProductDraft {
        let mut draft = product_draft(name);
        for (kind, id) in refs {
            draft.references.get_mut(*kind).push(id.to_string());
        }
        draft
    }

    /// JSON body for a product create/update request.
    pub fn draft_json(draft: &ProductDraft) -> serde_json::Value {
        serde_json::to_value(draft).unwrap_or(serde_json::Value::Null)
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for catalog error variants.

    use super::*;

    /// Assert that a CatalogResult means the store could not be reached.
    #[track_caller]
    pub fn assert_unavailable<T: std::fmt::Debug>(result: &CatalogResult<T>) {
        match result {
            Err(e) if e.is_unavailable() => {}
            other => panic!("Expected Unavailable storage error, got: {:?}", other),
        }
    }
}
