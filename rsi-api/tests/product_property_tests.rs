//! Property-based tests for product reference resolution over HTTP.
//!
//! Whatever ids a client submits, a stored product only ever references
//! items that exist, in the order they were submitted.

#[path = "support/app.rs"]
mod app_support;

use app_support::test_app;
use axum::http::StatusCode;
use proptest::prelude::*;
use rsi_test_utils::{fixtures, generators, Product, ReferenceItemId, ReferenceKind, References};
use tokio::runtime::Runtime;

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

/// Reference items to create before posting, as (collection, display name).
fn existing_items_strategy() -> impl Strategy<Value = Vec<(ReferenceKind, String)>> {
    prop::collection::vec(
        (generators::arb_reference_kind(), generators::arb_display_name()),
        0..8,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_created_product_keeps_only_existing_ids(
        draft in generators::arb_product_draft(),
        existing in existing_items_strategy(),
        unknown in generators::arb_reference_item_id(),
    ) {
        let mut draft = draft;
        let rt = test_runtime()?;
        rt.block_on(async {
            let app = test_app();

            let mut expected: References<ReferenceItemId> = References::default();
            for (kind, name) in &existing {
                let item = app
                    .catalog
                    .reference_add(*kind, name)
                    .await
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                draft.references.get_mut(*kind).push(item.id.to_string());
                expected.get_mut(*kind).push(item.id);
            }
            draft.references.get_mut(ReferenceKind::Color).push(unknown.to_string());
            draft.references.get_mut(ReferenceKind::Origin).push("not-a-uuid".to_string());

            let (status, body) = app.post("/api/product", fixtures::draft_json(&draft)).await;
            prop_assert_eq!(status, StatusCode::CREATED);

            let created: Product = serde_json::from_value(body)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let stored = app
                .catalog
                .product_get_raw(created.id)
                .await
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert!(stored.is_some());

            for kind in ReferenceKind::ALL {
                prop_assert_eq!(created.references.get(kind), expected.get(kind));
            }
            prop_assert_eq!(created.name, draft.name.trim());
            Ok::<(), TestCaseError>(())
        })?;
    }
}
