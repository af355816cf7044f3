//! Product CRUD over HTTP.

#[path = "support/app.rs"]
mod app_support;

use app_support::{test_app, TestApp};
use axum::http::{Method, StatusCode};
use rsi_test_utils::{fixtures, EntityIdType, ProductId, ReferenceItem, ReferenceKind};
use serde_json::{json, Value};

async fn add(app: &TestApp, kind: ReferenceKind, name: &str) -> ReferenceItem {
    app.catalog.reference_add(kind, name).await.unwrap()
}

#[tokio::test]
async fn test_create_keeps_only_existing_references() {
    let app = test_app();
    let origin = add(&app, ReferenceKind::Origin, "India").await;
    let color = add(&app, ReferenceKind::Color, "#7D2A2A").await;
    let unknown = ProductId::now_v7().to_string();

    let (status, body) = app
        .post(
            "/api/product",
            json!({
                "name": "Jaipur Rug",
                "link": "https://example.com/jaipur",
                "description": "Wool rug",
                "origins": [origin.id.to_string(), unknown],
                "colors": color.id.to_string(),
                "categories": ["not-a-uuid"],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Jaipur Rug");
    assert_eq!(body["origins"], json!([origin.id.to_string()]));
    assert_eq!(body["colors"], json!([color.id.to_string()]));
    assert_eq!(body["categories"], json!([]));
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn test_create_accepts_legacy_field_names() {
    let app = test_app();
    let material = add(&app, ReferenceKind::RawMaterial, "wool").await;

    let (status, body) = app
        .post(
            "/api/product",
            json!({
                "ProductName": "Kashan",
                "Desc": "Silk and wool",
                "RawMaterial": material.id.to_string(),
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Kashan");
    assert_eq!(body["description"], "Silk and wool");
    assert_eq!(body["rawMaterials"], json!([material.id.to_string()]));
}

#[tokio::test]
async fn test_create_accepts_blank_name() {
    let app = test_app();

    let (status, body) = app
        .post("/api/product", json!({ "name": "  ", "link": "https://example.com" }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "");
    assert_eq!(app.store.product_count(), 1);

    let (status, body) = app.post("/api/product", json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "");
}

#[tokio::test]
async fn test_get_expands_references() {
    let app = test_app();
    let origin = add(&app, ReferenceKind::Origin, "Turkey").await;
    let process = add(&app, ReferenceKind::ManufacturingProcess, "Flat-woven").await;
    let draft = fixtures::draft_referencing(
        "Anatolian Kilim",
        &[
            (ReferenceKind::Origin, origin.id),
            (ReferenceKind::ManufacturingProcess, process.id),
        ],
    );
    let created = app.catalog.product_add(&draft).await.unwrap();

    let (status, body) = app.get(&format!("/api/product/{}", created.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origins"][0]["displayName"], "Turkey");
    assert_eq!(body["origins"][0]["id"], origin.id.to_string());
    assert_eq!(body["processes"][0]["displayName"], "Flat-woven");
}

#[tokio::test]
async fn test_deleted_reference_disappears_from_view() {
    let app = test_app();
    let origin = add(&app, ReferenceKind::Origin, "Iran").await;
    let draft = fixtures::draft_referencing("Tabriz", &[(ReferenceKind::Origin, origin.id)]);
    let created = app.catalog.product_add(&draft).await.unwrap();

    let (status, _) = app.delete(&format!("/api/origin/{}", origin.id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/api/product/{}", created.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["origins"], json!([]));

    // the stored document still carries the id until the next update
    let raw = app.catalog.product_get_raw(created.id).await.unwrap().unwrap();
    assert_eq!(raw.references.origins, vec![origin.id]);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = test_app();
    for name in ["First", "Second", "Third"] {
        let (status, _) = app
            .post("/api/product", fixtures::draft_json(&fixtures::product_draft(name)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, list) = app.get("/api/product").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, ["Third", "Second", "First"]);
}

#[tokio::test]
async fn test_update_replaces_fields_and_keeps_identity() {
    let app = test_app();
    let old_color = add(&app, ReferenceKind::Color, "Red").await;
    let new_color = add(&app, ReferenceKind::Color, "Blue").await;
    let draft = fixtures::draft_referencing("Heriz", &[(ReferenceKind::Color, old_color.id)]);
    let created = app.catalog.product_add(&draft).await.unwrap();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/product/{}", created.id),
            Some(json!({
                "name": "Heriz Serapi",
                "colors": [new_color.id.to_string()],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], created.id.to_string());
    assert_eq!(body["name"], "Heriz Serapi");
    assert_eq!(body["link"], "");
    assert_eq!(body["colors"], json!([new_color.id.to_string()]));
    let created_at: Value = serde_json::to_value(created.created_at).unwrap();
    assert_eq!(body["createdAt"], created_at);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = test_app();
    let missing = ProductId::now_v7();

    let (status, body) = app.get(&format!("/api/product/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PRODUCT_NOT_FOUND");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/product/{}", missing),
            Some(json!({ "name": "Ghost" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/product/{}", missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_product_id_is_bad_request() {
    let app = test_app();

    let (status, body) = app.get("/api/product/12345").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FORMAT");
    assert_eq!(body["details"]["path_param"], "12345");
}

#[tokio::test]
async fn test_delete_one_and_reset() {
    let app = test_app();
    let a = app
        .catalog
        .product_add(&fixtures::product_draft("Bokhara"))
        .await
        .unwrap();
    app.catalog
        .product_add(&fixtures::product_draft("Gabbeh"))
        .await
        .unwrap();

    let (status, _) = app.delete(&format!("/api/product/{}", a.id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.store.product_count(), 1);

    let (status, body) = app.delete("/api/product").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 1);
    assert_eq!(app.store.product_count(), 0);
}
