//! Product REST Routes
//!
//! Reference ids submitted with a product are resolved before storage;
//! ids that do not resolve are dropped rather than rejected.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rsi_core::{ProductDraft, ProductId};
use rsi_storage::Catalog;

use crate::{
    error::{ApiError, ApiResult},
    extractors::PathId,
    state::AppState,
    types::DeletedResponse,
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/product and /api/product/list - Every product, newest first
pub async fn list_products(State(catalog): State<Catalog>) -> ApiResult<impl IntoResponse> {
    let products = catalog.product_list().await?;
    Ok(Json(products))
}

/// POST /api/product - Create a product
pub async fn create_product(
    State(catalog): State<Catalog>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(draft) = payload?;
    let product = catalog.product_add(&draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// DELETE /api/product - Remove every product
pub async fn reset_products(State(catalog): State<Catalog>) -> ApiResult<impl IntoResponse> {
    let deleted = catalog.product_reset().await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// GET /api/product/{id} - One product with references expanded
pub async fn get_product(
    State(catalog): State<Catalog>,
    PathId(id): PathId<ProductId>,
) -> ApiResult<impl IntoResponse> {
    let product = catalog
        .product_get(id)
        .await?
        .ok_or_else(|| ApiError::product_not_found(id))?;

    Ok(Json(product))
}

/// PUT /api/product/{id} - Replace a product
pub async fn update_product(
    State(catalog): State<Catalog>,
    PathId(id): PathId<ProductId>,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(draft) = payload?;
    let product = catalog
        .product_update(id, &draft)
        .await?
        .ok_or_else(|| ApiError::product_not_found(id))?;

    Ok(Json(product))
}

/// DELETE /api/product/{id}
pub async fn delete_product(
    State(catalog): State<Catalog>,
    PathId(id): PathId<ProductId>,
) -> ApiResult<StatusCode> {
    if !catalog.product_delete(id).await? {
        return Err(ApiError::product_not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Product routes, to be nested under `/api/product`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product).delete(reset_products))
        .route("/list", get(list_products))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .with_state(state)
}
