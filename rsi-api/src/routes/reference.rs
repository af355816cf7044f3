//! Reference Collection REST Routes
//!
//! The six reference collections share one handler set; each nested router
//! is bound to its [`ReferenceKind`] through its state.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rsi_core::{ReferenceItemId, ReferenceKind};
use rsi_storage::Catalog;

use crate::{
    error::{ApiError, ApiResult},
    extractors::PathId,
    types::{DeletedResponse, DisplayNameRequest},
};

// ============================================================================
// SHARED STATE
// ============================================================================

/// State for one collection's routes.
#[derive(Clone)]
pub struct ReferenceState {
    pub catalog: Catalog,
    pub kind: ReferenceKind,
}

fn submitted_name(kind: ReferenceKind, req: &DisplayNameRequest) -> ApiResult<&str> {
    req.display_name_for(kind)
        .ok_or_else(|| ApiError::missing_field("displayName"))
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/{slug} and /api/{slug}/list - Every item, oldest first
pub async fn list_items(State(state): State<Arc<ReferenceState>>) -> ApiResult<impl IntoResponse> {
    let items = state.catalog.reference_list(state.kind).await?;
    Ok(Json(items))
}

/// POST /api/{slug} - Add an item
pub async fn create_item(
    State(state): State<Arc<ReferenceState>>,
    payload: Result<Json<DisplayNameRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let name = submitted_name(state.kind, &req)?;
    let item = state.catalog.reference_add(state.kind, name).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/{slug} - Remove every item
pub async fn reset_items(State(state): State<Arc<ReferenceState>>) -> ApiResult<impl IntoResponse> {
    let deleted = state.catalog.reference_reset(state.kind).await?;
    Ok(Json(DeletedResponse { deleted }))
}

/// GET /api/{slug}/{id} - One item
pub async fn get_item(
    State(state): State<Arc<ReferenceState>>,
    PathId(id): PathId<ReferenceItemId>,
) -> ApiResult<impl IntoResponse> {
    let item = state
        .catalog
        .reference_get(state.kind, id)
        .await?
        .ok_or_else(|| ApiError::reference_not_found(state.kind.label(), id))?;

    Ok(Json(item))
}

/// PATCH /api/{slug}/{id} - Rename an item
pub async fn rename_item(
    State(state): State<Arc<ReferenceState>>,
    PathId(id): PathId<ReferenceItemId>,
    payload: Result<Json<DisplayNameRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let name = submitted_name(state.kind, &req)?;
    let item = state
        .catalog
        .reference_rename(state.kind, id, name)
        .await?
        .ok_or_else(|| ApiError::reference_not_found(state.kind.label(), id))?;

    Ok(Json(item))
}

/// DELETE /api/{slug}/{id} - Delete an item (products keep their ids)
pub async fn delete_item(
    State(state): State<Arc<ReferenceState>>,
    PathId(id): PathId<ReferenceItemId>,
) -> ApiResult<StatusCode> {
    if !state.catalog.reference_delete(state.kind, id).await? {
        return Err(ApiError::reference_not_found(state.kind.label(), id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// ROUTER
// ============================================================================

/// Routes for one collection, to be nested under `/api/{slug}`.
pub fn create_router<S>(catalog: Catalog, kind: ReferenceKind) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = Arc::new(ReferenceState { catalog, kind });

    Router::new()
        .route("/", get(list_items).post(create_item).delete(reset_items))
        .route("/list", get(list_items))
        .route("/:id", get(get_item).patch(rename_item).delete(delete_item))
        .with_state(state)
}
