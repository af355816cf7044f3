//! Typed path extractor for catalog ids.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use rsi_core::EntityIdType;

use crate::error::ApiError;

/// The `:id` path segment parsed as a typed catalog id.
///
/// A segment that is not a UUID is rejected with 400 `INVALID_FORMAT`;
/// `details` names the entity and echoes the raw segment.
///
/// ```rust,ignore
/// async fn get_product(PathId(id): PathId<ProductId>) -> ApiResult<Json<ProductView>> { .. }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PathId<T: EntityIdType>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for PathId<T>
where
    S: Send + Sync,
    T: EntityIdType,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_id(T::ENTITY_NAME, parts.uri.path(), e.body_text()))?;

        T::parse(&raw)
            .map(PathId)
            .map_err(|e| ApiError::invalid_id(T::ENTITY_NAME, &raw, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use rsi_core::{ProductId, ReferenceItemId};
    use tower::ServiceExt;

    async fn echo_product(PathId(id): PathId<ProductId>) -> String {
        id.to_string()
    }

    async fn echo_reference(PathId(id): PathId<ReferenceItemId>) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/product/:id", get(echo_product))
            .route("/origin/:id", get(echo_reference))
    }

    async fn call(uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_valid_id_is_extracted() {
        let id = ProductId::now_v7();
        let (status, body) = call(&format!("/product/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, id.to_string().into_bytes());
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_tolerated() {
        let id = ReferenceItemId::now_v7();
        let (status, body) = call(&format!("/origin/%20{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, id.to_string().into_bytes());
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let (status, body) = call("/origin/not-an-id").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "INVALID_FORMAT");
        assert_eq!(json["details"]["path_param"], "not-an-id");
        assert_eq!(json["details"]["entity_type"], "reference item");
    }
}
