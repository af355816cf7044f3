//! HTTP error type for the catalog API.
//!
//! Handlers return [`ApiResult`]; an [`ApiError`] renders as
//! `{ "code": "...", "message": "...", "details"?: ... }` with the status
//! implied by its [`ErrorCode`]. Store failures are logged in full here and
//! reach the client only as a generic message.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rsi_core::{CatalogError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned for every store-side failure.
const STORE_FAILURE_MESSAGE: &str = "The catalog store could not complete the request";

// ============================================================================
// ERROR CODES
// ============================================================================

/// Machine-readable error category, serialized in SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 400
    /// Body is not the JSON shape the route expects
    InvalidInput,
    /// A required value (display name, product name) is absent or blank
    MissingField,
    /// A value is present but unusable
    InvalidValue,
    /// A path id is not a UUID
    InvalidFormat,

    // 404
    ProductNotFound,
    ReferenceNotFound,

    // 409
    /// Insert collided with an existing id
    DuplicateId,

    // 500
    InternalError,
    DatabaseError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        use ErrorCode::*;
        match self {
            InvalidInput | MissingField | InvalidValue | InvalidFormat => StatusCode::BAD_REQUEST,
            ProductNotFound | ReferenceNotFound => StatusCode::NOT_FOUND,
            DuplicateId => StatusCode::CONFLICT,
            InternalError | DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("'{}' is required", field))
            .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidValue,
            format!("'{}' is invalid: {}", field, reason),
        )
        .with_field(field)
    }

    /// A path segment that should have been an entity id.
    pub fn invalid_id(entity: &str, raw: &str, reason: impl fmt::Display) -> Self {
        let mut err = Self::new(
            ErrorCode::InvalidFormat,
            format!("'{}' is not a valid {} id: {}", raw, entity, reason),
        );
        err.details = Some(serde_json::json!({ "entity_type": entity, "path_param": raw }));
        err
    }

    pub fn product_not_found(id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ProductNotFound, format!("Product {} not found", id))
    }

    /// `label` is the collection's display label, e.g. "Raw material".
    pub fn reference_not_found(label: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ReferenceNotFound,
            format!("{} {} not found", label, id),
        )
    }

    pub fn duplicate_id(collection: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateId,
            format!("An item with this id already exists in {}", collection),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    fn with_field(mut self, field: &str) -> Self {
        self.details = Some(serde_json::json!({ "field": field }));
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                ApiError::missing_field(&field)
            }
            CatalogError::Storage(StorageError::InsertFailed { collection, reason }) => {
                tracing::warn!(%collection, %reason, "Insert rejected");
                ApiError::duplicate_id(&collection)
            }
            CatalogError::Storage(storage) => {
                tracing::error!(error = %storage, "Catalog store failure");
                ApiError::database_error(STORE_FAILURE_MESSAGE)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
