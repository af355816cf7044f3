//! Request and response bodies for the REST surface.

use std::collections::HashMap;

use rsi_core::{ProductView, ReferenceItem, ReferenceKind, Timestamp};
use serde::{Deserialize, Serialize};

// ============================================================================
// REFERENCE COLLECTIONS
// ============================================================================

/// Body of `POST /api/{slug}` and `PATCH /api/{slug}/:id`.
///
/// `displayName` is preferred; the per-collection admin form field
/// (`originName`, `rawMaterialName`, ...) is accepted as a fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(flatten)]
    pub form_fields: HashMap<String, serde_json::Value>,
}

impl DisplayNameRequest {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            form_fields: HashMap::new(),
        }
    }

    /// The submitted name for `kind`, if any field carried one.
    pub fn display_name_for(&self, kind: ReferenceKind) -> Option<&str> {
        if let Some(name) = &self.display_name {
            return Some(name);
        }
        self.form_fields
            .get(&format!("{}Name", kind.collection()))
            .and_then(|value| value.as_str())
    }
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub deleted: u64,
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// Body of a successful aggregate read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub products: Vec<ProductView>,
    pub origins: Vec<ReferenceItem>,
    pub colors: Vec<ReferenceItem>,
    pub types: Vec<ReferenceItem>,
    pub categories: Vec<ReferenceItem>,
    pub raw_materials: Vec<ReferenceItem>,
    pub manufactoring_processes: Vec<ReferenceItem>,

    /// True when the body came from the cache rather than a fresh read.
    pub cached: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,

    /// Time left before the cached copy expires, e.g. `"42s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_update_in: Option<String>,

    /// Why a stale copy was served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of a cold aggregate failure (HTTP 500).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUnavailableResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl DataUnavailableResponse {
    pub fn new(details: Option<String>) -> Self {
        Self {
            error: "Data unavailable".to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_camel_case_field() {
        let req: DisplayNameRequest =
            serde_json::from_str(r#"{"displayName":"India","originName":"Iran"}"#).unwrap();
        assert_eq!(req.display_name_for(ReferenceKind::Origin), Some("India"));
    }

    #[test]
    fn test_display_name_falls_back_to_form_field() {
        let req: DisplayNameRequest =
            serde_json::from_str(r#"{"manufactoringProcessName":"Hand-knotted"}"#).unwrap();
        assert_eq!(
            req.display_name_for(ReferenceKind::ManufacturingProcess),
            Some("Hand-knotted")
        );
        assert_eq!(req.display_name_for(ReferenceKind::Origin), None);
    }

    #[test]
    fn test_data_unavailable_omits_empty_details() {
        let json = serde_json::to_value(DataUnavailableResponse::new(None)).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Data unavailable" }));
    }
}
