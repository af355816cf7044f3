//! Reference lookup collections.
//!
//! Six independent collections share one shape: a display name plus a
//! creation timestamp. [`ReferenceKind`] selects the collection.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::identity::{EntityIdType, ReferenceItemId, Timestamp};

/// Discriminator for the six reference collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceKind {
    Origin,
    Color,
    Type,
    Category,
    RawMaterial,
    ManufacturingProcess,
}

impl ReferenceKind {
    /// All kinds, in aggregate response order.
    pub const ALL: [ReferenceKind; 6] = [
        ReferenceKind::Origin,
        ReferenceKind::Color,
        ReferenceKind::Type,
        ReferenceKind::Category,
        ReferenceKind::RawMaterial,
        ReferenceKind::ManufacturingProcess,
    ];

    /// Name of the physical collection (table) holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            ReferenceKind::Origin => "origin",
            ReferenceKind::Color => "color",
            ReferenceKind::Type => "type",
            ReferenceKind::Category => "category",
            ReferenceKind::RawMaterial => "rawMaterial",
            ReferenceKind::ManufacturingProcess => "manufactoringProcess",
        }
    }

    /// URL segment used by the HTTP surface.
    pub fn slug(&self) -> &'static str {
        match self {
            ReferenceKind::Origin => "origin",
            ReferenceKind::Color => "color",
            ReferenceKind::Type => "type",
            ReferenceKind::Category => "category",
            ReferenceKind::RawMaterial => "rawmaterial",
            ReferenceKind::ManufacturingProcess => "manufactoringProcess",
        }
    }

    /// Human-readable label for logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ReferenceKind::Origin => "Origin",
            ReferenceKind::Color => "Color",
            ReferenceKind::Type => "Type",
            ReferenceKind::Category => "Category",
            ReferenceKind::RawMaterial => "Raw material",
            ReferenceKind::ManufacturingProcess => "Manufacturing process",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// An item in one of the reference collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    pub id: ReferenceItemId,
    pub display_name: String,
    pub created_at: Timestamp,
}

impl ReferenceItem {
    /// Build a new item with a fresh id and the current time.
    ///
    /// The display name is trimmed and must not be empty.
    pub fn new(display_name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: ReferenceItemId::now_v7(),
            display_name: normalize_display_name(display_name)?,
            created_at: Utc::now(),
        })
    }
}

/// Trim a submitted display name, rejecting blank input.
pub fn normalize_display_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: "displayName".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Sort reference items the way `list()` returns them: oldest first.
///
/// Ties on `created_at` fall back to the id, which is creation-ordered too.
pub fn sort_by_creation(items: &mut [ReferenceItem]) {
    items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugs_are_distinct() {
        let slugs: std::collections::HashSet<_> =
            ReferenceKind::ALL.iter().map(|k| k.slug()).collect();
        assert_eq!(slugs.len(), ReferenceKind::ALL.len());
        assert_eq!(ReferenceKind::RawMaterial.slug(), "rawmaterial");
        assert_eq!(ReferenceKind::RawMaterial.collection(), "rawMaterial");
    }

    #[test]
    fn test_new_item_trims_name() {
        let item = ReferenceItem::new("  India ").unwrap();
        assert_eq!(item.display_name, "India");
        assert!(item.created_at <= Utc::now());
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = ReferenceItem::new("   ").unwrap_err();
        assert!(matches!(err, ValidationError::RequiredFieldMissing { .. }));
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = ReferenceItem::new("wool").unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["displayName"], "wool");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_sort_by_creation_is_ascending() {
        let a = ReferenceItem::new("a").unwrap();
        let b = ReferenceItem::new("b").unwrap();
        let mut items = vec![b.clone(), a.clone()];
        sort_by_creation(&mut items);
        assert_eq!(items, vec![a, b]);
    }
}
