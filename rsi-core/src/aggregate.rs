//! Combined catalog snapshot served by the aggregate endpoints.

use serde::{Deserialize, Serialize};

use crate::identity::Timestamp;
use crate::product::{Product, ProductView, ReferenceIndex, References};
use crate::reference::ReferenceItem;

/// Every product (expanded) plus the six reference lists, captured at one
/// point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSnapshot {
    pub products: Vec<ProductView>,
    pub references: References<ReferenceItem>,
    pub captured_at: Timestamp,
}

impl AggregateSnapshot {
    /// Assemble a snapshot from already-sorted store reads.
    ///
    /// Products are expanded against the same reference lists that go into
    /// the snapshot, so the two halves are always consistent.
    pub fn assemble(
        products: &[Product],
        references: References<ReferenceItem>,
        captured_at: Timestamp,
    ) -> Self {
        let index = ReferenceIndex::from_lists(&references);
        Self {
            products: products.iter().map(|p| p.expand(&index)).collect(),
            references,
            captured_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.references.total_len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{EntityIdType, ProductId};
    use crate::reference::ReferenceKind;
    use chrono::Utc;

    #[test]
    fn test_assemble_expands_against_included_lists() {
        let wool = ReferenceItem::new("wool").unwrap();
        let mut lists = References::default();
        lists.set(ReferenceKind::RawMaterial, vec![wool.clone()]);

        let mut stored = References::default();
        stored.set(ReferenceKind::RawMaterial, vec![wool.id]);
        let product = Product {
            id: ProductId::now_v7(),
            name: "Gabbeh".to_string(),
            link: String::new(),
            description: String::new(),
            references: stored,
            created_at: Utc::now(),
        };

        let snapshot = AggregateSnapshot::assemble(&[product], lists, Utc::now());
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.products[0].references.raw_materials, vec![wool]);
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = AggregateSnapshot::assemble(&[], References::default(), Utc::now());
        assert!(snapshot.is_empty());
    }
}
