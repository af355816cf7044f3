//! Product documents and their reference sets.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::identity::{ProductId, ReferenceItemId, Timestamp};
use crate::reference::{ReferenceItem, ReferenceKind};

// ============================================================================
// ONE-OR-MANY INPUT
// ============================================================================

/// A submitted value that may be a single item or a list of items.
///
/// Form posts carry a lone value when only one option is selected, so
/// reference fields accept both shapes and always normalize to a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        value.into_vec()
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<OneOrMany<T>>::deserialize(deserializer)?
        .map(OneOrMany::into_vec)
        .unwrap_or_default())
}

// ============================================================================
// REFERENCE SETS
// ============================================================================

/// One list per reference collection.
///
/// The same shape carries raw submitted ids (`References<String>`), stored
/// ids (`References<ReferenceItemId>`) and expanded documents
/// (`References<ReferenceItem>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct References<T> {
    #[serde(default, alias = "Category", deserialize_with = "one_or_many")]
    pub categories: Vec<T>,
    #[serde(default, alias = "RawMaterial", deserialize_with = "one_or_many")]
    pub raw_materials: Vec<T>,
    #[serde(default, alias = "Origin", deserialize_with = "one_or_many")]
    pub origins: Vec<T>,
    #[serde(default, alias = "Type", deserialize_with = "one_or_many")]
    pub types: Vec<T>,
    #[serde(default, alias = "Color", deserialize_with = "one_or_many")]
    pub colors: Vec<T>,
    #[serde(
        default,
        alias = "ManufactoringProcess",
        alias = "manufactoringProcesses",
        deserialize_with = "one_or_many"
    )]
    pub processes: Vec<T>,
}

impl<T> Default for References<T> {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            raw_materials: Vec::new(),
            origins: Vec::new(),
            types: Vec::new(),
            colors: Vec::new(),
            processes: Vec::new(),
        }
    }
}

impl<T> References<T> {
    /// The list held for `kind`.
    pub fn get(&self, kind: ReferenceKind) -> &[T] {
        match kind {
            ReferenceKind::Category => &self.categories,
            ReferenceKind::RawMaterial => &self.raw_materials,
            ReferenceKind::Origin => &self.origins,
            ReferenceKind::Type => &self.types,
            ReferenceKind::Color => &self.colors,
            ReferenceKind::ManufacturingProcess => &self.processes,
        }
    }

    /// Mutable access to the list held for `kind`.
    pub fn get_mut(&mut self, kind: ReferenceKind) -> &mut Vec<T> {
        match kind {
            ReferenceKind::Category => &mut self.categories,
            ReferenceKind::RawMaterial => &mut self.raw_materials,
            ReferenceKind::Origin => &mut self.origins,
            ReferenceKind::Type => &mut self.types,
            ReferenceKind::Color => &mut self.colors,
            ReferenceKind::ManufacturingProcess => &mut self.processes,
        }
    }

    /// Replace the list held for `kind`.
    pub fn set(&mut self, kind: ReferenceKind, items: Vec<T>) {
        *self.get_mut(kind) = items;
    }

    /// Build a new set by transforming each list.
    pub fn map_lists<U, F>(&self, mut f: F) -> References<U>
    where
        F: FnMut(ReferenceKind, &[T]) -> Vec<U>,
    {
        let mut out = References::default();
        for kind in ReferenceKind::ALL {
            out.set(kind, f(kind, self.get(kind)));
        }
        out
    }

    /// Total number of entries across all six lists.
    pub fn total_len(&self) -> usize {
        ReferenceKind::ALL.iter().map(|k| self.get(*k).len()).sum()
    }
}

// ============================================================================
// PRODUCT
// ============================================================================

/// A catalog product.
///
/// Stored products hold bare reference ids. [`ProductView`] is the same
/// document with each id replaced by the referenced item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product<R = ReferenceItemId> {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub references: References<R>,
    pub created_at: Timestamp,
}

/// A product with its references expanded to full documents.
pub type ProductView = Product<ReferenceItem>;

impl Product {
    /// Expand stored ids against `index`.
    ///
    /// Ids whose document no longer exists are left out of the view; the
    /// stored product keeps them until its next update.
    pub fn expand(&self, index: &ReferenceIndex) -> ProductView {
        Product {
            id: self.id,
            name: self.name.clone(),
            link: self.link.clone(),
            description: self.description.clone(),
            references: self.references.map_lists(|kind, ids| {
                ids.iter()
                    .filter_map(|id| index.get(kind, *id).cloned())
                    .collect()
            }),
            created_at: self.created_at,
        }
    }
}

/// Sort products the way `list()` returns them: newest first.
pub fn sort_newest_first<R>(products: &mut [Product<R>]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

/// Client-submitted product fields, before reference resolution.
///
/// Reference ids are kept as raw strings; malformed or unknown ids are
/// dropped during resolution rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[serde(default, alias = "ProductName")]
    pub name: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, alias = "Desc")]
    pub description: String,
    #[serde(flatten)]
    pub references: References<String>,
}

// ============================================================================
// REFERENCE INDEX
// ============================================================================

/// Per-collection lookup table used to expand stored ids.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    by_kind: HashMap<ReferenceKind, HashMap<ReferenceItemId, ReferenceItem>>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every item of every list.
    pub fn from_lists(lists: &References<ReferenceItem>) -> Self {
        let mut index = Self::new();
        for kind in ReferenceKind::ALL {
            for item in lists.get(kind) {
                index.insert(kind, item.clone());
            }
        }
        index
    }

    pub fn insert(&mut self, kind: ReferenceKind, item: ReferenceItem) {
        self.by_kind.entry(kind).or_default().insert(item.id, item);
    }

    pub fn get(&self, kind: ReferenceKind, id: ReferenceItemId) -> Option<&ReferenceItem> {
        self.by_kind.get(&kind).and_then(|items| items.get(&id))
    }
}
