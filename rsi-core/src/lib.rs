//! RSI Core - Catalog Entity Types
//!
//! Data structures shared by the storage and API crates: identifiers, the
//! six reference collections, products and the aggregate snapshot.

pub mod aggregate;
pub mod error;
pub mod identity;
pub mod product;
pub mod reference;

pub use aggregate::AggregateSnapshot;
pub use error::{CatalogError, CatalogResult, StorageError, ValidationError};
pub use identity::{EntityIdType, ProductId, ReferenceItemId, Timestamp};
pub use product::{
    sort_newest_first, OneOrMany, Product, ProductDraft, ProductView, ReferenceIndex, References,
};
pub use reference::{normalize_display_name, sort_by_creation, ReferenceItem, ReferenceKind};
