//! Default reference data inserted into empty collections.

use rsi_core::ReferenceKind;

/// Display names seeded per collection, in insertion order.
pub const DEFAULT_REFERENCES: [(ReferenceKind, &[&str]); 6] = [
    (
        ReferenceKind::Origin,
        &["Pakistan", "Iran", "Afghanistan", "India", "Turkey"],
    ),
    (ReferenceKind::Color, &["#7D2A2A"]),
    (ReferenceKind::Type, &["6 inch"]),
    (ReferenceKind::Category, &["Handmade Carpets"]),
    (ReferenceKind::RawMaterial, &["wool"]),
    (ReferenceKind::ManufacturingProcess, &["Hand-knotted"]),
];

/// Seed names for one collection.
pub fn defaults_for(kind: ReferenceKind) -> &'static [&'static str] {
    DEFAULT_REFERENCES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}
