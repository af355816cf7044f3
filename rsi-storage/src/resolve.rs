//! Resolution of submitted reference ids into stored ones.

use std::collections::HashSet;

use futures_util::future::try_join_all;
use rsi_core::{CatalogResult, EntityIdType, ReferenceItemId, ReferenceKind, References};

use crate::CatalogStore;

/// Resolve every submitted id list against the current store contents.
///
/// The result for each collection is the submitted ids (in submission
/// order, duplicates removed) that parse and exist. Anything else is dropped
/// without failing the write; drops are logged at `warn`.
pub async fn resolve_references(
    store: &dyn CatalogStore,
    submitted: &References<String>,
) -> CatalogResult<References<ReferenceItemId>> {
    let lists = try_join_all(
        ReferenceKind::ALL
            .into_iter()
            .map(|kind| resolve_kind(store, kind, submitted.get(kind))),
    )
    .await?;

    let mut resolved = References::default();
    for (kind, ids) in ReferenceKind::ALL.into_iter().zip(lists) {
        resolved.set(kind, ids);
    }
    Ok(resolved)
}

async fn resolve_kind(
    store: &dyn CatalogStore,
    kind: ReferenceKind,
    raw: &[String],
) -> CatalogResult<Vec<ReferenceItemId>> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::with_capacity(raw.len());
    let mut malformed = Vec::new();

    for value in raw {
        if value.trim().is_empty() {
            continue;
        }
        match ReferenceItemId::parse(value) {
            Ok(id) => {
                if seen.insert(id) {
                    candidates.push(id);
                }
            }
            Err(_) => malformed.push(value.as_str()),
        }
    }

    if candidates.is_empty() {
        if !malformed.is_empty() {
            tracing::warn!(
                collection = %kind,
                malformed = ?malformed,
                "Dropping unparseable reference ids"
            );
        }
        return Ok(Vec::new());
    }

    let existing: HashSet<ReferenceItemId> = store
        .reference_find_many(kind, &candidates)
        .await?
        .into_iter()
        .map(|item| item.id)
        .collect();

    let (kept, missing): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|id| existing.contains(id));

    if !missing.is_empty() || !malformed.is_empty() {
        tracing::warn!(
            collection = %kind,
            kept = kept.len(),
            missing = ?missing,
            malformed = ?malformed,
            "Dropping reference ids that do not resolve"
        );
    }

    Ok(kept)
}
