//! Item text composition for embedding.

use fitrec_core::types::Item;

/// Compose the text an item is embedded from.
///
/// Field order is fixed (title, description, tags, difficulty, duration,
/// kind): the embedding must be a deterministic function of the item's
/// descriptive fields, and reordering would silently change every vector
/// on the next reindex.
pub fn item_text(item: &Item) -> String {
    let parts = [
        item.title.clone(),
        item.description.clone().unwrap_or_default(),
        item.tags.join(" "),
        item.difficulty.as_str().to_string(),
        format!("{} minutes", item.duration_minutes),
        item.kind.as_str().to_string(),
    ];
    parts.join(" ")
}
