//! Scored recommendation results.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// One entry of a ranked recommendation list.
///
/// Score semantics depend on the producing path (distance-derived similarity
/// for the content path, factor dot product for the collaborative path) until
/// the hybrid ranker normalizes them into [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f32,
}

impl ScoredItem {
    pub fn new(item_id: ItemId, score: f32) -> Self {
        Self { item_id, score }
    }
}
