//! Domain types for the recommendation engine.
//!
//! Catalog items and interaction events arrive from the owning data stores
//! as loosely-shaped rows; everything here is the strongly-typed form the
//! engine validates them into at the boundary. The engine never mutates
//! these records, it only consumes immutable snapshots.

mod interaction;
mod item;
mod scored;

pub use interaction::{Interaction, InteractionKind};
pub use item::{Difficulty, Item, ItemKind};
pub use scored::ScoredItem;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable catalog item identifier.
///
/// Assigned by the catalog store; the engine treats it as opaque but
/// relies on it being stable across reindexing and retraining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

/// Stable user identifier from the event store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}
