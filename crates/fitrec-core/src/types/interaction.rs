//! Implicit-feedback interaction events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemId, UserId};
use crate::config::weights;

/// Kind of implicit interaction signal.
///
/// Each kind carries a fixed evidence weight; there are no explicit ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    Complete,
}

impl InteractionKind {
    /// Evidence weight contributed to the interaction matrix.
    ///
    /// Multiple events for the same (user, item) pair sum.
    #[inline]
    pub fn weight(&self) -> f32 {
        match self {
            Self::View => weights::VIEW,
            Self::Like => weights::LIKE,
            Self::Complete => weights::COMPLETE,
        }
    }
}

/// A single append-only interaction event from the event store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub kind: InteractionKind,
    pub occurred_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(
        user_id: UserId,
        item_id: ItemId,
        kind: InteractionKind,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            item_id,
            kind,
            occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_are_ordered_by_signal_strength() {
        assert!(InteractionKind::View.weight() < InteractionKind::Like.weight());
        assert!(InteractionKind::Like.weight() < InteractionKind::Complete.weight());
    }

    #[test]
    fn test_kind_serde_uses_lowercase_labels() {
        let json = serde_json::to_string(&InteractionKind::Complete).unwrap();
        assert_eq!(json, "\"complete\"");
    }
}
