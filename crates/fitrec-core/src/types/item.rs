//! Catalog item snapshot consumed by the content path.

use serde::{Deserialize, Serialize};

use super::ItemId;

/// Kind of catalog content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Article,
    Workout,
    Video,
}

/// Difficulty level of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl ItemKind {
    /// Lowercase label used in embedding text composition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Workout => "workout",
            Self::Video => "video",
        }
    }
}

impl Difficulty {
    /// Lowercase label used in embedding text composition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// Immutable snapshot of a catalog item's descriptive fields.
///
/// Owned by the catalog; the engine only reads these fields to derive an
/// embedding, so media URLs, timestamps and other storage-side columns are
/// not carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable catalog identifier.
    pub id: ItemId,
    /// Item title.
    pub title: String,
    /// Free-text description, if any.
    pub description: Option<String>,
    /// Tag set, order preserved as supplied by the catalog.
    pub tags: Vec<String>,
    /// Duration in minutes.
    pub duration_minutes: u32,
    /// Difficulty level.
    pub difficulty: Difficulty,
    /// Content kind.
    pub kind: ItemKind,
}

impl Item {
    /// Construct an item with no description or tags; used heavily in tests.
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        kind: ItemKind,
        difficulty: Difficulty,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            tags: Vec::new(),
            duration_minutes,
            difficulty,
            kind,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_lowercase() {
        assert_eq!(ItemKind::Workout.as_str(), "workout");
        assert_eq!(Difficulty::Intermediate.as_str(), "intermediate");
    }

    #[test]
    fn test_item_serde_round_trip() {
        let item = Item::new(
            ItemId(42),
            "Morning HIIT",
            ItemKind::Workout,
            Difficulty::Beginner,
            20,
        )
        .with_tags(vec!["cardio".into(), "hiit".into()]);

        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"workout\""));
        assert!(json.contains("\"beginner\""));

        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }
}
