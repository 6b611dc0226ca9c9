//! Flat (exhaustive) L2 index with slot mapping.

use std::collections::HashMap;

use tracing::warn;

use fitrec_core::error::IndexError;
use fitrec_core::types::{ItemId, ScoredItem};

/// Index lifecycle state.
///
/// Reads are only valid in `Ready`; `seal` marks the end of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Building,
    Ready,
}

/// Exhaustive L2 vector index.
///
/// Each inserted item gets the next compact slot `[0, N)`; slots are never
/// reused within one index lifetime, so deletions require a full rebuild.
/// The id↔slot mapping is a bijection: every indexed item has exactly one
/// slot and every slot maps back to exactly one item.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    /// Row-major vector storage, `slot * dimension` offsets.
    vectors: Vec<f32>,
    slot_to_item: Vec<ItemId>,
    item_to_slot: HashMap<ItemId, usize>,
    state: IndexState,
}

impl Default for FlatIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatIndex {
    /// Create an uninitialized index; the dimension is fixed lazily by the
    /// first embedding added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimension: 0,
            vectors: Vec::new(),
            slot_to_item: Vec::new(),
            item_to_slot: HashMap::new(),
            state: IndexState::Uninitialized,
        }
    }

    /// Create an empty index of a known dimension, ready for building.
    ///
    /// # Errors
    ///
    /// `IndexError::InvalidDimension` if `dimension` is zero.
    pub fn with_dimension(dimension: usize) -> Result<Self, IndexError> {
        let mut index = Self::new();
        index.initialize(dimension)?;
        Ok(index)
    }

    /// Reset to an empty index of the given dimension.
    ///
    /// Any prior contents and mapping are discarded.
    ///
    /// # Errors
    ///
    /// `IndexError::InvalidDimension` if `dimension` is zero.
    pub fn initialize(&mut self, dimension: usize) -> Result<(), IndexError> {
        if dimension == 0 {
            return Err(IndexError::InvalidDimension(dimension));
        }
        self.dimension = dimension;
        self.vectors.clear();
        self.slot_to_item.clear();
        self.item_to_slot.clear();
        self.state = IndexState::Building;
        Ok(())
    }

    /// Add items with their embeddings.
    ///
    /// Idempotent per item id: an id already present is skipped. Triggers
    /// lazy initialization from the first embedding's dimension if the index
    /// is uninitialized. Moves a `Ready` index back to `Building`.
    ///
    /// # Errors
    ///
    /// - `IndexError::InvalidDimension` if lazily initializing from an empty
    ///   embedding
    /// - `IndexError::DimensionMismatch` if any embedding disagrees with the
    ///   index dimension; entries before the offending one remain added
    pub fn add(&mut self, entries: &[(ItemId, Vec<f32>)]) -> Result<(), IndexError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        if self.state == IndexState::Uninitialized {
            self.initialize(first.1.len())?;
        } else {
            self.state = IndexState::Building;
        }

        for (item_id, vector) in entries {
            if self.item_to_slot.contains_key(item_id) {
                continue;
            }
            if vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    item_id: *item_id,
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
            let slot = self.slot_to_item.len();
            self.vectors.extend_from_slice(vector);
            self.slot_to_item.push(*item_id);
            self.item_to_slot.insert(*item_id, slot);
        }
        Ok(())
    }

    /// Mark the build complete and the index readable.
    pub fn seal(&mut self) {
        if self.state == IndexState::Building {
            self.state = IndexState::Ready;
        }
    }

    /// Full reinitialization and re-add of `entries`; the prior mapping is
    /// discarded. An empty entry set resets to `Uninitialized`.
    pub fn rebuild(&mut self, entries: &[(ItemId, Vec<f32>)]) -> Result<(), IndexError> {
        match entries.first() {
            None => {
                *self = Self::new();
                Ok(())
            }
            Some(first) => {
                self.initialize(first.1.len())?;
                self.add(entries)?;
                self.seal();
                Ok(())
            }
        }
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.slot_to_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_to_item.is_empty()
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    /// Index dimension; zero while uninitialized.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.item_to_slot.contains_key(&item_id)
    }

    /// Iterate the id↔slot mapping in slot order.
    pub fn mapping(&self) -> impl Iterator<Item = (ItemId, usize)> + '_ {
        self.slot_to_item
            .iter()
            .enumerate()
            .map(|(slot, id)| (*id, slot))
    }

    /// Stored vector for an item, if indexed.
    pub fn vector_for(&self, item_id: ItemId) -> Option<&[f32]> {
        self.item_to_slot
            .get(&item_id)
            .map(|&slot| self.vector_at(slot))
    }

    fn vector_at(&self, slot: usize) -> &[f32] {
        let start = slot * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// k-nearest-neighbor search by ascending L2 distance.
    ///
    /// Returns up to `k` `(item, similarity)` pairs with similarity
    /// `1 / (1 + distance)`, bounded to (0, 1] and monotonically decreasing
    /// in distance. Distance ties break by ascending slot so identical
    /// inputs always rank identically. An empty index, `k == 0`, or a
    /// not-`Ready` index yields an empty result, not an error.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredItem> {
        self.search_excluding(query, k, None)
    }

    /// Nearest neighbors of a stored item, the item itself excluded.
    ///
    /// Exclusion is by identity rather than a distance-zero heuristic: a
    /// legitimate duplicate-content near-tie must stay in the result.
    /// An unknown `item_id` yields an empty result.
    pub fn find_similar(&self, item_id: ItemId, k: usize) -> Vec<ScoredItem> {
        let Some(&slot) = self.item_to_slot.get(&item_id) else {
            return Vec::new();
        };
        self.search_excluding(self.vector_at(slot), k, Some(slot))
    }

    fn search_excluding(
        &self,
        query: &[f32],
        k: usize,
        exclude_slot: Option<usize>,
    ) -> Vec<ScoredItem> {
        if self.state != IndexState::Ready {
            warn!(state = ?self.state, "search on index that is not ready");
            return Vec::new();
        }
        if k == 0 || self.is_empty() {
            return Vec::new();
        }
        if query.len() != self.dimension {
            warn!(
                expected = self.dimension,
                actual = query.len(),
                "query dimension mismatch"
            );
            return Vec::new();
        }

        let mut distances: Vec<(f32, usize)> = (0..self.slot_to_item.len())
            .filter(|slot| Some(*slot) != exclude_slot)
            .map(|slot| (l2_distance(query, self.vector_at(slot)), slot))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        distances.truncate(k);

        distances
            .into_iter()
            .map(|(distance, slot)| {
                ScoredItem::new(self.slot_to_item[slot], 1.0 / (1.0 + distance))
            })
            .collect()
    }

    /// Reassemble from persisted parts; the index is immediately `Ready`.
    pub(crate) fn from_parts(
        dimension: usize,
        vectors: Vec<f32>,
        slot_to_item: Vec<ItemId>,
    ) -> Self {
        let item_to_slot = slot_to_item
            .iter()
            .enumerate()
            .map(|(slot, id)| (*id, slot))
            .collect();
        Self {
            dimension,
            vectors,
            slot_to_item,
            item_to_slot,
            state: IndexState::Ready,
        }
    }

    pub(crate) fn parts_ref(&self) -> (usize, &[f32], &[ItemId]) {
        (self.dimension, &self.vectors, &self.slot_to_item)
    }
}

/// Euclidean distance between two equal-length vectors.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed_index(entries: &[(ItemId, Vec<f32>)]) -> FlatIndex {
        let mut index = FlatIndex::new();
        index.add(entries).unwrap();
        index.seal();
        index
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            FlatIndex::with_dimension(0),
            Err(IndexError::InvalidDimension(0))
        ));
    }

    #[test]
    fn test_lazy_initialization_from_first_embedding() {
        let index = sealed_index(&[(ItemId(1), vec![1.0, 0.0, 0.0])]);
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 1);
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[test]
    fn test_add_is_idempotent_per_item() {
        let mut index = FlatIndex::new();
        index.add(&[(ItemId(1), vec![1.0, 0.0])]).unwrap();
        index.add(&[(ItemId(1), vec![0.5, 0.5])]).unwrap();
        index.seal();

        assert_eq!(index.len(), 1);
        // First vector wins; the re-add was a no-op.
        assert_eq!(index.vector_for(ItemId(1)), Some(&[1.0, 0.0][..]));
    }

    #[test]
    fn test_slots_are_monotonic_insertion_order() {
        let index = sealed_index(&[
            (ItemId(30), vec![1.0]),
            (ItemId(10), vec![2.0]),
            (ItemId(20), vec![3.0]),
        ]);
        let mapping: Vec<(ItemId, usize)> = index.mapping().collect();
        assert_eq!(
            mapping,
            vec![(ItemId(30), 0), (ItemId(10), 1), (ItemId(20), 2)]
        );
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut index = FlatIndex::with_dimension(2).unwrap();
        let err = index
            .add(&[(ItemId(5), vec![1.0, 2.0, 3.0])])
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_search_empty_index_or_zero_k_yields_empty() {
        let mut empty = FlatIndex::with_dimension(2).unwrap();
        empty.seal();
        assert!(empty.search(&[0.0, 0.0], 5).is_empty());

        let index = sealed_index(&[(ItemId(1), vec![1.0, 0.0])]);
        assert!(index.search(&[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn test_search_before_seal_yields_empty() {
        let mut index = FlatIndex::new();
        index.add(&[(ItemId(1), vec![1.0, 0.0])]).unwrap();
        assert!(index.search(&[1.0, 0.0], 1).is_empty());
        index.seal();
        assert_eq!(index.search(&[1.0, 0.0], 1).len(), 1);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sealed_index(&[
            (ItemId(1), vec![0.0, 0.0]),
            (ItemId(2), vec![3.0, 4.0]),
            (ItemId(3), vec![1.0, 0.0]),
        ]);
        let results = index.search(&[0.0, 0.0], 3);
        let ids: Vec<ItemId> = results.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![ItemId(1), ItemId(3), ItemId(2)]);

        // similarity = 1 / (1 + distance)
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[1].score - 0.5).abs() < 1e-6);
        assert!((results[2].score - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let index = sealed_index(&[
            (ItemId(1), vec![0.6, 0.8]),
            (ItemId(2), vec![0.6, 0.8]),
        ]);
        let results = index.find_similar(ItemId(1), 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item_id, ItemId(2));
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_find_similar_excludes_self_by_identity() {
        let index = sealed_index(&[
            (ItemId(1), vec![1.0, 0.0]),
            (ItemId(2), vec![0.9, 0.1]),
            (ItemId(3), vec![0.0, 1.0]),
        ]);
        for k in 1..=5 {
            let results = index.find_similar(ItemId(1), k);
            assert!(results.iter().all(|r| r.item_id != ItemId(1)));
        }
    }

    #[test]
    fn test_find_similar_unknown_item_yields_empty() {
        let index = sealed_index(&[(ItemId(1), vec![1.0])]);
        assert!(index.find_similar(ItemId(99), 5).is_empty());
    }

    #[test]
    fn test_distance_ties_break_by_slot_order() {
        // Two slots equidistant from the query.
        let index = sealed_index(&[
            (ItemId(7), vec![1.0, 0.0]),
            (ItemId(3), vec![-1.0, 0.0]),
        ]);
        let results = index.search(&[0.0, 0.0], 2);
        assert_eq!(results[0].item_id, ItemId(7));
        assert_eq!(results[1].item_id, ItemId(3));
    }

    #[test]
    fn test_rebuild_discards_prior_mapping() {
        let mut index = sealed_index(&[(ItemId(1), vec![1.0, 0.0]), (ItemId(2), vec![0.0, 1.0])]);
        index
            .rebuild(&[(ItemId(5), vec![1.0, 1.0, 1.0]), (ItemId(6), vec![0.0, 0.0, 1.0])])
            .unwrap();

        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 2);
        assert!(!index.contains(ItemId(1)));
        assert!(index.contains(ItemId(5)));
        assert_eq!(index.state(), IndexState::Ready);
    }

    #[test]
    fn test_rebuild_with_empty_set_resets() {
        let mut index = sealed_index(&[(ItemId(1), vec![1.0])]);
        index.rebuild(&[]).unwrap();
        assert_eq!(index.state(), IndexState::Uninitialized);
        assert!(index.is_empty());
    }
}
