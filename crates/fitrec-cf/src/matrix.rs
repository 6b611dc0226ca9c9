//! Weighted sparse interaction matrix.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use fitrec_core::types::{Interaction, ItemId, UserId};

/// Sparse user×item matrix of aggregated interaction weights.
///
/// User and item indices are assigned by ascending identifier, so the same
/// interaction set always yields the same layout. The matrix and its two
/// id↔index mappings form a single immutable unit; factors trained from one
/// snapshot must never be combined with mappings from another.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    /// index -> user id, ascending.
    user_ids: Vec<UserId>,
    /// index -> item id, ascending.
    item_ids: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    /// Per-user observed cells as `(item_index, weight)`, item index ascending.
    user_rows: Vec<Vec<(usize, f32)>>,
    /// Per-item observed cells as `(user_index, weight)`, user index ascending.
    item_cols: Vec<Vec<(usize, f32)>>,
    nnz: usize,
}

impl InteractionMatrix {
    /// Build the matrix from a snapshot of the interaction log.
    ///
    /// Weight contributions sum per (user, item) cell with no clipping. An
    /// empty log yields a well-formed zero-sized matrix with empty mappings;
    /// the trainer treats that as insufficient data, not a crash.
    pub fn build(interactions: &[Interaction]) -> Self {
        let users: BTreeSet<UserId> = interactions.iter().map(|i| i.user_id).collect();
        let items: BTreeSet<ItemId> = interactions.iter().map(|i| i.item_id).collect();

        let user_ids: Vec<UserId> = users.into_iter().collect();
        let item_ids: Vec<ItemId> = items.into_iter().collect();
        let user_index: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let item_index: HashMap<ItemId, usize> =
            item_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut cells: BTreeMap<(usize, usize), f32> = BTreeMap::new();
        for event in interactions {
            let u = user_index[&event.user_id];
            let i = item_index[&event.item_id];
            *cells.entry((u, i)).or_insert(0.0) += event.kind.weight();
        }

        let mut user_rows = vec![Vec::new(); user_ids.len()];
        let mut item_cols = vec![Vec::new(); item_ids.len()];
        let nnz = cells.len();
        for ((u, i), weight) in cells {
            user_rows[u].push((i, weight));
            item_cols[i].push((u, weight));
        }

        Self {
            user_ids,
            item_ids,
            user_index,
            item_index,
            user_rows,
            item_cols,
            nnz,
        }
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Number of non-zero cells.
    pub fn nnz(&self) -> usize {
        self.nnz
    }

    pub fn is_empty(&self) -> bool {
        self.nnz == 0
    }

    /// Aggregated weight of a cell; zero when the pair never interacted or
    /// either id is unknown to this snapshot.
    pub fn cell(&self, user_id: UserId, item_id: ItemId) -> f32 {
        let (Some(&u), Some(&i)) = (self.user_index.get(&user_id), self.item_index.get(&item_id))
        else {
            return 0.0;
        };
        self.user_rows[u]
            .iter()
            .find(|(item, _)| *item == i)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// index -> user id mapping, ascending by id.
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// index -> item id mapping, ascending by id.
    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    pub(crate) fn user_rows(&self) -> &[Vec<(usize, f32)>] {
        &self.user_rows
    }

    pub(crate) fn item_cols(&self) -> &[Vec<(usize, f32)>] {
        &self.item_cols
    }
}
