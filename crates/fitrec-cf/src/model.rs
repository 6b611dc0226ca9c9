//! Trained latent factor model bundle.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use fitrec_core::error::SnapshotError;
use fitrec_core::types::{ItemId, ScoredItem, UserId};

/// Metadata recorded for a training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMeta {
    pub factors: usize,
    pub iterations: usize,
    pub regularization: f32,
    pub trained_at: DateTime<Utc>,
}

impl TrainingMeta {
    pub fn now(factors: usize, iterations: usize, regularization: f32) -> Self {
        Self {
            factors,
            iterations,
            regularization,
            trained_at: Utc::now(),
        }
    }
}

/// Immutable factor model snapshot.
///
/// Carries the user and item factor matrices together with the exact
/// id↔row mappings used at training time and the run metadata. The bundle
/// is persisted and loaded as one unit and superseded wholesale by
/// retraining; recommending against a mapping from a different snapshot
/// would silently misalign matrix rows, so the pieces are never exposed
/// for separate storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorModel {
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
    /// row -> user id, ascending by id.
    user_ids: Vec<UserId>,
    /// row -> item id, ascending by id.
    item_ids: Vec<ItemId>,
    #[serde(skip)]
    user_index: HashMap<UserId, usize>,
    #[serde(skip)]
    item_index: HashMap<ItemId, usize>,
    meta: TrainingMeta,
}

impl FactorModel {
    pub(crate) fn new(
        user_factors: Array2<f32>,
        item_factors: Array2<f32>,
        user_ids: Vec<UserId>,
        item_ids: Vec<ItemId>,
        meta: TrainingMeta,
    ) -> Self {
        let mut model = Self {
            user_factors,
            item_factors,
            user_ids,
            item_ids,
            user_index: HashMap::new(),
            item_index: HashMap::new(),
            meta,
        };
        model.rebuild_lookup();
        model
    }

    /// The id->row lookups are derived from the persisted row->id vectors.
    fn rebuild_lookup(&mut self) {
        self.user_index = self
            .user_ids
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row))
            .collect();
        self.item_index = self
            .item_ids
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row))
            .collect();
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    pub fn meta(&self) -> &TrainingMeta {
        &self.meta
    }

    /// Predicted preference for a single (user, item) pair, if both were
    /// present at training time.
    pub fn score(&self, user_id: UserId, item_id: ItemId) -> Option<f32> {
        let &u = self.user_index.get(&user_id)?;
        let &i = self.item_index.get(&item_id)?;
        Some(self.user_factors.row(u).dot(&self.item_factors.row(i)))
    }

    /// Top-`n` items for a user by factor dot product.
    ///
    /// Items in `exclude` (typically already seen) are removed before
    /// truncation. Ties break by ascending item id so identical inputs
    /// produce identical rankings. An unknown user yields an empty result:
    /// cold-start falls back to the content path at the engine level, not
    /// here.
    pub fn recommend(
        &self,
        user_id: UserId,
        n: usize,
        exclude: &HashSet<ItemId>,
    ) -> Vec<ScoredItem> {
        let Some(&user_row) = self.user_index.get(&user_id) else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        let user = self.user_factors.row(user_row);
        let mut scored: Vec<ScoredItem> = self
            .item_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| !exclude.contains(*id))
            .map(|(row, id)| ScoredItem::new(*id, user.dot(&self.item_factors.row(row))))
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        scored.truncate(n);
        scored
    }

    /// Persist the bundle to a single model file, atomically.
    pub fn persist(&self, path: &Path) -> Result<(), SnapshotError> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|e| SnapshotError::io("creating model temp file", e))?;

        {
            let mut writer = BufWriter::new(&mut tmp);
            bincode::serialize_into(&mut writer, self)
                .map_err(|e| SnapshotError::serialization("serializing factor model", e))?;
            writer
                .flush()
                .map_err(|e| SnapshotError::io("flushing factor model", e))?;
        }
        tmp.persist(path)
            .map_err(|e| SnapshotError::io("persisting factor model", e.error))?;

        debug!(
            users = self.n_users(),
            items = self.n_items(),
            factors = self.meta.factors,
            path = %path.display(),
            "persisted factor model"
        );
        Ok(())
    }

    /// Load a persisted bundle.
    ///
    /// `Ok(None)` if nothing is persisted yet; an unreadable or internally
    /// inconsistent file is an error for the startup path to log and treat
    /// as absent.
    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path).map_err(|e| SnapshotError::io("opening factor model", e))?;
        let mut model: Self = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| SnapshotError::serialization("deserializing factor model", e))?;

        model.validate()?;
        model.rebuild_lookup();
        info!(
            users = model.n_users(),
            items = model.n_items(),
            trained_at = %model.meta.trained_at,
            "loaded factor model"
        );
        Ok(Some(model))
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        if self.user_factors.nrows() != self.user_ids.len() {
            return Err(SnapshotError::Corrupt(format!(
                "{} user factor rows but {} user ids",
                self.user_factors.nrows(),
                self.user_ids.len()
            )));
        }
        if self.item_factors.nrows() != self.item_ids.len() {
            return Err(SnapshotError::Corrupt(format!(
                "{} item factor rows but {} item ids",
                self.item_factors.nrows(),
                self.item_ids.len()
            )));
        }
        if self.user_factors.ncols() != self.item_factors.ncols() {
            return Err(SnapshotError::Corrupt(format!(
                "rank mismatch: user {} vs item {}",
                self.user_factors.ncols(),
                self.item_factors.ncols()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn toy_model() -> FactorModel {
        // Two users, three items, rank 2. User 1 aligns with items 10/30,
        // user 2 with item 20.
        FactorModel::new(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[0.9, 0.1], [0.0, 1.0], [0.8, 0.0]],
            vec![UserId(1), UserId(2)],
            vec![ItemId(10), ItemId(20), ItemId(30)],
            TrainingMeta::now(2, 5, 0.1),
        )
    }

    #[test]
    fn test_recommend_orders_by_score_desc() {
        let model = toy_model();
        let recs = model.recommend(UserId(1), 3, &HashSet::new());
        let ids: Vec<ItemId> = recs.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![ItemId(10), ItemId(30), ItemId(20)]);
    }

    #[test]
    fn test_recommend_excludes_seen_items() {
        let model = toy_model();
        let seen: HashSet<ItemId> = [ItemId(10)].into();
        let recs = model.recommend(UserId(1), 3, &seen);
        assert!(recs.iter().all(|r| r.item_id != ItemId(10)));
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_recommend_unknown_user_is_empty() {
        let model = toy_model();
        assert!(model.recommend(UserId(99), 5, &HashSet::new()).is_empty());
    }

    #[test]
    fn test_recommend_ties_break_by_ascending_item_id() {
        let model = FactorModel::new(
            array![[1.0], [1.0]],
            array![[0.5], [0.5], [0.5]],
            vec![UserId(1), UserId(2)],
            vec![ItemId(31), ItemId(7), ItemId(19)],
            TrainingMeta::now(1, 1, 0.1),
        );
        let recs = model.recommend(UserId(1), 3, &HashSet::new());
        let ids: Vec<ItemId> = recs.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![ItemId(7), ItemId(19), ItemId(31)]);
    }

    #[test]
    fn test_score_for_unknown_pair_is_none() {
        let model = toy_model();
        assert!(model.score(UserId(99), ItemId(10)).is_none());
        assert!(model.score(UserId(1), ItemId(99)).is_none());
    }

    #[test]
    fn test_persist_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cf_model.bin");
        let model = toy_model();
        model.persist(&path).unwrap();

        let loaded = FactorModel::load(&path).unwrap().unwrap();
        assert_eq!(loaded.user_ids(), model.user_ids());
        assert_eq!(loaded.item_ids(), model.item_ids());
        assert_eq!(
            loaded.recommend(UserId(1), 3, &HashSet::new()),
            model.recommend(UserId(1), 3, &HashSet::new())
        );
        assert_eq!(loaded.meta().factors, 2);
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FactorModel::load(&dir.path().join("nope.bin"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_load_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cf_model.bin");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(FactorModel::load(&path).is_err());
    }
}
