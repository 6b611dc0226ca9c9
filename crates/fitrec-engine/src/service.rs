//! Engine service: snapshot ownership, batch jobs, query surface.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use fitrec_cf::{AlsTrainer, FactorModel, InteractionMatrix};
use fitrec_core::config::ranking;
use fitrec_core::error::SnapshotError;
use fitrec_core::types::{Interaction, Item, ItemId, ScoredItem, UserId};
use fitrec_core::{EmbeddingProvider, FitrecError, FitrecResult};
use fitrec_embeddings::{item_text, HashedEmbedder};
use fitrec_index::FlatIndex;

use crate::config::EngineConfig;
use crate::ranking::HybridRanker;

/// What `load_snapshots` found on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub index_loaded: bool,
    pub model_loaded: bool,
}

/// Owned handle to the recommendation engine.
///
/// Holds the two published snapshots (vector index and factor model) behind
/// atomic pointers: queries load whichever snapshot is current without
/// locking, and batch jobs publish a fully-constructed replacement with a
/// single swap. There is deliberately no global instance; the query layer
/// receives this handle by reference.
pub struct RecommendEngine {
    config: EngineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    index: ArcSwapOption<FlatIndex>,
    model: ArcSwapOption<FactorModel>,
    rebuild_gate: Mutex<()>,
    retrain_gate: Mutex<()>,
}

impl RecommendEngine {
    /// Create an engine with an explicit embedding provider.
    pub fn new(config: EngineConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            embedder,
            index: ArcSwapOption::empty(),
            model: ArcSwapOption::empty(),
            rebuild_gate: Mutex::new(()),
            retrain_gate: Mutex::new(()),
        }
    }

    /// Create an engine backed by the deterministic hash embedder.
    pub fn with_default_embedder(config: EngineConfig) -> Self {
        let embedder = Arc::new(HashedEmbedder::new(config.dimension));
        Self::new(config, embedder)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attempt to load both persisted snapshots.
    ///
    /// Missing files mean nothing was persisted yet; a corrupt file is
    /// logged and treated as absent so the request path never sees the
    /// failure. Either way the caller decides whether to rebuild.
    pub fn load_snapshots(&self) -> LoadReport {
        let mut report = LoadReport::default();

        match FlatIndex::load(&self.config.index_paths()) {
            Ok(Some((index, _updated_at))) => {
                self.index.store(Some(Arc::new(index)));
                report.index_loaded = true;
            }
            Ok(None) => debug!("no persisted vector index"),
            Err(e) => warn!(error = %e, "unreadable vector index snapshot, treating as absent"),
        }

        match FactorModel::load(&self.config.model_path()) {
            Ok(Some(model)) => {
                self.model.store(Some(Arc::new(model)));
                report.model_loaded = true;
            }
            Ok(None) => debug!("no persisted factor model"),
            Err(e) => warn!(error = %e, "unreadable factor model snapshot, treating as absent"),
        }

        report
    }

    /// Currently published index snapshot, if any.
    pub fn index_snapshot(&self) -> Option<Arc<FlatIndex>> {
        self.index.load_full()
    }

    /// Currently published factor model snapshot, if any.
    pub fn model_snapshot(&self) -> Option<Arc<FactorModel>> {
        self.model.load_full()
    }

    // ------------------------------------------------------------------
    // Query surface (lock-free reads)
    // ------------------------------------------------------------------

    /// Content path: items most similar to `item_id`, the item itself
    /// excluded. Empty when no index is published or the item is unknown.
    pub fn find_similar(&self, item_id: ItemId, k: usize) -> Vec<ScoredItem> {
        match self.index.load_full() {
            Some(index) => index.find_similar(item_id, k),
            None => Vec::new(),
        }
    }

    /// Collaborative path: top-`n` items for a user, seen items excluded.
    /// Empty when no model is published or the user was not in the training
    /// snapshot.
    pub fn recommend_cf(
        &self,
        user_id: UserId,
        n: usize,
        exclude: &HashSet<ItemId>,
    ) -> Vec<ScoredItem> {
        match self.model.load_full() {
            Some(model) => model.recommend(user_id, n, exclude),
            None => Vec::new(),
        }
    }

    /// Blended ranking of both paths.
    ///
    /// Over-fetches `2n` candidates per path, normalizes each list to
    /// [0, 1], and blends with `alpha` (defaulting to the configured
    /// weight). With no `anchor` the content list is empty and the blend
    /// degenerates to the scaled CF ranking; for a user unknown to the
    /// model the CF list is empty and the content list carries the ranking,
    /// which is the cold-start fallback.
    ///
    /// # Errors
    ///
    /// `RankingError::InvalidAlpha` for `alpha` outside [0, 1], rejected
    /// before touching either snapshot.
    pub fn recommend_hybrid(
        &self,
        user_id: UserId,
        anchor: Option<ItemId>,
        n: usize,
        alpha: Option<f32>,
        exclude: &HashSet<ItemId>,
    ) -> FitrecResult<Vec<ScoredItem>> {
        let alpha = alpha.unwrap_or(self.config.default_alpha);
        let ranker = HybridRanker::new(alpha).map_err(FitrecError::from)?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let fetch = n.saturating_mul(ranking::CANDIDATE_MULTIPLIER);
        let cf_candidates = self.recommend_cf(user_id, fetch, exclude);
        let content_candidates = anchor
            .map(|item| self.find_similar(item, fetch))
            .unwrap_or_default();

        Ok(ranker.rank(&cf_candidates, &content_candidates, exclude, n))
    }

    // ------------------------------------------------------------------
    // Batch jobs (single-flight, run off the request path)
    // ------------------------------------------------------------------

    /// Rebuild the vector index from a catalog snapshot.
    ///
    /// Embeds every item, constructs a complete new index, persists it, and
    /// publishes it with one atomic swap; in-flight readers keep the old
    /// snapshot until the swap. Single-flight: a rebuild arriving while one
    /// runs is rejected with `FitrecError::RebuildInProgress`. On any
    /// failure the previously published snapshot stays in service.
    pub fn rebuild_index(&self, items: &[Item]) -> FitrecResult<usize> {
        let Some(_guard) = self.rebuild_gate.try_lock() else {
            return Err(FitrecError::RebuildInProgress);
        };

        let texts: Vec<String> = items.iter().map(item_text).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        let entries: Vec<(ItemId, Vec<f32>)> = items
            .iter()
            .map(|item| item.id)
            .zip(embeddings)
            .collect();

        let mut index = FlatIndex::with_dimension(self.embedder.dimensions())
            .map_err(FitrecError::from)?;
        index.add(&entries)?;
        index.seal();

        self.ensure_data_dir()?;
        index.persist(&self.config.index_paths())?;

        let count = index.len();
        self.index.store(Some(Arc::new(index)));
        info!(items = count, "published rebuilt vector index");
        Ok(count)
    }

    /// Retrain the collaborative filtering model from a log snapshot.
    ///
    /// Builds the interaction matrix, factorizes it, persists the bundle,
    /// and publishes it atomically. Single-flight like `rebuild_index`;
    /// `CfError::InsufficientData` (or any other failure) leaves the prior
    /// model snapshot untouched.
    pub fn retrain_cf(&self, interactions: &[Interaction]) -> FitrecResult<()> {
        let Some(_guard) = self.retrain_gate.try_lock() else {
            return Err(FitrecError::RetrainInProgress);
        };

        let matrix = InteractionMatrix::build(interactions);
        let trainer = AlsTrainer::new(self.config.als);
        let model = trainer.train(&matrix).map_err(FitrecError::from)?;

        self.ensure_data_dir()?;
        model.persist(&self.config.model_path())?;

        info!(
            users = model.n_users(),
            items = model.n_items(),
            "published retrained factor model"
        );
        self.model.store(Some(Arc::new(model)));
        Ok(())
    }

    fn ensure_data_dir(&self) -> Result<(), SnapshotError> {
        std::fs::create_dir_all(&self.config.data_dir)
            .map_err(|e| SnapshotError::io("creating data directory", e))
    }
}
