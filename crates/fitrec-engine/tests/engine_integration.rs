//! End-to-end tests across both recommendation paths, persistence, and the
//! snapshot-swap concurrency contract.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tempfile::TempDir;

use fitrec_cf::AlsConfig;
use fitrec_core::types::{
    Difficulty, Interaction, InteractionKind, Item, ItemId, ItemKind, ScoredItem, UserId,
};
use fitrec_core::{EmbeddingProvider, FitrecError, FitrecResult};
use fitrec_embeddings::HashedEmbedder;
use fitrec_engine::{EngineConfig, RecommendEngine};

fn test_config(dir: &TempDir) -> EngineConfig {
    let mut config = EngineConfig::in_dir(dir.path());
    config.dimension = 64;
    config.als = AlsConfig {
        factors: 4,
        iterations: 10,
        regularization: 0.1,
        seed: 42,
    };
    config
}

fn catalog() -> Vec<Item> {
    vec![
        Item::new(
            ItemId(1),
            "Full body strength",
            ItemKind::Workout,
            Difficulty::Intermediate,
            45,
        )
        .with_description("compound lifts and progressive overload")
        .with_tags(vec!["strength".into(), "gym".into()]),
        Item::new(
            ItemId(2),
            "Strength training tips",
            ItemKind::Article,
            Difficulty::Intermediate,
            8,
        )
        .with_description("compound lifts and progressive overload")
        .with_tags(vec!["strength".into()]),
        Item::new(
            ItemId(3),
            "Guided breathing",
            ItemKind::Video,
            Difficulty::Beginner,
            10,
        )
        .with_tags(vec!["recovery".into(), "mindfulness".into()]),
        Item::new(
            ItemId(4),
            "5k training plan",
            ItemKind::Article,
            Difficulty::Advanced,
            12,
        )
        .with_tags(vec!["running".into(), "cardio".into()]),
    ]
}

fn interactions() -> Vec<Interaction> {
    let mut events = Vec::new();
    let mut push = |user: i64, item: i64, kind: InteractionKind| {
        events.push(Interaction::new(UserId(user), ItemId(item), kind, Utc::now()));
    };
    // User 1 is a strength user, user 2 runs, user 3 overlaps both.
    push(1, 1, InteractionKind::Complete);
    push(1, 2, InteractionKind::Like);
    push(1, 1, InteractionKind::View);
    push(2, 4, InteractionKind::Complete);
    push(2, 3, InteractionKind::View);
    push(3, 1, InteractionKind::View);
    push(3, 4, InteractionKind::Like);
    events
}

#[test]
fn full_pipeline_produces_blended_rankings() {
    let dir = TempDir::new().unwrap();
    let engine = RecommendEngine::with_default_embedder(test_config(&dir));

    engine.rebuild_index(&catalog()).unwrap();
    engine.retrain_cf(&interactions()).unwrap();

    let seen: HashSet<ItemId> = [ItemId(1)].into();
    let ranked = engine
        .recommend_hybrid(UserId(1), Some(ItemId(1)), 3, None, &seen)
        .unwrap();

    assert!(!ranked.is_empty());
    assert!(ranked.len() <= 3);
    // The anchor and seen item never appears.
    assert!(ranked.iter().all(|r| r.item_id != ItemId(1)));
    // Scores are blends of values in [0, 1].
    assert!(ranked.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    // Descending, ties by ascending id.
    for pair in ranked.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].item_id < pair[1].item_id)
        );
    }
}

#[test]
fn hybrid_without_anchor_matches_cf_order() {
    let dir = TempDir::new().unwrap();
    let engine = RecommendEngine::with_default_embedder(test_config(&dir));
    engine.rebuild_index(&catalog()).unwrap();
    engine.retrain_cf(&interactions()).unwrap();

    let none = HashSet::new();
    let cf: Vec<ItemId> = engine
        .recommend_cf(UserId(1), 4, &none)
        .into_iter()
        .map(|r| r.item_id)
        .collect();
    let hybrid: Vec<ItemId> = engine
        .recommend_hybrid(UserId(1), None, 4, Some(1.0), &none)
        .unwrap()
        .into_iter()
        .map(|r| r.item_id)
        .collect();

    assert_eq!(cf, hybrid);
}

#[test]
fn unknown_user_yields_empty_cf_without_error() {
    let dir = TempDir::new().unwrap();
    let engine = RecommendEngine::with_default_embedder(test_config(&dir));
    engine.retrain_cf(&interactions()).unwrap();

    assert!(engine
        .recommend_cf(UserId(9999), 10, &HashSet::new())
        .is_empty());
}

#[test]
fn snapshots_survive_restart() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let before: Vec<ScoredItem>;
    {
        let engine = RecommendEngine::with_default_embedder(config.clone());
        engine.rebuild_index(&catalog()).unwrap();
        engine.retrain_cf(&interactions()).unwrap();
        before = engine.find_similar(ItemId(1), 3);
    }

    // A fresh engine over the same data directory restores both snapshots.
    let engine = RecommendEngine::with_default_embedder(config);
    let report = engine.load_snapshots();
    assert!(report.index_loaded);
    assert!(report.model_loaded);

    assert_eq!(engine.find_similar(ItemId(1), 3), before);
    assert!(!engine
        .recommend_cf(UserId(1), 3, &HashSet::new())
        .is_empty());
}

#[test]
fn corrupt_snapshot_files_are_treated_as_absent() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    {
        let engine = RecommendEngine::with_default_embedder(config.clone());
        engine.rebuild_index(&catalog()).unwrap();
        engine.retrain_cf(&interactions()).unwrap();
    }

    std::fs::write(config.index_paths().blob, b"garbage").unwrap();
    std::fs::write(config.model_path(), b"garbage").unwrap();

    let engine = RecommendEngine::with_default_embedder(config);
    let report = engine.load_snapshots();
    assert!(!report.index_loaded);
    assert!(!report.model_loaded);

    // The request path stays resilient: empty results, no panic.
    assert!(engine.find_similar(ItemId(1), 3).is_empty());
    assert!(engine.recommend_cf(UserId(1), 3, &HashSet::new()).is_empty());
}

/// Embedder that parks inside `embed_batch` until released, to hold a
/// rebuild open while another request arrives.
struct GatedEmbedder {
    inner: HashedEmbedder,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl EmbeddingProvider for GatedEmbedder {
    fn embed(&self, text: &str) -> FitrecResult<Vec<f32>> {
        self.inner.embed(text)
    }

    fn embed_batch(&self, texts: &[String]) -> FitrecResult<Vec<Vec<f32>>> {
        self.entered.lock().send(()).unwrap();
        self.release.lock().recv().unwrap();
        self.inner.embed_batch(texts)
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> &str {
        "gated-test-embedder"
    }
}

#[test]
fn concurrent_rebuild_is_rejected_not_queued() {
    let dir = TempDir::new().unwrap();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();

    let embedder = Arc::new(GatedEmbedder {
        inner: HashedEmbedder::new(64),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let engine = Arc::new(RecommendEngine::new(test_config(&dir), embedder));

    let background = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || engine.rebuild_index(&catalog()))
    };

    // Wait until the background rebuild is inside the embedding step.
    entered_rx.recv().unwrap();

    let err = engine.rebuild_index(&catalog()).unwrap_err();
    assert!(matches!(err, FitrecError::RebuildInProgress));

    release_tx.send(()).unwrap();
    let count = background.join().unwrap().unwrap();
    assert_eq!(count, 4);

    // With the first rebuild finished the gate is free again.
    release_tx.send(()).unwrap();
    assert_eq!(engine.rebuild_index(&catalog()).unwrap(), 4);
}

#[test]
fn readers_always_observe_a_complete_snapshot() {
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(RecommendEngine::with_default_embedder(test_config(&dir)));

    let small: Vec<Item> = catalog().into_iter().take(2).collect();
    engine.rebuild_index(&small).unwrap();

    let reader = {
        let engine = Arc::clone(&engine);
        std::thread::spawn(move || {
            for _ in 0..500 {
                if let Some(index) = engine.index_snapshot() {
                    // A snapshot is either the 2-item or the 4-item index,
                    // never anything in between.
                    let n = index.mapping().count();
                    assert!(n == 2 || n == 4, "saw partial snapshot of {n} items");
                    assert_eq!(index.len(), n);
                }
            }
        })
    };

    for _ in 0..5 {
        engine.rebuild_index(&catalog()).unwrap();
        engine.rebuild_index(&catalog().into_iter().take(2).collect::<Vec<_>>())
            .unwrap();
    }

    reader.join().unwrap();
}
