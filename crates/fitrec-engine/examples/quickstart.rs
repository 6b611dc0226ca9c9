//! Build both recommendation paths from a tiny in-memory catalog and query
//! the blended ranking.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example quickstart
//! ```

use std::collections::HashSet;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use fitrec_cf::AlsConfig;
use fitrec_core::types::{Difficulty, Interaction, InteractionKind, Item, ItemId, ItemKind, UserId};
use fitrec_engine::{EngineConfig, RecommendEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let data_dir = tempfile::tempdir()?;
    let mut config = EngineConfig::in_dir(data_dir.path());
    config.dimension = 128;
    config.als = AlsConfig {
        factors: 8,
        iterations: 12,
        ..AlsConfig::default()
    };

    let engine = RecommendEngine::with_default_embedder(config);

    let catalog = vec![
        item(1, "Full body strength", ItemKind::Workout, 45, &["strength", "gym"]),
        item(2, "Strength training tips", ItemKind::Article, 8, &["strength"]),
        item(3, "Guided breathing", ItemKind::Video, 10, &["recovery"]),
        item(4, "5k training plan", ItemKind::Article, 12, &["running", "cardio"]),
        item(5, "Interval sprints", ItemKind::Workout, 25, &["running", "cardio"]),
    ];
    engine.rebuild_index(&catalog)?;

    let log = vec![
        event(1, 1, InteractionKind::Complete),
        event(1, 2, InteractionKind::Like),
        event(2, 4, InteractionKind::Complete),
        event(2, 5, InteractionKind::Like),
        event(3, 1, InteractionKind::View),
        event(3, 5, InteractionKind::View),
    ];
    engine.retrain_cf(&log)?;

    let seen: HashSet<ItemId> = [ItemId(1)].into();
    let ranked = engine.recommend_hybrid(UserId(1), Some(ItemId(1)), 3, None, &seen)?;
    println!("recommendations for user 1 (anchored on item 1):");
    for rec in ranked {
        println!("  item {:>2}  score {:.3}", rec.item_id, rec.score);
    }

    Ok(())
}

fn item(id: i64, title: &str, kind: ItemKind, minutes: u32, tags: &[&str]) -> Item {
    Item::new(ItemId(id), title, kind, Difficulty::Intermediate, minutes)
        .with_tags(tags.iter().map(|t| t.to_string()).collect())
}

fn event(user: i64, item: i64, kind: InteractionKind) -> Interaction {
    Interaction::new(UserId(user), ItemId(item), kind, Utc::now())
}
