//! Hybrid recommendation engine service.
//!
//! Merges the two recommendation paths (collaborative filtering factors and
//! content-based vector similarity) behind one query surface:
//!
//! - [`RecommendEngine::find_similar`]: content path only
//! - [`RecommendEngine::recommend_cf`]: collaborative path only
//! - [`RecommendEngine::recommend_hybrid`]: normalized, blended ranking
//! - [`RecommendEngine::rebuild_index`] / [`RecommendEngine::retrain_cf`]:
//!   batch jobs that construct, persist, and atomically publish a new
//!   snapshot
//!
//! # Concurrency
//!
//! Queries are lock-free reads of atomically-swapped snapshots; batch jobs
//! are single-flight per resource and intended for worker threads. A failed
//! job leaves the previously published snapshot in service.

mod config;
mod ranking;
mod service;

pub use config::EngineConfig;
pub use ranking::{blend, min_max_normalize, HybridRanker};
pub use service::{LoadReport, RecommendEngine};
