//! Top-level unified error type for the fitrec engine.

use thiserror::Error;

use super::sub_errors::{CfError, EmbeddingError, IndexError, RankingError, SnapshotError};

/// Top-level unified error type.
///
/// All crate errors convert into this type via `From` implementations, so
/// the engine service and its consumers handle one error surface.
///
/// # Recoverability
///
/// - `Cf(InsufficientData)` and `Snapshot(Corrupt)` leave any previously
///   published snapshot in service; the caller retries after more data
///   arrives or triggers a rebuild.
/// - `RebuildInProgress` / `RetrainInProgress` are transient: exactly one
///   batch job per resource runs at a time, retry after it publishes.
#[derive(Debug, Error)]
pub enum FitrecError {
    /// Embedding-related error.
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index error.
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Collaborative filtering error.
    #[error("Collaborative filtering error: {0}")]
    Cf(#[from] CfError),

    /// Persisted snapshot error.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Ranking parameter error.
    #[error("Ranking error: {0}")]
    Ranking(#[from] RankingError),

    /// An index rebuild is already running.
    #[error("Index rebuild already in progress")]
    RebuildInProgress,

    /// A collaborative filtering retrain is already running.
    #[error("Model retrain already in progress")]
    RetrainInProgress,
}

impl FitrecError {
    /// Whether the operation can be retried without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RebuildInProgress | Self::RetrainInProgress)
    }
}
