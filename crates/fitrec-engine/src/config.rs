//! Engine configuration.

use std::path::{Path, PathBuf};

use fitrec_cf::AlsConfig;
use fitrec_core::config::{embedding, ranking};
use fitrec_index::IndexPaths;

/// Configuration for a [`RecommendEngine`](crate::RecommendEngine).
///
/// Everything has a production default; tests override `data_dir` with a
/// temp directory and shrink the ALS rank.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the persisted index and model snapshots.
    pub data_dir: PathBuf,
    /// Embedding dimension the index is built with.
    pub dimension: usize,
    /// ALS training hyperparameters.
    pub als: AlsConfig,
    /// Default blend weight for hybrid queries.
    pub default_alpha: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            dimension: embedding::DEFAULT_DIMENSION,
            als: AlsConfig::default(),
            default_alpha: ranking::DEFAULT_ALPHA,
        }
    }
}

impl EngineConfig {
    /// Config rooted at a data directory, defaults elsewhere.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Paths of the vector index snapshot files.
    pub fn index_paths(&self) -> IndexPaths {
        IndexPaths::in_dir(&self.data_dir)
    }

    /// Path of the factor model snapshot file.
    pub fn model_path(&self) -> PathBuf {
        self.data_dir.join("cf_model.bin")
    }
}
