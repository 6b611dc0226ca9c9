//! Centralized engine constants.
//!
//! Magic numbers for the recommendation paths live here as named constants
//! so the index, trainer and ranker all agree on defaults and tests stay
//! consistent with production values.

/// Interaction evidence weights.
///
/// Implicit signals only; multiple events for the same (user, item) pair sum
/// with no clipping.
pub mod weights {
    /// Weight of a view event.
    pub const VIEW: f32 = 1.0;

    /// Weight of a like event.
    pub const LIKE: f32 = 3.0;

    /// Weight of a complete event.
    pub const COMPLETE: f32 = 5.0;
}

/// Embedding defaults.
pub mod embedding {
    /// Default embedding dimension.
    ///
    /// Matches the all-MiniLM class of sentence encoders the catalog was
    /// originally indexed with, so persisted indexes stay compatible when a
    /// real model is swapped in behind `EmbeddingProvider`.
    pub const DEFAULT_DIMENSION: usize = 384;

    /// Batch chunk size for `embed_batch` implementations.
    ///
    /// Chunking is an efficiency detail only; results must be pairwise
    /// identical to sequential single calls.
    pub const BATCH_CHUNK: usize = 32;
}

/// Alternating-least-squares training defaults.
pub mod als {
    /// Default latent factor rank.
    pub const DEFAULT_FACTORS: usize = 50;

    /// Default number of alternating iterations.
    pub const DEFAULT_ITERATIONS: usize = 15;

    /// Default L2 regularization added to each normal-equation diagonal.
    ///
    /// Keeps the r-by-r systems positive definite even for rows with a
    /// single observation.
    pub const DEFAULT_REGULARIZATION: f32 = 0.1;

    /// Default seed for factor initialization.
    ///
    /// A fixed seed keeps training runs reproducible; callers that want run
    /// variety pass their own.
    pub const DEFAULT_SEED: u64 = 0x5EED;
}

/// Hybrid ranking defaults.
pub mod ranking {
    /// Default blend weight: `alpha * cf + (1 - alpha) * content`.
    pub const DEFAULT_ALPHA: f32 = 0.5;

    /// Candidate over-fetch multiplier for each path before blending.
    ///
    /// Fetching `2n` from each source gives the blend enough overlap to
    /// fill `n` slots after exclusions.
    pub const CANDIDATE_MULTIPLIER: usize = 2;
}

#[cfg(test)]
#[allow(clippy::assertions_on_constants)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_strictly_increasing() {
        assert!(weights::VIEW < weights::LIKE);
        assert!(weights::LIKE < weights::COMPLETE);
    }

    #[test]
    fn test_default_alpha_in_unit_interval() {
        assert!((0.0..=1.0).contains(&ranking::DEFAULT_ALPHA));
    }

    #[test]
    fn test_als_defaults_sane() {
        assert!(als::DEFAULT_FACTORS > 0);
        assert!(als::DEFAULT_ITERATIONS > 0);
        assert!(als::DEFAULT_REGULARIZATION > 0.0);
    }
}
