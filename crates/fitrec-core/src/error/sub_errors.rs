//! Sub-error types for the fitrec engine.
//!
//! Each error type covers a specific domain of failures.

use thiserror::Error;

use crate::types::ItemId;

// ============================================================================
// EMBEDDING ERROR
// ============================================================================

/// Embedding-related errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Empty input text provided for embedding.
    #[error("Empty input text")]
    EmptyInput,

    /// Vector dimension does not match the provider's configured dimension.
    ///
    /// # When This Occurs
    ///
    /// - Mixing embeddings from differently-configured providers
    /// - Corrupted embedding data
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension received
        actual: usize,
    },

    /// Embedding generation failed.
    #[error("Embedding generation failed: {0}")]
    GenerationFailed(String),
}

// ============================================================================
// INDEX ERROR
// ============================================================================

/// Vector index errors.
///
/// Query operations on the index (`search`, `find_similar`) represent
/// unknown ids and empty indexes as empty results, not as errors; these
/// variants cover construction and mutation failures only.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    /// Index initialized with a non-positive dimension.
    #[error("Invalid index dimension: {0}")]
    InvalidDimension(usize),

    /// Vector with the wrong dimension offered to the index.
    #[error("Dimension mismatch adding {item_id}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Item whose vector was rejected
        item_id: ItemId,
        /// Index dimension
        expected: usize,
        /// Offered vector dimension
        actual: usize,
    },
}

// ============================================================================
// COLLABORATIVE FILTERING ERROR
// ============================================================================

/// Collaborative filtering training errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CfError {
    /// Training attempted on an empty or near-empty interaction matrix.
    ///
    /// Fatal to the training call only; any previously published model
    /// snapshot remains in service.
    #[error("Insufficient data for training: {users} users x {items} items")]
    InsufficientData {
        /// Distinct users in the matrix
        users: usize,
        /// Distinct items in the matrix
        items: usize,
    },

    /// A least-squares solve failed.
    ///
    /// With positive regularization the normal equations are positive
    /// definite, so this indicates non-finite weights in the input.
    #[error("Factorization solve failed: {0}")]
    SolveFailed(String),

    /// Invalid training hyperparameter.
    #[error("Invalid hyperparameter {name}: {reason}")]
    InvalidHyperparameter {
        /// Parameter name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

// ============================================================================
// SNAPSHOT ERROR
// ============================================================================

/// Persisted snapshot errors (vector index and factor model files).
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem operation failed.
    #[error("Snapshot I/O error while {context}: {source}")]
    Io {
        /// Operation being attempted
        context: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot (de)serialization failed.
    #[error("Snapshot serialization error while {context}: {message}")]
    Serialization {
        /// Operation being attempted
        context: &'static str,
        /// Underlying serializer message
        message: String,
    },

    /// Persisted state is internally inconsistent.
    ///
    /// Loaders treat this as absent state: the caller logs it and rebuilds
    /// rather than propagating into the request path.
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
}

impl SnapshotError {
    /// Wrap an I/O error with the operation being attempted.
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    /// Wrap a serializer error with the operation being attempted.
    pub fn serialization(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Serialization {
            context,
            message: err.to_string(),
        }
    }
}

// ============================================================================
// RANKING ERROR
// ============================================================================

/// Hybrid ranking parameter errors.
///
/// Rejected at the engine boundary before any index or model access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RankingError {
    /// Blend weight outside [0, 1].
    #[error("Invalid alpha {0}: must be within [0, 1]")]
    InvalidAlpha(f32),
}
