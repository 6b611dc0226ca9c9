//! Embedding provider trait for text-to-vector conversion.
//!
//! The embedding model itself is an external dependency treated as an opaque
//! function `text -> vector[d]`. Implementations must be pure over the input
//! text: identical text yields an identical vector, and batch results are
//! pairwise identical to sequential single calls (the engine's batching
//! optimization must introduce no numeric drift).

use crate::error::{EmbeddingError, FitrecResult};

/// Trait for deterministic embedding generation.
///
/// Implementations must be thread-safe (`Send + Sync`); the engine shares a
/// single provider across concurrent queries and background rebuilds.
///
/// # Error Handling
///
/// Errors propagate immediately; there is no fallback vector. Empty input
/// text is `EmbeddingError::EmptyInput`.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    ///
    /// # Errors
    ///
    /// - `EmbeddingError::EmptyInput` if `text` is empty or whitespace.
    fn embed(&self, text: &str) -> FitrecResult<Vec<f32>>;

    /// Generate embeddings for a batch of texts, in input order.
    ///
    /// Must produce results pairwise identical to calling [`embed`] on each
    /// text; chunking is purely an efficiency concern.
    ///
    /// [`embed`]: EmbeddingProvider::embed
    fn embed_batch(&self, texts: &[String]) -> FitrecResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Output dimension of every vector this provider produces.
    fn dimensions(&self) -> usize;

    /// Identifier of the underlying model, for logging and snapshot metadata.
    fn model_id(&self) -> &str;

    /// Validate that a produced vector matches the configured dimension.
    fn validate_dimension(&self, vector: &[f32]) -> Result<(), EmbeddingError> {
        if vector.len() == self.dimensions() {
            Ok(())
        } else {
            Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            })
        }
    }
}
