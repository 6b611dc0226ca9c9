//! Feature-hashing embedding provider.
//!
//! FNV-1a token hashing into `d` signed buckets, L2-normalized. No model
//! weights, no I/O; the vector is a pure function of the input text, which
//! makes index rebuilds and the batch-equals-sequential contract trivially
//! verifiable. Items sharing vocabulary land in overlapping buckets, so
//! nearest-neighbor search over these vectors still ranks textually similar
//! items first.

use fitrec_core::config::embedding;
use fitrec_core::error::EmbeddingError;
use fitrec_core::{EmbeddingProvider, FitrecResult};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Deterministic feature-hashing embedder.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dimension: usize,
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new(embedding::DEFAULT_DIMENSION)
    }
}

impl HashedEmbedder {
    /// Create an embedder producing vectors of the given dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            // Top bit decides the sign so colliding tokens can cancel
            // instead of always accumulating.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }
}

impl EmbeddingProvider for HashedEmbedder {
    fn embed(&self, text: &str) -> FitrecResult<Vec<f32>> {
        Ok(self.embed_one(text)?)
    }

    /// Batch in fixed chunks; per-text results are identical to sequential
    /// calls because each vector depends only on its own text.
    fn embed_batch(&self, texts: &[String]) -> FitrecResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(embedding::BATCH_CHUNK) {
            for text in chunk {
                out.push(self.embed_one(text)?);
            }
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        "fnv1a-hash-v1"
    }
}

/// Lowercased alphanumeric tokens; everything else separates.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
