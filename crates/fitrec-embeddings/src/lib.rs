//! Deterministic text embeddings for catalog items.
//!
//! The content path needs a fixed-dimension vector per item, derived from its
//! descriptive fields at a point in time. The real encoder is an opaque
//! external model behind [`fitrec_core::EmbeddingProvider`]; this crate
//! supplies the text composition rule shared by every provider and a
//! dependency-free feature-hashing provider that is exactly reproducible,
//! which the engine and its tests run against.

mod hashed;
mod text;

pub use hashed::HashedEmbedder;
pub use text::item_text;
