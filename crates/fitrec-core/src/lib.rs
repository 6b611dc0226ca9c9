//! Fitrec Core Library
//!
//! Core domain types, error taxonomy, and configuration for the fitrec
//! hybrid recommendation engine.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`Item`, `Interaction`, `ScoredItem`, id newtypes)
//! - The `EmbeddingProvider` trait implemented by `fitrec-embeddings`
//! - Error types and the `FitrecResult` alias
//! - Named constants for engine defaults
//!
//! # Example
//!
//! ```
//! use fitrec_core::types::{InteractionKind, ItemId};
//!
//! assert_eq!(InteractionKind::Like.weight(), 3.0);
//! assert!(ItemId(3) < ItemId(7));
//! ```

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use error::{FitrecError, FitrecResult};
pub use traits::EmbeddingProvider;
pub use types::{Interaction, InteractionKind, Item, ItemId, ScoredItem, UserId};
