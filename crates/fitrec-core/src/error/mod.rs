//! Error types for the fitrec engine.
//!
//! Each sub-error covers one domain of failures; `FitrecError` unifies them
//! for callers that cross component boundaries (the engine service and its
//! consumers). Query-path conditions that can be represented as "no results"
//! are returned that way and never surface here.

mod sub_errors;
mod unified;


pub use sub_errors::{CfError, EmbeddingError, IndexError, RankingError, SnapshotError};
pub use unified::FitrecError;

/// Result alias for fallible engine operations.
pub type FitrecResult<T> = Result<T, FitrecError>;
