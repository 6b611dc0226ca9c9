//! Vector similarity index for the content-based recommendation path.
//!
//! An exhaustive L2 index over item embeddings with a compact slot mapping.
//! At catalog scale (thousands of items) a flat scan is faster than any
//! approximate structure's overhead; the k-NN query surface is the stable
//! contract, so an approximate index can replace [`FlatIndex`] later without
//! touching callers.
//!
//! # Lifecycle
//!
//! `Uninitialized -> Building -> Ready`; reads are only answered in `Ready`.
//! A rebuild constructs the new state in full before it is published by the
//! engine, and persistence uses a temp-file-and-rename swap so a concurrent
//! load never sees a torn file.

mod flat;
mod snapshot;

pub use flat::{FlatIndex, IndexState};
pub use snapshot::IndexPaths;
