//! Collaborative filtering over implicit interaction signals.
//!
//! The interaction log is aggregated into a weighted sparse user×item matrix
//! ([`InteractionMatrix`]), factorized by alternating least squares
//! ([`AlsTrainer`]) into a [`FactorModel`]: low-rank user and item factors
//! bundled with the exact id↔index mappings used at training time. The
//! bundle is the unit of persistence and of publication: factors are
//! numerically meaningless against any other mapping, so nothing here ever
//! hands them out separately.

mod als;
mod matrix;
mod model;

pub use als::{AlsConfig, AlsTrainer};
pub use matrix::InteractionMatrix;
pub use model::{FactorModel, TrainingMeta};
