//! Alternating least squares over the implicit-feedback matrix.
//!
//! Each half-iteration holds one factor matrix fixed and solves, per row,
//! the regularized normal equations `(YᵀY + λI) x = Yᵀw` restricted to the
//! row's observed cells. The r×r systems are solved in `f64` by Cholesky
//! decomposition; λ > 0 keeps them positive definite even for rows with a
//! single observation. Rows are independent, so each half-iteration is
//! parallelized with rayon.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use fitrec_core::config::als;
use fitrec_core::error::CfError;

use crate::matrix::InteractionMatrix;
use crate::model::{FactorModel, TrainingMeta};

/// ALS hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct AlsConfig {
    /// Latent factor rank `r`.
    pub factors: usize,
    /// Number of alternating iterations.
    pub iterations: usize,
    /// L2 regularization λ added to each normal-equation diagonal.
    pub regularization: f32,
    /// Seed for factor initialization; a fixed seed reproduces a run.
    pub seed: u64,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            factors: als::DEFAULT_FACTORS,
            iterations: als::DEFAULT_ITERATIONS,
            regularization: als::DEFAULT_REGULARIZATION,
            seed: als::DEFAULT_SEED,
        }
    }
}

impl AlsConfig {
    fn validate(&self) -> Result<(), CfError> {
        if self.factors == 0 {
            return Err(CfError::InvalidHyperparameter {
                name: "factors",
                reason: "rank must be positive".into(),
            });
        }
        if self.iterations == 0 {
            return Err(CfError::InvalidHyperparameter {
                name: "iterations",
                reason: "must run at least one iteration".into(),
            });
        }
        if !(self.regularization > 0.0) || !self.regularization.is_finite() {
            return Err(CfError::InvalidHyperparameter {
                name: "regularization",
                reason: format!("{} is not a positive finite value", self.regularization),
            });
        }
        Ok(())
    }
}

/// Batch trainer producing a [`FactorModel`] snapshot.
#[derive(Debug, Clone, Default)]
pub struct AlsTrainer {
    config: AlsConfig,
}

impl AlsTrainer {
    #[must_use]
    pub fn new(config: AlsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlsConfig {
        &self.config
    }

    /// Factorize the matrix into user and item factors.
    ///
    /// # Errors
    ///
    /// - `CfError::InsufficientData` for fewer than 2 users or 2 items; the
    ///   caller keeps whatever model snapshot was previously published.
    /// - `CfError::InvalidHyperparameter` for a degenerate config.
    /// - `CfError::SolveFailed` if a normal-equation system is not positive
    ///   definite, which only happens with non-finite interaction weights.
    pub fn train(&self, matrix: &InteractionMatrix) -> Result<FactorModel, CfError> {
        self.config.validate()?;

        let (n_users, n_items) = (matrix.n_users(), matrix.n_items());
        if n_users < 2 || n_items < 2 {
            return Err(CfError::InsufficientData {
                users: n_users,
                items: n_items,
            });
        }

        let r = self.config.factors;
        let lambda = f64::from(self.config.regularization);

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut user_factors = random_factors(&mut rng, n_users, r);
        let mut item_factors = random_factors(&mut rng, n_items, r);

        debug!(
            users = n_users,
            items = n_items,
            nnz = matrix.nnz(),
            factors = r,
            iterations = self.config.iterations,
            "starting ALS training"
        );

        for iteration in 0..self.config.iterations {
            solve_side(&mut user_factors, &item_factors, matrix.user_rows(), lambda)?;
            solve_side(&mut item_factors, &user_factors, matrix.item_cols(), lambda)?;

            if iteration % 2 == 0 {
                let loss = reconstruction_mse(matrix, &user_factors, &item_factors);
                debug!(iteration, loss, "ALS iteration");
            }
        }

        Ok(FactorModel::new(
            user_factors,
            item_factors,
            matrix.user_ids().to_vec(),
            matrix.item_ids().to_vec(),
            TrainingMeta::now(
                self.config.factors,
                self.config.iterations,
                self.config.regularization,
            ),
        ))
    }
}

/// Uniform init in [-0.1, 0.1); small enough that the first half-iteration
/// dominates it.
fn random_factors(rng: &mut ChaCha8Rng, rows: usize, r: usize) -> Array2<f32> {
    let mut factors = Array2::zeros((rows, r));
    for value in factors.iter_mut() {
        *value = rng.gen_range(-0.1..0.1);
    }
    factors
}

/// Re-solve every row of `target` against the fixed `other` side.
fn solve_side(
    target: &mut Array2<f32>,
    other: &Array2<f32>,
    observed: &[Vec<(usize, f32)>],
    lambda: f64,
) -> Result<(), CfError> {
    let current: &Array2<f32> = target;
    let solved: Vec<Array1<f32>> = observed
        .par_iter()
        .enumerate()
        .map(|(row, cells)| {
            if cells.is_empty() {
                // Cannot happen for a matrix built from real events, but a
                // row with no observations keeps its current value.
                Ok(current.row(row).to_owned())
            } else {
                solve_row(cells, other, lambda)
            }
        })
        .collect::<Result<_, _>>()?;

    for (row, values) in solved.into_iter().enumerate() {
        target.row_mut(row).assign(&values);
    }
    Ok(())
}

/// Solve `(YᵀY + λI) x = Yᵀw` over one row's observed cells.
fn solve_row(
    cells: &[(usize, f32)],
    other: &Array2<f32>,
    lambda: f64,
) -> Result<Array1<f32>, CfError> {
    let r = other.ncols();
    let mut a = Array2::<f64>::zeros((r, r));
    let mut b = Array1::<f64>::zeros(r);

    for &(index, weight) in cells {
        let y = other.row(index);
        let w = f64::from(weight);
        for i in 0..r {
            let yi = f64::from(y[i]);
            b[i] += w * yi;
            for j in 0..=i {
                a[[i, j]] += yi * f64::from(y[j]);
            }
        }
    }
    // Only the lower triangle was accumulated; the solver reads nothing else.
    for i in 0..r {
        a[[i, i]] += lambda;
    }

    let x = cholesky_solve(&a, &b)?;
    Ok(x.mapv(|v| v as f32))
}

/// Cholesky factorization `A = LLᵀ` followed by forward and backward
/// substitution. `A` must be symmetric positive definite; only its lower
/// triangle is read.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, CfError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return Err(CfError::SolveFailed(format!(
                        "non-positive pivot {diag} at row {i}"
                    )));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Ok(x)
}

/// Mean squared error over observed cells only.
fn reconstruction_mse(
    matrix: &InteractionMatrix,
    user_factors: &Array2<f32>,
    item_factors: &Array2<f32>,
) -> f32 {
    let mut loss = 0.0f32;
    for (u, cells) in matrix.user_rows().iter().enumerate() {
        for &(i, weight) in cells {
            let predicted = user_factors.row(u).dot(&item_factors.row(i));
            loss += (weight - predicted) * (weight - predicted);
        }
    }
    if matrix.nnz() > 0 {
        loss / matrix.nnz() as f32
    } else {
        0.0
    }
}
