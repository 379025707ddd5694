//! Matrix recovery from random matrix-vector products.

use nalgebra::{DMatrix, DVector};

use crate::benchmark::{mat_to_vec, signum0, vec_to_mat, BenchState, Benchmark, PointwiseLoss};
use crate::error::{Error, Result};
use crate::image::Image;

/// Recovers a matrix the optimizer can only observe through products with
/// random probe vectors.
///
/// Each step draws a fresh probe block `P ~ N(0,1)^(m x batch)` and compares
/// `AP` with `BP` for the trainable `B`; the objective is stochastic, so the
/// loss curve is noisy even close to the solution. Optional `l1`/`l2`/`linf`
/// penalties on `B` regularize the recovery.
pub struct StochasticMatrixRecovery {
    state: BenchState,
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    probe: DMatrix<f64>,
    batch_size: usize,
    criterion: PointwiseLoss,
    l1: f64,
    l2: f64,
    linf: f64,
    log_frames: bool,
}

impl StochasticMatrixRecovery {
    /// Recovery of a seeded `size x size` Gaussian matrix.
    ///
    /// # Errors
    ///
    /// Returns an error when `size == 0`.
    pub fn randn(size: usize, seed: u64) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidDimension {
                dim: size,
                reason: "matrix recovery needs a non-empty matrix",
            });
        }
        let mut state = BenchState::new(seed);
        let a = state.rng().normal_matrix(size, size);
        Self::build(state, a, false)
    }

    /// Recovery of an explicit matrix (image-like inputs welcome).
    ///
    /// The input is kept as the `"A"` reference image and the estimate is
    /// logged as the `"B"` frame series.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty matrix.
    pub fn with_matrix(a: DMatrix<f64>, seed: u64) -> Result<Self> {
        if a.is_empty() {
            return Err(Error::InvalidDimension {
                dim: 0,
                reason: "matrix recovery needs a non-empty matrix",
            });
        }
        let mut state = BenchState::new(seed);
        state.add_reference_image("A", Image::from_matrix(&a));
        Self::build(state, a, true)
    }

    fn build(mut state: BenchState, a: DMatrix<f64>, log_frames: bool) -> Result<Self> {
        let (rows, cols) = a.shape();
        let b = state.rng().normal_matrix(rows, cols);
        let batch_size = 1;
        let probe = state.rng().normal_matrix(cols, batch_size);
        Ok(Self {
            state,
            a,
            b,
            probe,
            batch_size,
            criterion: PointwiseLoss::Mse,
            l1: 0.0,
            l2: 0.0,
            linf: 0.0,
            log_frames,
        })
    }

    /// Number of probe vectors per step (default 1).
    ///
    /// # Errors
    ///
    /// Returns an error when `batch_size == 0`.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig {
                name: "batch_size",
                reason: "at least one probe vector per step is required".to_string(),
            });
        }
        self.batch_size = batch_size;
        self.probe = self.state.rng().normal_matrix(self.a.ncols(), batch_size);
        Ok(self)
    }

    /// Swaps the criterion (default MSE).
    #[must_use]
    pub fn with_criterion(mut self, criterion: PointwiseLoss) -> Self {
        self.criterion = criterion;
        self
    }

    /// Weighted norm penalties on the estimate (`l1`, `l2`, max-abs).
    #[must_use]
    pub fn with_penalties(mut self, l1: f64, l2: f64, linf: f64) -> Self {
        self.l1 = l1;
        self.l2 = l2;
        self.linf = linf;
        self
    }

    fn penalty(&self) -> f64 {
        let mut penalty = 0.0;
        if self.l1 != 0.0 {
            penalty += self.l1 * self.b.iter().map(|v| v.abs()).sum::<f64>();
        }
        if self.l2 != 0.0 {
            penalty += self.l2 * self.b.norm();
        }
        if self.linf != 0.0 {
            penalty += self.linf
                * self
                    .b
                    .iter()
                    .map(|v| v.abs())
                    .fold(0.0_f64, f64::max);
        }
        penalty
    }
}

impl Benchmark for StochasticMatrixRecovery {
    fn name(&self) -> &str {
        "stochastic_matrix_recovery"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.b.len()
    }

    fn params(&self) -> DVector<f64> {
        mat_to_vec(&self.b)
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != self.b.len() {
            return Err(Error::ParamLenMismatch {
                expected: self.b.len(),
                got: params.len(),
            });
        }
        self.b = vec_to_mat(params, self.b.nrows(), self.b.ncols());
        Ok(())
    }

    fn pre_step(&mut self) {
        self.probe = self
            .state
            .rng()
            .normal_matrix(self.a.ncols(), self.batch_size);
    }

    fn evaluate(&mut self) -> Result<f64> {
        let ap = &self.a * &self.probe;
        let bp = &self.b * &self.probe;
        if self.log_frames && self.state.should_log_images() {
            self.state
                .log_image_with_difference("B", Image::from_matrix(&self.b));
        }
        Ok(self.criterion.eval(&ap, &bp) + self.penalty())
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let ap = &self.a * &self.probe;
        let bp = &self.b * &self.probe;
        // B sits in the second criterion argument.
        let d = self.criterion.grad(&ap, &bp);
        let mut grad = -(d * self.probe.transpose());

        if self.l1 != 0.0 {
            grad += self.b.map(|v| self.l1 * signum0(v));
        }
        if self.l2 != 0.0 {
            let norm = self.b.norm();
            if norm > 0.0 {
                grad += &self.b * (self.l2 / norm);
            }
        }
        if self.linf != 0.0 {
            // Subgradient at the largest-magnitude entry.
            let mut arg = (0, 0);
            let mut best = -1.0;
            for r in 0..self.b.nrows() {
                for c in 0..self.b.ncols() {
                    if self.b[(r, c)].abs() > best {
                        best = self.b[(r, c)].abs();
                        arg = (r, c);
                    }
                }
            }
            grad[arg] += self.linf * signum0(self.b[arg]);
        }
        Ok(mat_to_vec(&grad))
    }
}
