//! Closed-form synthetic test functions.
//!
//! The classic low-level battery: a criterion-based sphere, a seeded convex
//! quadratic, two Rosenbrock families, an adversarially conditioned
//! quadratic, and a log-sum-exp objective. All carry analytic gradients.

use nalgebra::{DMatrix, DVector};

use crate::benchmark::{BenchState, Benchmark, PointwiseLoss, signum0};
use crate::error::{Error, Result};
use crate::image::Image;

/// Directly minimizes a pointwise criterion between the parameters and a
/// fixed target.
///
/// With an MSE criterion and zero init this is the textbook sphere function
/// shifted to the target. A matrix target turns the run into an image
/// reconstruction: the target is stored as a reference image and the current
/// estimate is logged as a frame each evaluation.
///
/// # Examples
///
/// ```
/// use lossbench::prelude::*;
///
/// let mut bench = Sphere::randn(16, 0);
/// let loss = bench.evaluate().unwrap();
/// assert!(loss > 0.0);
/// ```
pub struct Sphere {
    state: BenchState,
    x: DVector<f64>,
    target: DVector<f64>,
    criterion: PointwiseLoss,
    /// Set when the target is an image; `x` is logged reshaped to this.
    image_shape: Option<(usize, usize)>,
}

impl Sphere {
    /// Sphere with a seeded standard-normal target of length `dim` and zero
    /// init.
    #[must_use]
    pub fn randn(dim: usize, seed: u64) -> Self {
        let mut state = BenchState::new(seed);
        let target = state.rng().normal_vector(dim);
        Self {
            x: DVector::zeros(dim),
            state,
            target,
            criterion: PointwiseLoss::Mse,
            image_shape: None,
        }
    }

    /// Sphere against an explicit target vector, zero init.
    #[must_use]
    pub fn new(target: DVector<f64>) -> Self {
        Self {
            x: DVector::zeros(target.len()),
            state: BenchState::new(0),
            target,
            criterion: PointwiseLoss::Mse,
            image_shape: None,
        }
    }

    /// Sphere against an image target.
    ///
    /// The target is kept as the `"target"` reference image and the current
    /// estimate is logged under `"preds"` (with update frames) during
    /// evaluation.
    #[must_use]
    pub fn image(target: &DMatrix<f64>) -> Self {
        let (rows, cols) = target.shape();
        let mut flat = DVector::zeros(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                flat[r * cols + c] = target[(r, c)];
            }
        }
        let mut state = BenchState::new(0);
        state.add_reference_image("target", Image::from_matrix(target));
        Self {
            x: DVector::zeros(rows * cols),
            state,
            target: flat,
            criterion: PointwiseLoss::Mse,
            image_shape: Some((rows, cols)),
        }
    }

    /// Replaces the zero init.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParamLenMismatch`] when `init` does not match the
    /// target length.
    pub fn with_init(mut self, init: DVector<f64>) -> Result<Self> {
        if init.len() != self.target.len() {
            return Err(Error::ParamLenMismatch {
                expected: self.target.len(),
                got: init.len(),
            });
        }
        self.x = init;
        Ok(self)
    }

    /// Swaps the criterion (default MSE).
    #[must_use]
    pub fn with_criterion(mut self, criterion: PointwiseLoss) -> Self {
        self.criterion = criterion;
        self
    }

    fn current_image(&self) -> Option<Image> {
        let (rows, cols) = self.image_shape?;
        let m = DMatrix::from_fn(rows, cols, |r, c| self.x[r * cols + c]);
        Some(Image::from_matrix(&m))
    }
}

impl Benchmark for Sphere {
    fn name(&self) -> &str {
        "sphere"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.x.len()
    }

    fn params(&self) -> DVector<f64> {
        self.x.clone()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        check_len(self.x.len(), params)?;
        self.x.copy_from(params);
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        if self.state.should_log_images() {
            if let Some(frame) = self.current_image() {
                self.state.log_image_with_difference("preds", frame);
            }
        }
        Ok(self.criterion.eval_vec(&self.x, &self.target))
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        Ok(self.criterion.grad_vec(&self.x, &self.target))
    }
}

/// Convex quadratic `0.5 zᵀHz + zᵀb` with `z = x + target`.
///
/// `H = GGᵀ + eps·I` from seeded Gaussian `G` is positive definite, so the
/// objective has a unique minimum. By default the loss is shifted so the
/// minimum is approximately zero; the shift is obtained by solving
/// `Hz* = -b` and is skipped silently when the solve fails.
pub struct Quadratic {
    state: BenchState,
    h: DMatrix<f64>,
    b: DVector<f64>,
    target: DVector<f64>,
    x: DVector<f64>,
    min_value: Option<f64>,
}

impl Quadratic {
    /// Default configuration: `eps = 1e-4`, shifted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] when `dim == 0`.
    pub fn new(dim: usize, seed: u64) -> Result<Self> {
        Self::with_options(dim, 1e-4, None, seed)
    }

    /// Full configuration. `shift = None` keeps the default (shift for
    /// `dim <= 10_000`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] when `dim == 0`.
    pub fn with_options(dim: usize, eps: f64, shift: Option<bool>, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension {
                dim,
                reason: "quadratic needs at least one dimension",
            });
        }
        let mut state = BenchState::new(seed);
        let g = state.rng().normal_matrix(dim, dim);
        let mut h = &g * g.transpose();
        for i in 0..dim {
            h[(i, i)] += eps;
        }
        let b = state.rng().normal_vector(dim);
        let target = state.rng().normal_vector(dim);
        let x = state.rng().normal_vector(dim);

        let shift = shift.unwrap_or(dim <= 10_000);
        let min_value = if shift {
            h.clone().lu().solve(&(-&b)).map(|sol| {
                let hs = &h * &sol;
                0.5 * sol.dot(&hs) + sol.dot(&b)
            })
        } else {
            None
        };

        Ok(Self {
            state,
            h,
            b,
            target,
            x,
            min_value,
        })
    }

    /// The (shifted) minimum value, when the shift solve succeeded.
    #[must_use]
    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }
}

impl Benchmark for Quadratic {
    fn name(&self) -> &str {
        "quadratic"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.x.len()
    }

    fn params(&self) -> DVector<f64> {
        self.x.clone()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        check_len(self.x.len(), params)?;
        self.x.copy_from(params);
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let z = &self.x + &self.target;
        let hz = &self.h * &z;
        let loss = 0.5 * z.dot(&hz) + z.dot(&self.b);
        Ok(loss - self.min_value.unwrap_or(0.0))
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let z = &self.x + &self.target;
        Ok(&self.h * z + &self.b)
    }
}

/// Which coupling the Rosenbrock valley uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosenbrockVariant {
    /// Overlapping windows `(x_i, x_{i+1})` — the classic chained form.
    Chained,
    /// Disjoint pairs `(x_{2k}, x_{2k+1})` — separable into 2-D problems.
    Separable,
}

/// Mean-reduced Rosenbrock valley, initialized at the standard
/// `[-1.2, 1.0]` repetition.
pub struct Rosenbrock {
    state: BenchState,
    x: DVector<f64>,
    variant: RosenbrockVariant,
}

impl Rosenbrock {
    /// Chained Rosenbrock in `dim` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] when `dim` is odd or below 2
    /// (the init pattern repeats in pairs).
    pub fn new(dim: usize) -> Result<Self> {
        Self::with_variant(dim, RosenbrockVariant::Chained)
    }

    /// Rosenbrock with an explicit variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] when `dim` is odd or below 2.
    pub fn with_variant(dim: usize, variant: RosenbrockVariant) -> Result<Self> {
        if dim < 2 || dim % 2 != 0 {
            return Err(Error::InvalidDimension {
                dim,
                reason: "rosenbrock needs an even dimension of at least 2",
            });
        }
        let x = DVector::from_fn(dim, |i, _| if i % 2 == 0 { -1.2 } else { 1.0 });
        Ok(Self {
            state: BenchState::new(0),
            x,
            variant,
        })
    }
}

impl Benchmark for Rosenbrock {
    fn name(&self) -> &str {
        "rosenbrock"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.x.len()
    }

    fn params(&self) -> DVector<f64> {
        self.x.clone()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        check_len(self.x.len(), params)?;
        self.x.copy_from(params);
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn evaluate(&mut self) -> Result<f64> {
        let x = &self.x;
        let n = x.len();
        let (sum, terms) = match self.variant {
            RosenbrockVariant::Chained => {
                let mut sum = 0.0;
                for i in 0..n - 1 {
                    sum += rosenbrock_term(x[i], x[i + 1]);
                }
                (sum, n - 1)
            }
            RosenbrockVariant::Separable => {
                let mut sum = 0.0;
                for k in 0..n / 2 {
                    sum += rosenbrock_term(x[2 * k], x[2 * k + 1]);
                }
                (sum, n / 2)
            }
        };
        Ok(sum / terms as f64)
    }

    #[allow(clippy::cast_precision_loss)]
    fn gradient(&mut self) -> Result<DVector<f64>> {
        let x = &self.x;
        let n = x.len();
        let mut grad = DVector::zeros(n);
        match self.variant {
            RosenbrockVariant::Chained => {
                let m = (n - 1) as f64;
                for i in 0..n - 1 {
                    let (da, db) = rosenbrock_term_grad(x[i], x[i + 1]);
                    grad[i] += da / m;
                    grad[i + 1] += db / m;
                }
            }
            RosenbrockVariant::Separable => {
                let m = (n / 2) as f64;
                for k in 0..n / 2 {
                    let (da, db) = rosenbrock_term_grad(x[2 * k], x[2 * k + 1]);
                    grad[2 * k] += da / m;
                    grad[2 * k + 1] += db / m;
                }
            }
        }
        Ok(grad)
    }
}

#[inline]
fn rosenbrock_term(a: f64, b: f64) -> f64 {
    100.0 * (b - a * a).powi(2) + (1.0 - a).powi(2)
}

#[inline]
fn rosenbrock_term_grad(a: f64, b: f64) -> (f64, f64) {
    let inner = b - a * a;
    (-400.0 * a * inner - 2.0 * (1.0 - a), 200.0 * inner)
}

/// The smoothing applied to the coupled term of the Chebyshev-Rosenbrock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChebyshevVariant {
    /// `rho(t) = t^2` — smooth.
    Squared,
    /// `rho(t) = |t|` — nonsmooth.
    Abs,
}

/// Nesterov's Chebyshev-Rosenbrock function:
/// `1/4 (x_0 - 1)^2 + sum |x_{i+1} - 2 rho(x_i) + 1|^p`.
///
/// Known to defeat line-search methods at moderate `p`. The max-form takes
/// the maximum of the two terms instead of their sum.
pub struct ChebyshevRosenbrock {
    state: BenchState,
    x: DVector<f64>,
    p: i32,
    variant: ChebyshevVariant,
    max_form: bool,
}

impl ChebyshevRosenbrock {
    /// Smooth variant with exponent `p` (the original default is 8).
    ///
    /// # Errors
    ///
    /// Returns an error for odd/low dimensions or `p < 1`.
    pub fn new(dim: usize, p: i32) -> Result<Self> {
        Self::with_options(dim, p, ChebyshevVariant::Squared, false)
    }

    /// Full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for odd/low dimensions or `p < 1`.
    pub fn with_options(
        dim: usize,
        p: i32,
        variant: ChebyshevVariant,
        max_form: bool,
    ) -> Result<Self> {
        if dim < 2 || dim % 2 != 0 {
            return Err(Error::InvalidDimension {
                dim,
                reason: "chebyshev-rosenbrock needs an even dimension of at least 2",
            });
        }
        if p < 1 {
            return Err(Error::InvalidConfig {
                name: "p",
                reason: format!("exponent must be at least 1, got {p}"),
            });
        }
        let x = DVector::from_fn(dim, |i, _| if i % 2 == 0 { -1.2 } else { 1.0 });
        Ok(Self {
            state: BenchState::new(0),
            x,
            p,
            variant,
            max_form,
        })
    }

    fn rho(&self, t: f64) -> f64 {
        match self.variant {
            ChebyshevVariant::Squared => t * t,
            ChebyshevVariant::Abs => t.abs(),
        }
    }

    fn rho_grad(&self, t: f64) -> f64 {
        match self.variant {
            ChebyshevVariant::Squared => 2.0 * t,
            ChebyshevVariant::Abs => signum0(t),
        }
    }

    fn terms(&self) -> (f64, f64) {
        let x = &self.x;
        let term1 = 0.25 * (x[0] - 1.0).powi(2);
        let mut term2 = 0.0;
        for i in 0..x.len() - 1 {
            let r = x[i + 1] - 2.0 * self.rho(x[i]) + 1.0;
            term2 += r.abs().powi(self.p);
        }
        (term1, term2)
    }
}

impl Benchmark for ChebyshevRosenbrock {
    fn name(&self) -> &str {
        "chebyshev_rosenbrock"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.x.len()
    }

    fn params(&self) -> DVector<f64> {
        self.x.clone()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        check_len(self.x.len(), params)?;
        self.x.copy_from(params);
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let (term1, term2) = self.terms();
        Ok(if self.max_form {
            term1.max(term2)
        } else {
            term1 + term2
        })
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let (term1, term2) = self.terms();
        let (use1, use2) = if self.max_form {
            // Subgradient of the max: follow the active branch.
            if term1 >= term2 {
                (true, false)
            } else {
                (false, true)
            }
        } else {
            (true, true)
        };

        let x = &self.x;
        let mut grad = DVector::zeros(x.len());
        if use1 {
            grad[0] += 0.5 * (x[0] - 1.0);
        }
        if use2 {
            let pf = f64::from(self.p);
            for i in 0..x.len() - 1 {
                let r = x[i + 1] - 2.0 * self.rho(x[i]) + 1.0;
                let dr = pf * r.abs().powi(self.p - 1) * signum0(r);
                grad[i + 1] += dr;
                grad[i] += dr * (-2.0 * self.rho_grad(x[i]));
            }
        }
        Ok(grad)
    }
}

/// Quadratic with the "diabolical" Hessian: 2 on the diagonal, `c`
/// everywhere else.
///
/// The condition number is `(2 + c(d-1)) / (2 - c)`, so `c` close to 2
/// makes first-order methods crawl.
pub struct IllConditioned {
    state: BenchState,
    x: DVector<f64>,
    b: DVector<f64>,
    c: f64,
}

impl IllConditioned {
    /// `c = 1.9999`, the original default.
    ///
    /// # Errors
    ///
    /// Returns an error when `dim == 0`.
    pub fn new(dim: usize, seed: u64) -> Result<Self> {
        Self::with_c(dim, 1.9999, seed)
    }

    /// Explicit off-diagonal coefficient; requires `0 < c < 2` for a
    /// positive definite Hessian.
    ///
    /// # Errors
    ///
    /// Returns an error when `dim == 0` or `c` is outside `(0, 2)`.
    pub fn with_c(dim: usize, c: f64, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension {
                dim,
                reason: "ill-conditioned quadratic needs at least one dimension",
            });
        }
        if !(0.0..2.0).contains(&c) || c == 0.0 {
            return Err(Error::InvalidConfig {
                name: "c",
                reason: format!("off-diagonal coefficient must lie in (0, 2), got {c}"),
            });
        }
        let mut state = BenchState::new(seed);
        let x = state.rng().normal_vector(dim);
        let b = state.rng().normal_vector(dim);
        Ok(Self { state, x, b, c })
    }

    /// Condition number of the Hessian.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn condition_number(&self) -> f64 {
        let d = self.x.len() as f64;
        (2.0 + self.c * (d - 1.0)) / (2.0 - self.c)
    }
}

impl Benchmark for IllConditioned {
    fn name(&self) -> &str {
        "ill_conditioned"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.x.len()
    }

    fn params(&self) -> DVector<f64> {
        self.x.clone()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        check_len(self.x.len(), params)?;
        self.x.copy_from(params);
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let z = &self.x + &self.b;
        let sum_sq: f64 = z.iter().map(|v| v * v).sum();
        let sum: f64 = z.iter().sum();
        Ok((1.0 - 0.5 * self.c) * sum_sq + 0.5 * self.c * sum * sum)
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let z = &self.x + &self.b;
        let sum: f64 = z.iter().sum();
        Ok(z.map(|v| 2.0 * (1.0 - 0.5 * self.c) * v + self.c * sum))
    }
}

/// Smoothed max-residual objective `|s * LSE((Ax - b) / s)|` with optional
/// least-squares and ridge terms.
pub struct LogSumExp {
    state: BenchState,
    a: DMatrix<f64>,
    b: DVector<f64>,
    x: DVector<f64>,
    smoothing: f64,
    lstsq_term: bool,
    l2: f64,
}

impl LogSumExp {
    /// Default configuration: `smoothing = 1`, no extra terms.
    ///
    /// # Errors
    ///
    /// Returns an error for empty shapes.
    pub fn new(n: usize, dim: usize, seed: u64) -> Result<Self> {
        Self::with_options(n, dim, 1.0, false, 0.0, seed)
    }

    /// Full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for empty shapes or non-positive smoothing.
    pub fn with_options(
        n: usize,
        dim: usize,
        smoothing: f64,
        lstsq_term: bool,
        l2: f64,
        seed: u64,
    ) -> Result<Self> {
        if n == 0 || dim == 0 {
            return Err(Error::InvalidDimension {
                dim: n.min(dim),
                reason: "log-sum-exp needs a non-empty system",
            });
        }
        if smoothing <= 0.0 {
            return Err(Error::InvalidConfig {
                name: "smoothing",
                reason: format!("smoothing must be positive, got {smoothing}"),
            });
        }
        let mut state = BenchState::new(seed);
        let x = state.rng().normal_vector(dim);
        let b = DVector::from_fn(n, |_, _| state.rng().normal_with(-1.0, 1.0));
        let a = state.rng().uniform_matrix(n, dim, -1.0, 1.0);
        Ok(Self {
            state,
            a,
            b,
            x,
            smoothing,
            lstsq_term,
            l2,
        })
    }

    /// Residuals `(Ax - b) / s` and their stable log-sum-exp.
    fn residual_lse(&self) -> (DVector<f64>, f64) {
        let ax = &self.a * &self.x;
        let r = (ax - &self.b) / self.smoothing;
        let m = r.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lse = m + r.iter().map(|v| (v - m).exp()).sum::<f64>().ln();
        (r, lse)
    }
}

impl Benchmark for LogSumExp {
    fn name(&self) -> &str {
        "log_sum_exp"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.x.len()
    }

    fn params(&self) -> DVector<f64> {
        self.x.clone()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        check_len(self.x.len(), params)?;
        self.x.copy_from(params);
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let (_, lse) = self.residual_lse();
        let mut loss = (self.smoothing * lse).abs();
        if self.l2 != 0.0 {
            loss += 0.5 * self.l2 * self.x.dot(&self.x);
        }
        if self.lstsq_term {
            let ax = &self.a * &self.x;
            loss += 0.5 * ax.dot(&ax);
        }
        Ok(loss)
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let (r, lse) = self.residual_lse();
        // Softmax of the residuals.
        let w = r.map(|v| (v - lse).exp());
        let value = self.smoothing * lse;
        let mut grad = self.a.transpose() * w * signum0(value);
        if self.l2 != 0.0 {
            grad += &self.x * self.l2;
        }
        if self.lstsq_term {
            let ax = &self.a * &self.x;
            grad += self.a.transpose() * ax;
        }
        Ok(grad)
    }
}

fn check_len(expected: usize, params: &DVector<f64>) -> Result<()> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(Error::ParamLenMismatch {
            expected,
            got: params.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_loss_at_target() {
        let mut bench = Sphere::randn(8, 3);
        let target = bench.target.clone();
        bench.set_params(&target).unwrap();
        assert!(bench.evaluate().unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_quadratic_shift_near_zero_at_solution() {
        let mut bench = Quadratic::new(16, 0).unwrap();
        assert!(bench.min_value().is_some());
        // At the solver's minimizer z* = x + target, the shifted loss ~ 0.
        let sol = bench.h.clone().lu().solve(&(-&bench.b)).unwrap();
        let x = sol - &bench.target;
        bench.set_params(&x).unwrap();
        assert!(bench.evaluate().unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_rosenbrock_minimum() {
        for variant in [RosenbrockVariant::Chained, RosenbrockVariant::Separable] {
            let mut bench = Rosenbrock::with_variant(8, variant).unwrap();
            bench.set_params(&DVector::from_element(8, 1.0)).unwrap();
            assert!(bench.evaluate().unwrap().abs() < 1e-12);
            assert!(bench.gradient().unwrap().norm() < 1e-10);
        }
    }

    #[test]
    fn test_rosenbrock_rejects_odd_dim() {
        assert!(Rosenbrock::new(7).is_err());
        assert!(Rosenbrock::new(0).is_err());
    }

    #[test]
    fn test_chebyshev_max_form_upper_bounds_terms() {
        let mut sum = ChebyshevRosenbrock::with_options(8, 4, ChebyshevVariant::Squared, false)
            .unwrap();
        let mut max = ChebyshevRosenbrock::with_options(8, 4, ChebyshevVariant::Squared, true)
            .unwrap();
        let sum_loss = sum.evaluate().unwrap();
        let max_loss = max.evaluate().unwrap();
        assert!(max_loss <= sum_loss);
        assert!(max_loss > 0.0);
    }

    #[test]
    fn test_ill_conditioned_condition_number() {
        let bench = IllConditioned::with_c(4, 1.9999, 0).unwrap();
        let expected = (2.0 + 1.9999 * 3.0) / (2.0 - 1.9999);
        assert!((bench.condition_number() - expected).abs() < 1e-6);
        assert!(IllConditioned::with_c(4, 2.5, 0).is_err());
    }

    #[test]
    fn test_log_sum_exp_rejects_bad_smoothing() {
        assert!(LogSumExp::with_options(4, 4, 0.0, false, 0.0, 0).is_err());
    }

    #[test]
    fn test_seeded_construction_reproducible() {
        let mut a = Quadratic::new(8, 5).unwrap();
        let mut b = Quadratic::new(8, 5).unwrap();
        assert_eq!(a.evaluate().unwrap().to_bits(), b.evaluate().unwrap().to_bits());
    }
}
