//! The [`Benchmark`] trait and the shared per-run state every objective
//! embeds.
//!
//! A benchmark owns trainable parameters (exposed as one flat vector), fixed
//! buffers (targets, design matrices, masks), and a [`BenchState`] carrying
//! the seeded RNG, the [`RunRecord`] and the step counter. An external
//! optimizer drives it through [`run`]:
//!
//! ```
//! use lossbench::optim::Sgd;
//! use lossbench::prelude::*;
//!
//! let mut bench = Sphere::randn(8, 0);
//! let mut opt = Sgd::new(0.2);
//! let summary = run(&mut bench, &mut opt, 200).unwrap();
//! assert!(summary.best_value < 1e-3);
//! ```

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::Image;
use crate::optim::Optimizer;
use crate::record::RunRecord;
use crate::rng::Rng;

/// Step size for the default central-difference gradient.
pub const FD_EPS: f64 = 1e-5;

/// Pointwise reduction applied between a prediction and a target.
///
/// The closed set of criteria the catalogue uses; each knows its own
/// derivative so the objectives stay analytically differentiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PointwiseLoss {
    /// Mean squared error.
    #[default]
    Mse,
    /// Mean absolute error.
    L1,
}

impl PointwiseLoss {
    /// Mean-reduced loss between two equally shaped matrices.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eval(&self, p: &DMatrix<f64>, q: &DMatrix<f64>) -> f64 {
        let n = p.len() as f64;
        match self {
            PointwiseLoss::Mse => p.iter().zip(q.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / n,
            PointwiseLoss::L1 => p.iter().zip(q.iter()).map(|(a, b)| (a - b).abs()).sum::<f64>() / n,
        }
    }

    /// Derivative of [`eval`](Self::eval) with respect to `p`.
    ///
    /// The derivative with respect to `q` is the negation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn grad(&self, p: &DMatrix<f64>, q: &DMatrix<f64>) -> DMatrix<f64> {
        let n = p.len() as f64;
        match self {
            PointwiseLoss::Mse => (p - q).map(|d| 2.0 * d / n),
            PointwiseLoss::L1 => (p - q).map(|d| signum0(d) / n),
        }
    }

    /// Mean-reduced loss between two equally sized vectors.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn eval_vec(&self, p: &DVector<f64>, q: &DVector<f64>) -> f64 {
        let n = p.len() as f64;
        match self {
            PointwiseLoss::Mse => p.iter().zip(q.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / n,
            PointwiseLoss::L1 => p.iter().zip(q.iter()).map(|(a, b)| (a - b).abs()).sum::<f64>() / n,
        }
    }

    /// Derivative of [`eval_vec`](Self::eval_vec) with respect to `p`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn grad_vec(&self, p: &DVector<f64>, q: &DVector<f64>) -> DVector<f64> {
        let n = p.len() as f64;
        match self {
            PointwiseLoss::Mse => (p - q).map(|d| 2.0 * d / n),
            PointwiseLoss::L1 => (p - q).map(|d| signum0(d) / n),
        }
    }
}

/// Flattens a matrix row-major into a parameter vector.
pub(crate) fn mat_to_vec(m: &DMatrix<f64>) -> DVector<f64> {
    let (rows, cols) = m.shape();
    DVector::from_fn(rows * cols, |i, _| m[(i / cols, i % cols)])
}

/// Rebuilds a row-major flattened matrix.
pub(crate) fn vec_to_mat(v: &DVector<f64>, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |r, c| v[r * cols + c])
}

/// Sign with `signum(0) = 0`, the subgradient convention used throughout.
#[inline]
pub(crate) fn signum0(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Shared state embedded by every benchmark: seeded RNG, run record, step
/// counter, optional box bounds and image-logging switches.
#[derive(Debug, Clone)]
pub struct BenchState {
    rng: Rng,
    seed: u64,
    record: RunRecord,
    step: u64,
    bounds: Option<(f64, f64)>,
    make_images: bool,
    /// Cleared while finite-difference probes run so they leave no trace.
    recording: bool,
}

impl BenchState {
    /// Creates state seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::with_seed(seed),
            seed,
            record: RunRecord::new(),
            step: 0,
            bounds: None,
            make_images: true,
            recording: true,
        }
    }

    /// Declares box bounds the run loop projects parameters into.
    #[must_use]
    pub fn with_bounds(mut self, low: f64, high: f64) -> Self {
        self.bounds = Some((low, high));
        self
    }

    /// Disables image-frame logging (scalar logging is unaffected).
    #[must_use]
    pub fn without_images(mut self) -> Self {
        self.make_images = false;
        self
    }

    /// In-place variant of [`without_images`](Self::without_images), for
    /// already-constructed benchmarks.
    pub fn disable_images(&mut self) {
        self.make_images = false;
    }

    /// The seed this benchmark was constructed with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The benchmark's random number generator.
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Current optimizer step.
    #[must_use]
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Declared box bounds, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    /// The run record collected so far.
    #[must_use]
    pub fn record(&self) -> &RunRecord {
        &self.record
    }

    /// Mutable access to the run record.
    pub fn record_mut(&mut self) -> &mut RunRecord {
        &mut self.record
    }

    /// Whether image frames should be produced right now.
    ///
    /// False during finite-difference probes and when images are disabled.
    #[must_use]
    pub fn should_log_images(&self) -> bool {
        self.recording && self.make_images
    }

    /// Logs an image frame at the current step, subject to
    /// [`should_log_images`](Self::should_log_images).
    pub fn log_image(&mut self, name: &str, image: Image) {
        if self.should_log_images() {
            let step = self.step;
            self.record.log_image(name, step, image);
        }
    }

    /// Logs an image frame plus its change since the previous frame.
    pub fn log_image_with_difference(&mut self, name: &str, image: Image) {
        if self.should_log_images() {
            let step = self.step;
            self.record.log_image_with_difference(name, step, image);
        }
    }

    /// Logs a scalar at the current step unless a probe is running.
    pub fn log_scalar(&mut self, name: &str, value: f64) {
        if self.recording {
            let step = self.step;
            self.record.log_scalar(name, step, value);
        }
    }

    /// Stores a one-off reference image.
    pub fn add_reference_image(&mut self, name: &str, image: Image) {
        if self.make_images {
            self.record.add_reference_image(name, image);
        }
    }

    pub(crate) fn observe(&mut self, loss: f64, params: &DVector<f64>) {
        let step = self.step;
        self.record.observe_loss(step, loss, params);
    }

    pub(crate) fn advance(&mut self) {
        self.step += 1;
    }

    pub(crate) fn set_recording(&mut self, on: bool) {
        self.recording = on;
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.recording
    }
}

/// A differentiable benchmark objective.
///
/// Implementors own their parameters and buffers; the trait exposes the flat
/// parameter view the optimizer manipulates, the loss evaluation (which may
/// log image frames as a side effect), and the gradient. The provided
/// [`gradient`](Benchmark::gradient) falls back to central finite
/// differences; closed-form objectives override it.
pub trait Benchmark {
    /// Human-readable benchmark name, used in reports and traces.
    fn name(&self) -> &str;

    /// Shared state (RNG, record, step counter).
    fn state(&self) -> &BenchState;

    /// Mutable shared state.
    fn state_mut(&mut self) -> &mut BenchState;

    /// Number of trainable parameters.
    fn param_len(&self) -> usize;

    /// Flat copy of the trainable parameters.
    fn params(&self) -> DVector<f64>;

    /// Replaces the trainable parameters from a flat vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParamLenMismatch`](crate::Error::ParamLenMismatch)
    /// when `params` has the wrong length.
    fn set_params(&mut self, params: &DVector<f64>) -> Result<()>;

    /// Computes the loss at the current parameters.
    ///
    /// May log image frames and auxiliary scalars through the state.
    ///
    /// # Errors
    ///
    /// Propagates numerical/config errors from the objective.
    fn evaluate(&mut self) -> Result<f64>;

    /// Re-samples stochastic data before an optimizer step.
    ///
    /// Deterministic objectives keep the default no-op. The run loop calls
    /// this once per step, *before* `evaluate` and `gradient`, so both see
    /// the same draw.
    fn pre_step(&mut self) {}

    /// Gradient of the loss with respect to the flat parameters.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying evaluations.
    fn gradient(&mut self) -> Result<DVector<f64>> {
        numerical_gradient(self, FD_EPS)
    }
}

/// Central-difference gradient at the current parameters.
///
/// Used as the default [`Benchmark::gradient`] and by tests to verify
/// analytic gradients. Probe evaluations are excluded from the run record.
///
/// # Errors
///
/// Propagates errors from the probe evaluations; the original parameters and
/// recording state are restored either way.
pub fn numerical_gradient<B: Benchmark + ?Sized>(bench: &mut B, eps: f64) -> Result<DVector<f64>> {
    let saved = bench.params();
    let was_recording = bench.state().is_recording();
    bench.state_mut().set_recording(false);
    let out = fd_probe(bench, &saved, eps);
    let restore = bench.set_params(&saved);
    bench.state_mut().set_recording(was_recording);
    restore?;
    out
}

fn fd_probe<B: Benchmark + ?Sized>(
    bench: &mut B,
    at: &DVector<f64>,
    eps: f64,
) -> Result<DVector<f64>> {
    let mut grad = DVector::zeros(at.len());
    let mut probe = at.clone();
    for i in 0..at.len() {
        probe[i] = at[i] + eps;
        bench.set_params(&probe)?;
        let plus = bench.evaluate()?;
        probe[i] = at[i] - eps;
        bench.set_params(&probe)?;
        let minus = bench.evaluate()?;
        probe[i] = at[i];
        grad[i] = (plus - minus) / (2.0 * eps);
    }
    Ok(grad)
}

/// Outcome of one [`run`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunSummary {
    /// Number of optimizer steps executed.
    pub steps: u64,
    /// Loss at the last evaluation.
    pub final_loss: f64,
    /// Lowest loss seen across the run.
    pub best_value: f64,
    /// Step the lowest loss occurred at.
    pub best_step: u64,
}

/// Drives a benchmark with an optimizer for `steps` steps.
///
/// Each step: `pre_step`, evaluate (recording the loss and the best-so-far
/// state), take the gradient, let the optimizer update the flat parameters,
/// and project them back into the benchmark's bounds when it declares any.
///
/// # Errors
///
/// Propagates the first evaluation or gradient error. Returns
/// [`Error::NoEvaluations`](crate::Error::NoEvaluations) when `steps` is
/// zero or no step produced a finite loss, since the summary needs a best
/// value to report.
pub fn run<B, O>(bench: &mut B, optimizer: &mut O, steps: u64) -> Result<RunSummary>
where
    B: Benchmark + ?Sized,
    O: Optimizer + ?Sized,
{
    let mut final_loss = f64::NAN;
    for _ in 0..steps {
        bench.pre_step();
        let loss = bench.evaluate()?;
        let params = bench.params();
        bench.state_mut().observe(loss, &params);
        trace_debug!(
            step = bench.state().step(),
            loss,
            benchmark = bench.name(),
            "evaluated"
        );

        let grad = bench.gradient()?;
        let mut params = bench.params();
        optimizer.step(&mut params, &grad);
        if let Some((low, high)) = bench.state().bounds() {
            params.apply(|v| *v = v.clamp(low, high));
        }
        bench.set_params(&params)?;
        bench.state_mut().advance();
        final_loss = loss;
    }

    let best = bench.state().record().best()?;
    let summary = RunSummary {
        steps,
        final_loss,
        best_value: best.value,
        best_step: best.step,
    };
    trace_info!(
        benchmark = bench.name(),
        steps,
        best_value = summary.best_value,
        "run finished"
    );
    Ok(summary)
}
