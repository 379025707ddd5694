#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Differentiable benchmark objectives for evaluating and visualizing
//! optimizers. Every benchmark exposes a flat parameter vector, a scalar
//! loss, an analytic gradient (with a finite-difference fallback), and logs
//! scalars and image frames while an external optimizer drives it, so an
//! optimizer's behavior can be watched, not just scored.
//!
//! # Getting Started
//!
//! Minimize a benchmark in four lines:
//!
//! ```
//! use lossbench::optim::Adam;
//! use lossbench::prelude::*;
//!
//! let mut bench = Quadratic::new(32, 0)?;
//! let mut opt = Adam::new(0.1);
//! let summary = run(&mut bench, &mut opt, 300)?;
//! assert!(summary.best_value < summary.final_loss + 1e-12);
//! # Ok::<(), lossbench::Error>(())
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Benchmark`] | A differentiable objective: flat parameters, loss, gradient, logging side effects. |
//! | [`BenchState`] | Shared per-run state every benchmark embeds: seeded RNG, record, step counter, bounds. |
//! | [`RunRecord`] | Logging artifacts: scalar series, image frames, reference images, best-so-far state. |
//! | [`Optimizer`](optim::Optimizer) | Anything that can update a parameter vector from a gradient. |
//! | [`run`] | The driver loop: `pre_step`, evaluate, record, step, project into bounds. |
//!
//! # Benchmark Guide
//!
//! | Benchmark | Kind | Gradient |
//! |-----------|------|----------|
//! | [`Sphere`](synthetic::Sphere) | Convex, separable | analytic |
//! | [`Quadratic`](synthetic::Quadratic) | Convex, random Hessian | analytic |
//! | [`Rosenbrock`](synthetic::Rosenbrock) | Banana valley, chained/separable | analytic |
//! | [`ChebyshevRosenbrock`](synthetic::ChebyshevRosenbrock) | Nonsmooth valley | analytic (subgradient) |
//! | [`IllConditioned`](synthetic::IllConditioned) | Tunable condition number | analytic |
//! | [`LogSumExp`](synthetic::LogSumExp) | Smooth max | analytic |
//! | [`Inverse`](linalg::Inverse) | Matrix inversion | analytic |
//! | [`MoorePenrose`](linalg::MoorePenrose) | Pseudoinverse (Penrose residuals) | analytic |
//! | [`StochasticMatrixRecovery`](linalg::StochasticMatrixRecovery) | Stochastic, matrix probes | analytic |
//! | [`Colorization`](colorization::Colorization) | Bounded, nonsmooth spreading | analytic (subgradient) |
//! | [`Seg1dClassification`](seg1d::Seg1dClassification) | Non-convex, minibatched | backprop |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on records and images, [`RunRecord::save`]/[`RunRecord::load`] | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at run-loop milestones | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

mod benchmark;
pub mod colorization;
pub mod data;
mod error;
mod image;
pub mod linalg;
pub mod nn;
pub mod optim;
mod record;
pub mod report;
pub mod rng;
pub mod seg1d;
pub mod synthetic;

pub use benchmark::{
    numerical_gradient, run, BenchState, Benchmark, PointwiseLoss, RunSummary, FD_EPS,
};
pub use error::{Error, Result};
pub use image::Image;
pub use record::{BestSoFar, RunRecord, LOSS_KEY};
pub use report::generate_html_report;

/// Convenient wildcard import for the most common types.
///
/// ```
/// use lossbench::prelude::*;
/// ```
pub mod prelude {
    pub use crate::benchmark::{
        numerical_gradient, run, BenchState, Benchmark, PointwiseLoss, RunSummary,
    };
    pub use crate::colorization::Colorization;
    pub use crate::error::{Error, Result};
    pub use crate::image::Image;
    pub use crate::linalg::{Inverse, MoorePenrose, PinvInit, StochasticMatrixRecovery};
    pub use crate::optim::{Adam, Optimizer, Sgd};
    pub use crate::record::{BestSoFar, RunRecord};
    pub use crate::report::generate_html_report;
    pub use crate::rng::Rng;
    pub use crate::seg1d::{Seg1dClassification, SyntheticSegmentation1D};
    pub use crate::synthetic::{
        ChebyshevRosenbrock, ChebyshevVariant, IllConditioned, LogSumExp, Quadratic, Rosenbrock,
        RosenbrockVariant, Sphere,
    };
}
