//! Every analytic gradient in the catalogue is checked against central
//! finite differences at a generic point.

use lossbench::linalg::{Inverse, MoorePenrose, PinvInit, StochasticMatrixRecovery};
use lossbench::prelude::*;
use lossbench::synthetic::{ChebyshevVariant, RosenbrockVariant};
use nalgebra::DVector;

/// Compares the analytic gradient with finite differences, elementwise.
fn assert_gradient_matches<B: Benchmark>(bench: &mut B, tol: f64) {
    let analytic = bench.gradient().expect("analytic gradient");
    let numeric = numerical_gradient(bench, 1e-5).expect("numerical gradient");
    assert_eq!(analytic.len(), numeric.len());
    for i in 0..analytic.len() {
        assert!(
            (analytic[i] - numeric[i]).abs() < tol,
            "{}: param {i}: analytic {} vs numeric {}",
            bench.name(),
            analytic[i],
            numeric[i]
        );
    }
}

/// Moves the parameters to a generic point so no term sits exactly on a
/// kink or a symmetry.
fn nudge<B: Benchmark>(bench: &mut B) {
    let n = bench.param_len();
    #[allow(clippy::cast_precision_loss)]
    let p = DVector::from_fn(n, |i, _| 0.3 + 0.7 * ((i as f64 * 0.917).sin()));
    bench.set_params(&p).expect("set params");
}

#[test]
fn test_sphere_gradient() {
    let mut bench = Sphere::randn(12, 0);
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-6);
}

#[test]
fn test_sphere_l1_gradient() {
    let mut bench = Sphere::randn(12, 0).with_criterion(PointwiseLoss::L1);
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-6);
}

#[test]
fn test_quadratic_gradient() {
    let mut bench = Quadratic::new(10, 1).unwrap();
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_rosenbrock_gradient_both_variants() {
    for variant in [RosenbrockVariant::Chained, RosenbrockVariant::Separable] {
        let mut bench = Rosenbrock::with_variant(8, variant).unwrap();
        nudge(&mut bench);
        assert_gradient_matches(&mut bench, 1e-4);
    }
}

#[test]
fn test_chebyshev_rosenbrock_gradient() {
    for variant in [ChebyshevVariant::Squared, ChebyshevVariant::Abs] {
        let mut bench = ChebyshevRosenbrock::with_options(6, 8, variant, false).unwrap();
        nudge(&mut bench);
        assert_gradient_matches(&mut bench, 1e-4);
    }
}

#[test]
fn test_ill_conditioned_gradient() {
    let mut bench = IllConditioned::new(10, 0).unwrap();
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_log_sum_exp_gradient() {
    let mut bench = LogSumExp::new(16, 8, 0).unwrap();
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_inverse_gradient() {
    let a = lossbench::data::randn(5, 3);
    let mut bench = Inverse::new(a).unwrap();
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_inverse_l1_gradient() {
    let a = lossbench::data::randn(4, 3);
    let mut bench = Inverse::new(a).unwrap().with_criterion(PointwiseLoss::L1);
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_moore_penrose_gradient() {
    let a = Rng::with_seed(9).normal_matrix(4, 3);
    let mut bench = MoorePenrose::new(a, PinvInit::Randn, 2).unwrap();
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_stochastic_recovery_gradient() {
    // No pre_step between the two gradients, so the probe is held fixed.
    let mut bench = StochasticMatrixRecovery::randn(5, 0)
        .unwrap()
        .with_batch_size(3)
        .unwrap()
        .with_penalties(0.1, 0.1, 0.0);
    nudge(&mut bench);
    assert_gradient_matches(&mut bench, 1e-5);
}

#[test]
fn test_colorization_gradient() {
    let mut bench = Colorization::small(1, 2).unwrap();
    // Interior point: strictly inside the (0, 1) bounds.
    let n = bench.param_len();
    #[allow(clippy::cast_precision_loss)]
    let p = DVector::from_fn(n, |i, _| 0.2 + 0.6 * ((i as f64 * 0.317).sin().abs()));
    bench.set_params(&p).unwrap();
    assert_gradient_matches(&mut bench, 1e-5);
}
