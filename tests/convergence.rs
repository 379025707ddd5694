//! End-to-end runs: a plain optimizer pointed at each benchmark makes
//! progress and the run record keeps its invariants.

use lossbench::linalg::{Inverse, StochasticMatrixRecovery};
use lossbench::optim::{Adam, Sgd};
use lossbench::prelude::*;

#[test]
fn test_sgd_solves_sphere() {
    let mut bench = Sphere::randn(16, 0);
    let mut opt = Sgd::new(0.3);
    let summary = run(&mut bench, &mut opt, 300).unwrap();
    assert!(
        summary.best_value < 1e-4,
        "best value {} should be near zero",
        summary.best_value
    );
}

#[test]
fn test_adam_solves_quadratic() {
    let mut bench = Quadratic::new(24, 0).unwrap();
    let mut opt = Adam::new(0.1);
    let summary = run(&mut bench, &mut opt, 1000).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    // The random quadratic is ill-conditioned; a tenfold reduction is what
    // Adam reliably delivers here, so leave margin beyond that.
    assert!(
        summary.best_value < first * 0.15,
        "best {} vs initial {first}",
        summary.best_value
    );
}

#[test]
fn test_momentum_descends_rosenbrock_valley() {
    let mut bench = Rosenbrock::new(8).unwrap();
    let mut opt = Sgd::with_momentum(3e-4, 0.9);
    let summary = run(&mut bench, &mut opt, 1500).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    assert!(
        summary.best_value < first * 0.5,
        "best {} vs initial {first}",
        summary.best_value
    );
}

#[test]
fn test_adam_on_ill_conditioned() {
    let mut bench = IllConditioned::new(32, 0).unwrap();
    assert!(bench.condition_number() > 1e3);
    let mut opt = Adam::new(0.05);
    let summary = run(&mut bench, &mut opt, 400).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    assert!(summary.best_value < first * 0.1);
}

#[test]
fn test_adam_on_log_sum_exp() {
    let mut bench = LogSumExp::new(24, 12, 0).unwrap();
    let mut opt = Adam::new(0.05);
    let summary = run(&mut bench, &mut opt, 300).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    assert!(summary.best_value < first);
}

#[test]
fn test_adam_inverts_a_matrix() {
    let a = lossbench::data::randn(6, 0);
    let mut bench = Inverse::new(a).unwrap();
    let mut opt = Adam::new(0.05);
    let summary = run(&mut bench, &mut opt, 600).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    assert!(
        summary.best_value < first * 0.1,
        "best {} vs initial {first}",
        summary.best_value
    );
    // The estimate frames were logged along the way, with update diffs.
    assert!(bench.state().record().image_series("inverse").is_some());
    assert!(bench.state().record().image_series("inverse update").is_some());
}

#[test]
fn test_stochastic_recovery_progresses() {
    let mut bench = StochasticMatrixRecovery::randn(8, 0)
        .unwrap()
        .with_batch_size(4)
        .unwrap();
    let mut opt = Adam::new(0.05);
    let summary = run(&mut bench, &mut opt, 400).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    assert!(summary.best_value < first * 0.5);
}

#[test]
fn test_colorization_respects_bounds() {
    let mut bench = Colorization::small(1, 2).unwrap();
    let mut opt = Sgd::with_momentum(0.5, 0.9);
    run(&mut bench, &mut opt, 50).unwrap();
    let params = bench.params();
    assert!(params.iter().all(|&v| (0.0..=1.0).contains(&v)));
    // The pull pixel stays saturated under the pull term.
    assert!(bench.state().record().image_series("image").is_some());
}

#[test]
fn test_seg1d_training_reduces_loss() {
    let ds = SyntheticSegmentation1D::new(128, 32, 0).unwrap();
    let mut bench = Seg1dClassification::new(ds, &[32], 16, 0).unwrap();
    let mut opt = Adam::new(0.01);
    let summary = run(&mut bench, &mut opt, 150).unwrap();
    let first = bench.state().record().loss_history()[0].1;
    assert!(
        summary.best_value < first,
        "best {} vs initial {first}",
        summary.best_value
    );
    // Accuracy was tracked once per evaluation.
    let acc = bench.state().record().scalar("accuracy").unwrap();
    assert_eq!(acc.len(), 150);
}

#[test]
fn test_record_invariants_after_run() {
    let mut bench = Sphere::randn(8, 3);
    let mut opt = Sgd::new(0.2);
    let summary = run(&mut bench, &mut opt, 60).unwrap();

    let record = bench.state().record();
    assert_eq!(record.num_evals(), 60);
    assert_eq!(record.loss_history().len(), 60);

    let best = record.best().unwrap();
    assert_eq!(best.value, summary.best_value);
    assert_eq!(best.step, summary.best_step);
    assert_eq!(best.params.len(), bench.param_len());
    // Best is the minimum of the whole series.
    let min = record
        .loss_history()
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(best.value, min);
}

#[test]
fn test_same_seed_same_run() {
    let run_once = || {
        let mut bench = Quadratic::new(12, 5).unwrap();
        let mut opt = Adam::new(0.05);
        run(&mut bench, &mut opt, 50).unwrap().best_value
    };
    assert_eq!(run_once().to_bits(), run_once().to_bits());
}
