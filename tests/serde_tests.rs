//! Round-trips for the `serde` feature: a saved run record reloads with its
//! scalar series, image frames, reference images and best-so-far intact.
#![cfg(feature = "serde")]

use nalgebra::{dvector, DMatrix};

use lossbench::optim::Sgd;
use lossbench::prelude::*;

#[test]
fn record_save_load_round_trip() {
    let mut record = RunRecord::new();
    record.observe_loss(0, 4.0, &dvector![1.0, 2.0]);
    record.observe_loss(1, 1.5, &dvector![0.5, 0.25]);
    record.observe_loss(2, 3.0, &dvector![0.0, 0.0]);
    record.log_scalar("accuracy", 2, 0.75);
    record.add_reference_image("target", Image::from_matrix(&DMatrix::identity(3, 3)));
    record.log_image_with_difference("preds", 0, Image::from_matrix(&DMatrix::zeros(3, 3)));
    record.log_image_with_difference("preds", 2, Image::from_matrix(&DMatrix::identity(3, 3)));

    let path = std::env::temp_dir().join("lossbench_serde_round_trip.json");
    record.save(&path).unwrap();
    let loaded = RunRecord::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.num_evals(), 3);
    assert_eq!(loaded.loss_history(), record.loss_history());
    assert_eq!(loaded.scalar("accuracy"), record.scalar("accuracy"));
    assert_eq!(
        loaded.reference_images().get("target"),
        record.reference_images().get("target")
    );
    assert_eq!(loaded.image_series("preds"), record.image_series("preds"));
    assert_eq!(
        loaded.image_series("preds update"),
        record.image_series("preds update")
    );

    let best = loaded.best().unwrap();
    assert_eq!(best.value, 1.5);
    assert_eq!(best.step, 1);
    assert_eq!(best.params, vec![0.5, 0.25]);
}

#[test]
fn record_from_real_run_survives_save() {
    let mut bench = Sphere::randn(8, 0);
    let mut opt = Sgd::new(0.2);
    run(&mut bench, &mut opt, 25).unwrap();

    let path = std::env::temp_dir().join("lossbench_serde_real_run.json");
    bench.state().record().save(&path).unwrap();
    let loaded = RunRecord::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.num_evals(), 25);
    assert_eq!(
        loaded.best_value().unwrap(),
        bench.state().record().best_value().unwrap()
    );
}
