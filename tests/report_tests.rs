//! HTML report generation against real run records.

use lossbench::optim::Adam;
use lossbench::prelude::*;

#[test]
fn html_report_creates_file() {
    let mut bench = Sphere::randn(8, 0);
    let mut opt = Adam::new(0.1);
    run(&mut bench, &mut opt, 30).unwrap();

    let path = std::env::temp_dir().join("lossbench_report_creates_file.html");
    generate_html_report(bench.state().record(), bench.name(), &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("<!DOCTYPE html>"));
    assert!(content.contains("plotly"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn html_report_contains_loss_and_frames() {
    let a = lossbench::data::hilbert(4);
    let mut bench = Inverse::new(a).unwrap();
    let mut opt = Adam::new(0.05);
    run(&mut bench, &mut opt, 20).unwrap();

    let path = std::env::temp_dir().join("lossbench_report_inverse.html");
    generate_html_report(bench.state().record(), bench.name(), &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("id=\"loss\""));
    // Reference images and frame series land as chart divs.
    assert!(content.contains("ref_input"));
    assert!(content.contains("frame_inverse"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn html_report_for_empty_record() {
    let path = std::env::temp_dir().join("lossbench_report_empty.html");
    generate_html_report(&RunRecord::new(), "nothing", &path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("0 evaluations"));
    std::fs::remove_file(&path).ok();
}
