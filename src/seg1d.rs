//! Synthetic 1-D sequence segmentation: a procedural dataset plus a small
//! network trained on it.
//!
//! Each sample is a sequence stitched from 3 to 6 segments, every segment
//! drawn from one of five labeled pattern classes. Classifying every position
//! of the sequence gives a real non-convex training loss with a meaningful
//! accuracy number, while staying fully procedural (no assets, reproducible
//! per seed).

use nalgebra::{DMatrix, DVector};

use crate::benchmark::{BenchState, Benchmark};
use crate::error::{Error, Result};
use crate::nn::{accuracy, softmax_cross_entropy, Mlp};
use crate::rng::Rng;

/// Number of segment pattern classes.
pub const NUM_CLASSES: usize = 5;

/// Minimum length of one segment.
const BASE_SEGMENT_LEN: usize = 3;

/// Largest number of segments per sample (inclusive).
const MAX_SEGMENTS: usize = 6;

/// Procedurally generated 1-D segmentation dataset.
///
/// A sequence is partitioned into 3..=6 segments (each at least 3 positions,
/// the remainder split multinomially), and each segment is one of:
///
/// 0. high-frequency sine (1.5-2.5 cycles, random phase)
/// 1. low-frequency sine (0.3-0.7 cycles, random phase)
/// 2. square wave (random phase, duty cycle 0.3-0.7)
/// 3. sawtooth ramp (random direction)
/// 4. noise with one large spike
///
/// Global `N(0, 0.1)` noise is added and each sample is normalized to zero
/// mean and unit standard deviation. Labels are per position.
pub struct SyntheticSegmentation1D {
    data: Vec<DVector<f64>>,
    labels: Vec<Vec<usize>>,
    seq_length: usize,
}

impl SyntheticSegmentation1D {
    /// Generates `num_samples` sequences of `seq_length` positions.
    ///
    /// # Errors
    ///
    /// Returns an error when `num_samples == 0` or the sequence is too short
    /// to hold the maximum number of minimum-length segments.
    pub fn new(num_samples: usize, seq_length: usize, seed: u64) -> Result<Self> {
        if num_samples == 0 {
            return Err(Error::InvalidDimension {
                dim: 0,
                reason: "the dataset needs at least one sample",
            });
        }
        if seq_length < BASE_SEGMENT_LEN * MAX_SEGMENTS {
            return Err(Error::InvalidDimension {
                dim: seq_length,
                reason: "sequence too short for the segment layout",
            });
        }
        let mut rng = Rng::with_seed(seed);
        let mut data = Vec::with_capacity(num_samples);
        let mut labels = Vec::with_capacity(num_samples);
        for _ in 0..num_samples {
            let (x, y) = create_sample(seq_length, &mut rng);
            data.push(x);
            labels.push(y);
        }
        Ok(Self {
            data,
            labels,
            seq_length,
        })
    }

    /// The 4000-sample, 32-position dataset used by the stock benchmark.
    ///
    /// # Errors
    ///
    /// Never fails for these dimensions; kept fallible for uniformity.
    pub fn standard(seed: u64) -> Result<Self> {
        Self::new(4_000, 32, seed)
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the dataset is empty (it never is after construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Positions per sample.
    #[must_use]
    pub fn seq_length(&self) -> usize {
        self.seq_length
    }

    /// One sample: the normalized signal and its per-position labels.
    #[must_use]
    pub fn sample(&self, idx: usize) -> (&DVector<f64>, &[usize]) {
        (&self.data[idx], &self.labels[idx])
    }

    /// Column-per-sample batch of the given indices.
    #[must_use]
    pub fn batch(&self, idxs: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(self.seq_length, idxs.len(), |r, c| self.data[idxs[c]][r])
    }
}

fn create_sample(seq_length: usize, rng: &mut Rng) -> (DVector<f64>, Vec<usize>) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_segments = rng.i64_range(3, MAX_SEGMENTS as i64 + 1) as usize;
    let remainder = seq_length - BASE_SEGMENT_LEN * num_segments;
    let extra = rng.multinomial_equal(remainder, num_segments);

    let mut signal = DVector::zeros(seq_length);
    let mut labels = vec![0usize; seq_length];
    let mut pos = 0;
    for add in extra {
        let length = BASE_SEGMENT_LEN + add;
        let class_id = rng.usize_below(NUM_CLASSES);
        let segment = generate_segment(length, class_id, rng);
        for (offset, v) in segment.iter().enumerate() {
            signal[pos + offset] = *v;
            labels[pos + offset] = class_id;
        }
        pos += length;
    }

    for v in signal.iter_mut() {
        *v += rng.normal_with(0.0, 0.1);
    }
    let mean = signal.mean();
    #[allow(clippy::cast_precision_loss)]
    let std = (signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / seq_length as f64).sqrt();
    let std = std.max(f64::MIN_POSITIVE);
    signal.apply(|v| *v = (*v - mean) / std);

    (signal, labels)
}

/// Evenly spaced values from `start` to `end` inclusive.
#[allow(clippy::cast_precision_loss)]
fn linspace(start: f64, end: f64, len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![start];
    }
    (0..len)
        .map(|i| start + (end - start) * i as f64 / (len - 1) as f64)
        .collect()
}

fn generate_segment(length: usize, class_id: usize, rng: &mut Rng) -> Vec<f64> {
    use core::f64::consts::TAU;
    match class_id {
        0 => {
            let cycles = rng.uniform(1.5, 2.5);
            let phase = rng.uniform(0.0, TAU);
            linspace(0.0, 1.0, length)
                .into_iter()
                .map(|t| (TAU * cycles * t + phase).sin())
                .collect()
        }
        1 => {
            let cycles = rng.uniform(0.3, 0.7);
            let phase = rng.uniform(0.0, TAU);
            linspace(0.0, 1.0, length)
                .into_iter()
                .map(|t| (TAU * cycles * t + phase).sin())
                .collect()
        }
        2 => {
            let phase = rng.uniform(0.0, 1.0);
            let duty = rng.uniform(0.3, 0.7);
            linspace(0.0, 1.0, length)
                .into_iter()
                .map(|t| {
                    if (t + phase).rem_euclid(1.0) < duty {
                        1.0
                    } else {
                        -1.0
                    }
                })
                .collect()
        }
        3 => {
            let direction = rng.sign();
            linspace(-1.0, 1.0, length)
                .into_iter()
                .map(|t| direction * t)
                .collect()
        }
        _ => {
            let mut seg: Vec<f64> = (0..length).map(|_| rng.normal_with(0.0, 0.2)).collect();
            let spike = rng.usize_below(length);
            seg[spike] = rng.uniform(1.5, 2.5);
            seg
        }
    }
}

/// Per-position sequence classification with a small MLP.
///
/// The network maps a whole sequence to `seq_length * NUM_CLASSES` logits;
/// the loss is the mean softmax cross-entropy over every position of a
/// minibatch re-drawn each step. Batch accuracy is logged as the
/// `"accuracy"` scalar.
pub struct Seg1dClassification {
    state: BenchState,
    dataset: SyntheticSegmentation1D,
    net: Mlp,
    batch_size: usize,
    batch_idxs: Vec<usize>,
}

impl Seg1dClassification {
    /// Wraps a dataset with a fresh network.
    ///
    /// `hidden` are the hidden layer widths; the input and output widths are
    /// derived from the dataset.
    ///
    /// # Errors
    ///
    /// Returns an error when `batch_size == 0` or the network configuration
    /// is degenerate.
    pub fn new(
        dataset: SyntheticSegmentation1D,
        hidden: &[usize],
        batch_size: usize,
        seed: u64,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig {
                name: "batch_size",
                reason: "at least one sample per step is required".to_string(),
            });
        }
        let mut state = BenchState::new(seed).without_images();
        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(dataset.seq_length());
        sizes.extend_from_slice(hidden);
        sizes.push(dataset.seq_length() * NUM_CLASSES);
        let net = Mlp::new(&sizes, state.rng())?;
        let batch_idxs = draw_batch(&mut state, dataset.len(), batch_size);
        Ok(Self {
            state,
            dataset,
            net,
            batch_size,
            batch_idxs,
        })
    }

    /// The standard dataset with one hidden layer of 64 units.
    ///
    /// # Errors
    ///
    /// Propagates construction errors.
    pub fn standard(seed: u64) -> Result<Self> {
        Self::new(SyntheticSegmentation1D::standard(seed)?, &[64], 32, seed)
    }

    /// The wrapped dataset.
    #[must_use]
    pub fn dataset(&self) -> &SyntheticSegmentation1D {
        &self.dataset
    }

    /// Logits and flattened labels for the current minibatch, one column per
    /// (sample, position) pair.
    fn position_logits(&self) -> Result<(crate::nn::ForwardCache, DMatrix<f64>, Vec<usize>)> {
        let x = self.dataset.batch(&self.batch_idxs);
        let cache = self.net.forward(&x);
        let logits = cache.logits();
        let seq = self.dataset.seq_length();
        let batch = self.batch_idxs.len();
        if logits.shape() != (seq * NUM_CLASSES, batch) {
            return Err(Error::Internal("network output shape drifted"));
        }
        let per_pos =
            DMatrix::from_fn(NUM_CLASSES, batch * seq, |c, j| logits[((j % seq) * NUM_CLASSES + c, j / seq)]);
        let mut labels = Vec::with_capacity(batch * seq);
        for &idx in &self.batch_idxs {
            labels.extend_from_slice(self.dataset.sample(idx).1);
        }
        Ok((cache, per_pos, labels))
    }
}

fn draw_batch(state: &mut BenchState, n: usize, batch_size: usize) -> Vec<usize> {
    (0..batch_size)
        .map(|_| state.rng().usize_below(n))
        .collect()
}

impl Benchmark for Seg1dClassification {
    fn name(&self) -> &str {
        "seg1d_classification"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.net.param_len()
    }

    fn params(&self) -> DVector<f64> {
        self.net.params()
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        self.net.set_params(params)
    }

    fn pre_step(&mut self) {
        self.batch_idxs = draw_batch(&mut self.state, self.dataset.len(), self.batch_size);
    }

    fn evaluate(&mut self) -> Result<f64> {
        let (_, per_pos, labels) = self.position_logits()?;
        let (loss, _) = softmax_cross_entropy(&per_pos, &labels)?;
        let acc = accuracy(&per_pos, &labels);
        self.state.log_scalar("accuracy", acc);
        Ok(loss)
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let (cache, per_pos, labels) = self.position_logits()?;
        let (_, grad_pos) = softmax_cross_entropy(&per_pos, &labels)?;
        let seq = self.dataset.seq_length();
        let grad_logits = DMatrix::from_fn(
            seq * NUM_CLASSES,
            self.batch_idxs.len(),
            |r, j| grad_pos[(r % NUM_CLASSES, j * seq + r / NUM_CLASSES)],
        );
        Ok(self.net.backward(&cache, &grad_logits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_is_seeded() {
        let a = SyntheticSegmentation1D::new(16, 32, 3).unwrap();
        let b = SyntheticSegmentation1D::new(16, 32, 3).unwrap();
        for i in 0..a.len() {
            assert_eq!(a.sample(i).0, b.sample(i).0);
            assert_eq!(a.sample(i).1, b.sample(i).1);
        }
        let c = SyntheticSegmentation1D::new(16, 32, 4).unwrap();
        assert_ne!(a.sample(0).0, c.sample(0).0);
    }

    #[test]
    fn test_samples_are_normalized() {
        let ds = SyntheticSegmentation1D::new(8, 32, 0).unwrap();
        for i in 0..ds.len() {
            let x = ds.sample(i).0;
            assert!(x.mean().abs() < 1e-10);
            let var = x.iter().map(|v| v * v).sum::<f64>() / 32.0;
            assert!((var - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_labels_in_range_and_segmented() {
        let ds = SyntheticSegmentation1D::new(32, 32, 1).unwrap();
        for i in 0..ds.len() {
            let labels = ds.sample(i).1;
            assert!(labels.iter().all(|&l| l < NUM_CLASSES));
            // Segment layout: runs of equal labels, each at least 3 long
            // unless two adjacent segments drew the same class.
            let runs = labels.windows(2).filter(|w| w[0] != w[1]).count() + 1;
            assert!((1..=MAX_SEGMENTS).contains(&runs));
        }
    }

    #[test]
    fn test_rejects_short_sequences() {
        assert!(SyntheticSegmentation1D::new(4, 17, 0).is_err());
        assert!(SyntheticSegmentation1D::new(0, 32, 0).is_err());
    }

    #[test]
    fn test_classification_gradient_matches_fd() {
        use crate::benchmark::numerical_gradient;

        let ds = SyntheticSegmentation1D::new(8, 18, 0).unwrap();
        let mut bench = Seg1dClassification::new(ds, &[6], 4, 0).unwrap();
        let analytic = bench.gradient().unwrap();
        let numeric = numerical_gradient(&mut bench, 1e-5).unwrap();
        for i in (0..analytic.len()).step_by(37) {
            assert!(
                (analytic[i] - numeric[i]).abs() < 1e-5,
                "param {i}: {} vs {}",
                analytic[i],
                numeric[i]
            );
        }
    }

    #[test]
    fn test_pre_step_redraws_batch() {
        let ds = SyntheticSegmentation1D::new(64, 18, 0).unwrap();
        let mut bench = Seg1dClassification::new(ds, &[6], 8, 0).unwrap();
        let before = bench.batch_idxs.clone();
        bench.pre_step();
        assert_ne!(before, bench.batch_idxs);
    }

    #[test]
    fn test_accuracy_scalar_logged() {
        let ds = SyntheticSegmentation1D::new(8, 18, 0).unwrap();
        let mut bench = Seg1dClassification::new(ds, &[6], 4, 0).unwrap();
        bench.evaluate().unwrap();
        assert!(bench.state().record().scalar("accuracy").is_some());
    }
}
