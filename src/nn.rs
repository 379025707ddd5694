//! Toy fully connected networks with manual forward/backward passes.
//!
//! Just enough machinery to put a real non-convex training loss in the
//! catalogue: dense layers with `ReLU` between them, a softmax cross-entropy
//! head, and flat parameter packing so a network plugs straight into the
//! [`Benchmark`](crate::benchmark::Benchmark) parameter interface.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::rng::Rng;

/// One dense layer, `out x in` weight plus bias.
#[derive(Debug, Clone)]
struct Linear {
    w: DMatrix<f64>,
    b: DVector<f64>,
}

impl Linear {
    /// He-style init: weights `N(0, 2/fan_in)`, zero bias.
    fn init(fan_in: usize, fan_out: usize, rng: &mut Rng) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let std = (2.0 / fan_in as f64).sqrt();
        let w = DMatrix::from_fn(fan_out, fan_in, |_, _| rng.normal() * std);
        Self {
            w,
            b: DVector::zeros(fan_out),
        }
    }

    /// `W x + b` over a column-per-sample batch.
    fn forward(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut z = &self.w * x;
        for mut col in z.column_iter_mut() {
            col += &self.b;
        }
        z
    }
}

/// Activations saved by [`Mlp::forward`] for the backward pass.
pub struct ForwardCache {
    /// Input to each layer (post-`ReLU` for all but the first).
    inputs: Vec<DMatrix<f64>>,
    /// Head output, pre-softmax.
    logits: DMatrix<f64>,
}

impl ForwardCache {
    /// Logits, one column per sample.
    #[must_use]
    pub fn logits(&self) -> &DMatrix<f64> {
        &self.logits
    }
}

/// A multilayer perceptron with `ReLU` activations.
///
/// Batches are column-per-sample matrices (`features x batch`). The network
/// owns its weights; [`params`](Mlp::params) and [`set_params`](Mlp::set_params)
/// expose them as one flat vector, layer by layer, weights row-major then
/// bias.
pub struct Mlp {
    layers: Vec<Linear>,
}

impl Mlp {
    /// Builds a network with the given layer sizes, e.g. `&[32, 64, 160]`.
    ///
    /// # Errors
    ///
    /// Returns an error when fewer than two sizes are given or any size is
    /// zero.
    pub fn new(sizes: &[usize], rng: &mut Rng) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(Error::InvalidConfig {
                name: "sizes",
                reason: "a network needs an input and an output layer".to_string(),
            });
        }
        if let Some(&dim) = sizes.iter().find(|&&s| s == 0) {
            return Err(Error::InvalidDimension {
                dim,
                reason: "layer sizes must be positive",
            });
        }
        let layers = sizes
            .windows(2)
            .map(|pair| Linear::init(pair[0], pair[1], rng))
            .collect();
        Ok(Self { layers })
    }

    /// Input feature count.
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.layers[0].w.ncols()
    }

    /// Output feature count.
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.layers[self.layers.len() - 1].w.nrows()
    }

    /// Total number of trainable parameters.
    #[must_use]
    pub fn param_len(&self) -> usize {
        self.layers.iter().map(|l| l.w.len() + l.b.len()).sum()
    }

    /// Flat copy of all weights and biases.
    #[must_use]
    pub fn params(&self) -> DVector<f64> {
        let mut out = Vec::with_capacity(self.param_len());
        for layer in &self.layers {
            for r in 0..layer.w.nrows() {
                for c in 0..layer.w.ncols() {
                    out.push(layer.w[(r, c)]);
                }
            }
            out.extend(layer.b.iter().copied());
        }
        DVector::from_vec(out)
    }

    /// Replaces all weights and biases from a flat vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParamLenMismatch`] when the length is wrong.
    pub fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != self.param_len() {
            return Err(Error::ParamLenMismatch {
                expected: self.param_len(),
                got: params.len(),
            });
        }
        let mut i = 0;
        for layer in &mut self.layers {
            for r in 0..layer.w.nrows() {
                for c in 0..layer.w.ncols() {
                    layer.w[(r, c)] = params[i];
                    i += 1;
                }
            }
            for r in 0..layer.b.len() {
                layer.b[r] = params[i];
                i += 1;
            }
        }
        Ok(())
    }

    /// Forward pass, keeping the activations needed for backprop.
    #[must_use]
    pub fn forward(&self, x: &DMatrix<f64>) -> ForwardCache {
        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut a = x.clone();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            inputs.push(a.clone());
            let z = layer.forward(&a);
            a = if i == last { z } else { z.map(|v| v.max(0.0)) };
        }
        ForwardCache { inputs, logits: a }
    }

    /// Backward pass from a gradient on the logits.
    ///
    /// Returns the flat parameter gradient, in [`params`](Mlp::params) order.
    #[must_use]
    pub fn backward(&self, cache: &ForwardCache, grad_logits: &DMatrix<f64>) -> DVector<f64> {
        let mut grads: Vec<(DMatrix<f64>, DVector<f64>)> = Vec::with_capacity(self.layers.len());
        let mut delta = grad_logits.clone();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let input = &cache.inputs[i];
            let grad_w = &delta * input.transpose();
            let grad_b = DVector::from_fn(delta.nrows(), |r, _| delta.row(r).sum());
            grads.push((grad_w, grad_b));

            if i > 0 {
                // Route through the previous ReLU; its output is this input.
                delta = (layer.w.transpose() * &delta)
                    .zip_map(input, |d, a| if a > 0.0 { d } else { 0.0 });
            }
        }
        grads.reverse();

        let mut out = Vec::with_capacity(self.param_len());
        for (gw, gb) in &grads {
            for r in 0..gw.nrows() {
                for c in 0..gw.ncols() {
                    out.push(gw[(r, c)]);
                }
            }
            out.extend(gb.iter().copied());
        }
        DVector::from_vec(out)
    }
}

/// Mean softmax cross-entropy over a column-per-sample logit batch.
///
/// Returns the loss and its gradient with respect to the logits
/// (`(softmax - onehot) / batch`). Log-sum-exp stabilized.
///
/// # Errors
///
/// Returns an error when `labels` does not match the batch size or a label
/// is out of class range.
#[allow(clippy::cast_precision_loss)]
pub fn softmax_cross_entropy(
    logits: &DMatrix<f64>,
    labels: &[usize],
) -> Result<(f64, DMatrix<f64>)> {
    let (classes, batch) = logits.shape();
    if labels.len() != batch {
        return Err(Error::shape_mismatch(
            (classes, batch),
            (labels.len(), 1),
            "softmax cross-entropy labels",
        ));
    }
    let n = batch as f64;
    let mut loss = 0.0;
    let mut grad = DMatrix::zeros(classes, batch);

    for (j, &label) in labels.iter().enumerate() {
        if label >= classes {
            return Err(Error::IndexOutOfBounds {
                row: label,
                col: j,
                rows: classes,
                cols: batch,
            });
        }
        let col = logits.column(j);
        let max = col.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let denom: f64 = col.iter().map(|v| (v - max).exp()).sum();
        loss += -(col[label] - max - denom.ln());
        for c in 0..classes {
            let p = (col[c] - max).exp() / denom;
            grad[(c, j)] = (p - f64::from(u8::from(c == label))) / n;
        }
    }
    Ok((loss / n, grad))
}

/// Fraction of columns whose argmax matches the label.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(logits: &DMatrix<f64>, labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let hits = labels
        .iter()
        .enumerate()
        .filter(|&(j, &label)| {
            let col = logits.column(j);
            let mut arg = 0;
            for c in 1..col.len() {
                if col[c] > col[arg] {
                    arg = c;
                }
            }
            arg == label
        })
        .count();
    hits as f64 / labels.len() as f64
}
