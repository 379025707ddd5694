//! Reference optimizers for driving benchmarks.
//!
//! The crate exists to evaluate *external* optimizers; these two are the
//! baselines the test suite and the examples use. Both operate on the flat
//! parameter vector the [`Benchmark`](crate::Benchmark) trait exposes.

use nalgebra::DVector;

/// An optimizer updating a flat parameter vector in place.
pub trait Optimizer {
    /// Applies one update given the gradient at the current parameters.
    fn step(&mut self, params: &mut DVector<f64>, grad: &DVector<f64>);
}

/// Gradient descent with optional heavy-ball momentum.
///
/// # Examples
///
/// ```
/// use lossbench::optim::Sgd;
///
/// let plain = Sgd::new(0.01);
/// let with_momentum = Sgd::with_momentum(0.01, 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct Sgd {
    lr: f64,
    momentum: f64,
    velocity: Option<DVector<f64>>,
}

impl Sgd {
    /// Plain gradient descent with the given learning rate.
    #[must_use]
    pub fn new(lr: f64) -> Self {
        Self::with_momentum(lr, 0.0)
    }

    /// Gradient descent with heavy-ball momentum.
    #[must_use]
    pub fn with_momentum(lr: f64, momentum: f64) -> Self {
        Self {
            lr,
            momentum,
            velocity: None,
        }
    }

    /// Learning rate.
    #[must_use]
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Momentum coefficient.
    #[must_use]
    pub fn momentum(&self) -> f64 {
        self.momentum
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut DVector<f64>, grad: &DVector<f64>) {
        if self.momentum > 0.0 {
            let velocity = self
                .velocity
                .get_or_insert_with(|| DVector::zeros(grad.len()));
            *velocity = &*velocity * self.momentum + grad;
            params.axpy(-self.lr, velocity, 1.0);
        } else {
            params.axpy(-self.lr, grad, 1.0);
        }
    }
}

/// Adam with bias-corrected first and second moments.
#[derive(Debug, Clone)]
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    m: Option<DVector<f64>>,
    v: Option<DVector<f64>>,
    t: u64,
}

impl Adam {
    /// Adam with the usual defaults (`beta1 = 0.9`, `beta2 = 0.999`,
    /// `eps = 1e-8`).
    #[must_use]
    pub fn new(lr: f64) -> Self {
        Self::with_betas(lr, 0.9, 0.999, 1e-8)
    }

    /// Adam with explicit moment decay rates.
    #[must_use]
    pub fn with_betas(lr: f64, beta1: f64, beta2: f64, eps: f64) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            eps,
            m: None,
            v: None,
            t: 0,
        }
    }

    /// Learning rate.
    #[must_use]
    pub fn lr(&self) -> f64 {
        self.lr
    }
}

impl Optimizer for Adam {
    #[allow(clippy::cast_precision_loss)]
    fn step(&mut self, params: &mut DVector<f64>, grad: &DVector<f64>) {
        let n = grad.len();
        let m = self.m.get_or_insert_with(|| DVector::zeros(n));
        let v = self.v.get_or_insert_with(|| DVector::zeros(n));
        self.t += 1;
        let t = self.t as f64;

        *m = &*m * self.beta1 + grad * (1.0 - self.beta1);
        *v = &*v * self.beta2 + grad.component_mul(grad) * (1.0 - self.beta2);

        let m_hat_scale = 1.0 / (1.0 - self.beta1.powf(t));
        let v_hat_scale = 1.0 / (1.0 - self.beta2.powf(t));

        for i in 0..n {
            let m_hat = m[i] * m_hat_scale;
            let v_hat = v[i] * v_hat_scale;
            params[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }
    }
}
