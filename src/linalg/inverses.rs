//! Inverse and pseudoinverse recovery objectives.

use nalgebra::{DMatrix, DVector};

use crate::benchmark::{mat_to_vec, vec_to_mat, BenchState, Benchmark, PointwiseLoss};
use crate::error::{Error, Result};
use crate::image::Image;

/// Finds the inverse of a fixed square matrix.
///
/// The trainable `B` is scored against every characterization of the inverse
/// at once:
///
/// ```text
/// L(AB, BA) + L(AB, I) + L(BA, I) + L(diag(BA), 1) + L(diag(AB), 1)
/// ```
///
/// for a pointwise criterion `L`. `B` starts as a copy of `A`, which makes
/// the early loss landscape visibly structured in the logged frames. The
/// input and its true inverse (pseudoinverse when singular) are stored as
/// reference images.
pub struct Inverse {
    state: BenchState,
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    criterion: PointwiseLoss,
}

impl Inverse {
    /// Builds the objective for a square matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSquare`] for rectangular input.
    pub fn new(a: DMatrix<f64>) -> Result<Self> {
        let (rows, cols) = a.shape();
        if rows != cols {
            return Err(Error::NotSquare { rows, cols });
        }
        let mut state = BenchState::new(0);
        state.add_reference_image("input", Image::from_matrix(&a));
        match a.clone().try_inverse() {
            Some(inv) => state.add_reference_image("true inverse", Image::from_matrix(&inv)),
            None => {
                if let Ok(pinv) = a.clone().svd(true, true).pseudo_inverse(1e-12) {
                    state.add_reference_image("pseudoinverse", Image::from_matrix(&pinv));
                }
            }
        }
        Ok(Self {
            state,
            b: a.clone(),
            a,
            criterion: PointwiseLoss::Mse,
        })
    }

    /// Swaps the criterion (default MSE).
    #[must_use]
    pub fn with_criterion(mut self, criterion: PointwiseLoss) -> Self {
        self.criterion = criterion;
        self
    }

    /// Side length of the matrix.
    #[must_use]
    pub fn size(&self) -> usize {
        self.a.nrows()
    }

    fn products(&self) -> (DMatrix<f64>, DMatrix<f64>, DMatrix<f64>, DVector<f64>) {
        let n = self.a.nrows();
        let ab = &self.a * &self.b;
        let ba = &self.b * &self.a;
        let identity = DMatrix::identity(n, n);
        let ones = DVector::from_element(n, 1.0);
        (ab, ba, identity, ones)
    }
}

impl Benchmark for Inverse {
    fn name(&self) -> &str {
        "inverse"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.b.len()
    }

    fn params(&self) -> DVector<f64> {
        mat_to_vec(&self.b)
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != self.b.len() {
            return Err(Error::ParamLenMismatch {
                expected: self.b.len(),
                got: params.len(),
            });
        }
        self.b = vec_to_mat(params, self.b.nrows(), self.b.ncols());
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let (ab, ba, identity, ones) = self.products();
        let loss = self.criterion.eval(&ab, &ba)
            + self.criterion.eval(&ab, &identity)
            + self.criterion.eval(&ba, &identity)
            + self.criterion.eval_vec(&ba.diagonal(), &ones)
            + self.criterion.eval_vec(&ab.diagonal(), &ones);

        if self.state.should_log_images() {
            self.state
                .log_image_with_difference("inverse", Image::from_matrix(&self.b));
            self.state.log_image("AB", Image::from_matrix(&ab));
            self.state.log_image("BA", Image::from_matrix(&ba));
        }
        Ok(loss)
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let (ab, ba, identity, ones) = self.products();
        let at = self.a.transpose();

        // L(AB, BA): both operands depend on B.
        let d1 = self.criterion.grad(&ab, &ba);
        let mut grad = &at * &d1 - &d1 * &at;
        // L(AB, I) and L(BA, I).
        grad += &at * self.criterion.grad(&ab, &identity);
        grad += self.criterion.grad(&ba, &identity) * &at;
        // Diagonal pulls toward 1.
        let d4 = self.criterion.grad_vec(&ba.diagonal(), &ones);
        let d5 = self.criterion.grad_vec(&ab.diagonal(), &ones);
        grad += DMatrix::from_diagonal(&d4) * &at;
        grad += &at * DMatrix::from_diagonal(&d5);

        Ok(mat_to_vec(&grad))
    }
}

/// Initialization for the pseudoinverse estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinvInit {
    /// Start from a copy of the input matrix.
    #[default]
    Copy,
    /// Start from seeded standard-normal entries.
    Randn,
}

/// Finds the Moore-Penrose pseudoinverse of a fixed matrix through the four
/// Penrose-condition residuals:
///
/// ```text
/// ||AXA - A||^2 + ||XAX - X||^2 + ||(AX)^T - AX||^2 + ||(XA)^T - XA||^2
/// ```
///
/// each mean-reduced. Works for any rectangular `A`.
pub struct MoorePenrose {
    state: BenchState,
    a: DMatrix<f64>,
    x: DMatrix<f64>,
}

impl MoorePenrose {
    /// Builds the objective; `X` has the transposed shape of `A`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty matrix.
    pub fn new(a: DMatrix<f64>, init: PinvInit, seed: u64) -> Result<Self> {
        let (m, n) = a.shape();
        if m == 0 || n == 0 {
            return Err(Error::InvalidDimension {
                dim: 0,
                reason: "pseudoinverse recovery needs a non-empty matrix",
            });
        }
        let mut state = BenchState::new(seed);
        state.add_reference_image("input", Image::from_matrix(&a));
        if let Ok(pinv) = a.clone().svd(true, true).pseudo_inverse(1e-12) {
            state.add_reference_image("true pseudoinverse", Image::from_matrix(&pinv));
        }
        let x = match init {
            PinvInit::Copy => a.transpose(),
            PinvInit::Randn => state.rng().normal_matrix(n, m),
        };
        Ok(Self { state, a, x })
    }

    fn products(&self) -> Products {
        let ax = &self.a * &self.x;
        let xa = &self.x * &self.a;
        let axa = &ax * &self.a;
        let xax = &xa * &self.x;
        Products { ax, xa, axa, xax }
    }
}

struct Products {
    ax: DMatrix<f64>,
    xa: DMatrix<f64>,
    axa: DMatrix<f64>,
    xax: DMatrix<f64>,
}

impl Benchmark for MoorePenrose {
    fn name(&self) -> &str {
        "moore_penrose"
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
        mat_to_vec(&self.x)
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != self.x.len() {
            return Err(Error::ParamLenMismatch {
                expected: self.x.len(),
                got: params.len(),
            });
        }
        self.x = vec_to_mat(params, self.x.nrows(), self.x.ncols());
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let mse = PointwiseLoss::Mse;
        let p = self.products();
        let loss = mse.eval(&p.axa, &self.a)
            + mse.eval(&p.xax, &self.x)
            + mse.eval(&p.ax.transpose(), &p.ax)
            + mse.eval(&p.xa.transpose(), &p.xa);

        if self.state.should_log_images() {
            self.state
                .log_image_with_difference("pseudoinverse", Image::from_matrix(&self.x));
            self.state.log_image("AX", Image::from_matrix(&p.ax));
            self.state.log_image("XA", Image::from_matrix(&p.xa));
            self.state.log_image("AXA", Image::from_matrix(&p.axa));
            self.state.log_image("XAX", Image::from_matrix(&p.xax));
        }
        Ok(loss)
    }

    #[allow(clippy::cast_precision_loss)]
    fn gradient(&mut self) -> Result<DVector<f64>> {
        let mse = PointwiseLoss::Mse;
        let p = self.products();
        let at = self.a.transpose();

        // d/dX ||AXA - A||^2.
        let g1 = mse.grad(&p.axa, &self.a);
        let mut grad = &at * &g1 * &at;

        // d/dX ||XAX - X||^2: X appears three times.
        let g2 = mse.grad(&p.xax, &self.x);
        grad += &g2 * p.ax.transpose() + p.xa.transpose() * &g2 - &g2;

        // Symmetry residuals: d/dS ||S^T - S||^2 = (4/N)(S - S^T).
        let n_ax = p.ax.len() as f64;
        let sym_ax = (&p.ax - p.ax.transpose()) * (4.0 / n_ax);
        grad += &at * sym_ax;

        let n_xa = p.xa.len() as f64;
        let sym_xa = (&p.xa - p.xa.transpose()) * (4.0 / n_xa);
        grad += sym_xa * &at;

        Ok(mat_to_vec(&grad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_zero_loss_at_true_inverse() {
        let a = DMatrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv = a.clone().try_inverse().unwrap();
        let mut bench = Inverse::new(a).unwrap();
        bench.set_params(&mat_to_vec(&inv)).unwrap();
        assert!(bench.evaluate().unwrap() < 1e-20);
        assert!(bench.gradient().unwrap().norm() < 1e-9);
    }

    #[test]
    fn test_inverse_rejects_rectangular() {
        let a = DMatrix::zeros(2, 3);
        assert!(matches!(
            Inverse::new(a),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_inverse_reference_images() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 2.0]);
        let bench = Inverse::new(a).unwrap();
        let refs = bench.state().record().reference_images();
        assert!(refs.contains_key("input"));
        assert!(refs.contains_key("true inverse"));
    }

    #[test]
    fn test_moore_penrose_zero_loss_at_pinv() {
        let a = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let pinv = a.clone().svd(true, true).pseudo_inverse(1e-12).unwrap();
        let mut bench = MoorePenrose::new(a, PinvInit::Copy, 0).unwrap();
        bench.set_params(&mat_to_vec(&pinv)).unwrap();
        assert!(bench.evaluate().unwrap() < 1e-20);
        assert!(bench.gradient().unwrap().norm() < 1e-9);
    }

    #[test]
    fn test_moore_penrose_randn_init_seeded() {
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let x = MoorePenrose::new(a.clone(), PinvInit::Randn, 7).unwrap();
        let y = MoorePenrose::new(a, PinvInit::Randn, 7).unwrap();
        assert_eq!(x.params(), y.params());
        assert_eq!(x.x.shape(), (3, 2));
    }
}
