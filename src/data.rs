//! Structured test matrices used as linalg-benchmark inputs.
//!
//! All matrices are generated procedurally; the seeded ones reproduce
//! bit-identically per seed. Hilbert is the classic ill-conditioned input,
//! Hadamard and Helmert are orthogonal (up to scaling), the DFT pair gives a
//! dense highly structured input with visible interference patterns in the
//! logged frames.

use nalgebra::DMatrix;

use crate::error::{Error, Result};
use crate::rng::Rng;

/// Seeded standard-normal square matrix.
#[must_use]
pub fn randn(size: usize, seed: u64) -> DMatrix<f64> {
    Rng::with_seed(seed).normal_matrix(size, size)
}

/// Hilbert matrix `H[i][j] = 1 / (i + j + 1)`.
///
/// Famously ill-conditioned even at modest sizes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hilbert(size: usize) -> DMatrix<f64> {
    DMatrix::from_fn(size, size, |i, j| 1.0 / ((i + j) as f64 + 1.0))
}

/// Circulant matrix with a seeded uniform first column.
///
/// `C[i][j] = c[(i - j) mod n]` for `c ~ U(-1, 1)^n`.
#[must_use]
pub fn circulant(size: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = Rng::with_seed(seed);
    let c: Vec<f64> = (0..size).map(|_| rng.uniform(-1.0, 1.0)).collect();
    DMatrix::from_fn(size, size, |i, j| c[(size + i - j) % size])
}

/// Sylvester-construction Hadamard matrix.
///
/// # Errors
///
/// Returns an error unless `size` is a power of two.
pub fn hadamard(size: usize) -> Result<DMatrix<f64>> {
    if size == 0 || !size.is_power_of_two() {
        return Err(Error::InvalidDimension {
            dim: size,
            reason: "hadamard needs a power-of-two size",
        });
    }
    let mut h = DMatrix::from_element(1, 1, 1.0);
    while h.nrows() < size {
        let n = h.nrows();
        h = DMatrix::from_fn(2 * n, 2 * n, |i, j| {
            let v = h[(i % n, j % n)];
            if i >= n && j >= n {
                -v
            } else {
                v
            }
        });
    }
    Ok(h)
}

/// Full square Helmert matrix (orthogonal).
///
/// Row 0 is the constant `1/sqrt(n)`; row `i` contrasts the first `i`
/// entries against entry `i`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn helmert(size: usize) -> DMatrix<f64> {
    DMatrix::from_fn(size, size, |i, j| {
        if i == 0 {
            1.0 / (size as f64).sqrt()
        } else {
            let scale = 1.0 / ((i * (i + 1)) as f64).sqrt();
            if j < i {
                scale
            } else if j == i {
                -(i as f64) * scale
            } else {
                0.0
            }
        }
    })
}

/// Fiedler matrix `F[i][j] = |v[i] - v[j]|` over a seeded uniform vector.
#[must_use]
pub fn fiedler(size: usize, seed: u64) -> DMatrix<f64> {
    let mut rng = Rng::with_seed(seed);
    let v: Vec<f64> = (0..size).map(|_| rng.uniform(-1.0, 1.0)).collect();
    DMatrix::from_fn(size, size, |i, j| (v[i] - v[j]).abs())
}

/// Real and imaginary parts of the DFT matrix `exp(-2*pi*i*jk/n)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dft(size: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    let n = size as f64;
    let re = DMatrix::from_fn(size, size, |j, k| {
        (-core::f64::consts::TAU * (j * k) as f64 / n).cos()
    });
    let im = DMatrix::from_fn(size, size, |j, k| {
        (-core::f64::consts::TAU * (j * k) as f64 / n).sin()
    });
    (re, im)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hilbert_entries() {
        let h = hilbert(3);
        assert_eq!(h[(0, 0)], 1.0);
        assert!((h[(1, 2)] - 0.25).abs() < 1e-15);
        assert_eq!(h[(2, 1)], h[(1, 2)]);
    }

    #[test]
    fn test_circulant_structure() {
        let c = circulant(5, 0);
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(c[(i, j)], c[((i + 1) % 5, (j + 1) % 5)]);
            }
        }
    }

    #[test]
    fn test_hadamard_orthogonal_rows() {
        let h = hadamard(8).unwrap();
        let g = &h * h.transpose();
        for i in 0..8 {
            for j in 0..8 {
                let expected = if i == j { 8.0 } else { 0.0 };
                assert!((g[(i, j)] - expected).abs() < 1e-12);
            }
        }
        assert!(hadamard(6).is_err());
        assert!(hadamard(0).is_err());
    }

    #[test]
    fn test_helmert_orthogonal() {
        let h = helmert(5);
        let g = &h * h.transpose();
        for i in 0..5 {
            for j in 0..5 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((g[(i, j)] - expected).abs() < 1e-12, "({i},{j}) = {}", g[(i, j)]);
            }
        }
    }

    #[test]
    fn test_fiedler_symmetric_zero_diagonal() {
        let f = fiedler(6, 1);
        for i in 0..6 {
            assert_eq!(f[(i, i)], 0.0);
            for j in 0..6 {
                assert_eq!(f[(i, j)], f[(j, i)]);
                assert!(f[(i, j)] >= 0.0);
            }
        }
    }

    #[test]
    fn test_dft_first_row_and_column() {
        let (re, im) = dft(4);
        for k in 0..4 {
            assert!((re[(0, k)] - 1.0).abs() < 1e-12);
            assert!(im[(0, k)].abs() < 1e-12);
            assert!((re[(k, 0)] - 1.0).abs() < 1e-12);
        }
        // Second root of unity for n = 4 is -i.
        assert!(re[(1, 1)].abs() < 1e-12);
        assert!((im[(1, 1)] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_randn_seeded() {
        assert_eq!(randn(4, 7), randn(4, 7));
        assert_ne!(randn(4, 7), randn(4, 8));
    }
}
