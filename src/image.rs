//! Image buffers logged by benchmarks.
//!
//! Benchmarks log matrix-valued state (the current inverse estimate, the
//! colorization canvas, ...) as [`Image`] frames. Frames are stored as raw
//! `f64` planes; normalization to display bytes happens on demand in the
//! report layer.

use nalgebra::DMatrix;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A dense image with one or three channels, stored row-major per channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Image {
    channels: usize,
    rows: usize,
    cols: usize,
    /// Channel-major, then row-major data: `data[c * rows * cols + r * cols + col]`.
    data: Vec<f64>,
}

impl Image {
    /// Creates a single-channel image from a matrix.
    #[must_use]
    pub fn from_matrix(m: &DMatrix<f64>) -> Self {
        let (rows, cols) = m.shape();
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(m[(r, c)]);
            }
        }
        Self {
            channels: 1,
            rows,
            cols,
            data,
        }
    }

    /// Creates a three-channel image from red, green and blue planes.
    ///
    /// # Panics
    ///
    /// Panics if the planes do not share one shape.
    #[must_use]
    pub fn from_rgb(r: &DMatrix<f64>, g: &DMatrix<f64>, b: &DMatrix<f64>) -> Self {
        assert_eq!(r.shape(), g.shape(), "rgb planes must share a shape");
        assert_eq!(r.shape(), b.shape(), "rgb planes must share a shape");
        let (rows, cols) = r.shape();
        let mut data = Vec::with_capacity(3 * rows * cols);
        for plane in [r, g, b] {
            for i in 0..rows {
                for j in 0..cols {
                    data.push(plane[(i, j)]);
                }
            }
        }
        Self {
            channels: 3,
            rows,
            cols,
            data,
        }
    }

    /// Number of channels (1 or 3).
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Image height.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Image width.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Raw value at `(channel, row, col)`.
    #[must_use]
    pub fn get(&self, channel: usize, row: usize, col: usize) -> f64 {
        self.data[channel * self.rows * self.cols + row * self.cols + col]
    }

    /// One channel as a matrix.
    #[must_use]
    pub fn channel(&self, channel: usize) -> DMatrix<f64> {
        DMatrix::from_fn(self.rows, self.cols, |r, c| self.get(channel, r, c))
    }

    /// Absolute elementwise difference with another frame of the same shape.
    ///
    /// Returns `None` when shapes differ (frames from different phases of a
    /// run are not comparable).
    #[must_use]
    pub fn abs_diff(&self, other: &Image) -> Option<Image> {
        if self.channels != other.channels || self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .collect();
        Some(Image {
            channels: self.channels,
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Normalizes the frame to display bytes.
    ///
    /// Maps the min..max value range onto 0..=255 per image (all channels
    /// together, so relative channel intensity is preserved). A constant
    /// image maps to mid-gray.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_uint8(&self) -> Vec<u8> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in &self.data {
            if v.is_nan() {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
        }
        if min >= max {
            return vec![128; self.data.len()];
        }
        let scale = 255.0 / (max - min);
        self.data
            .iter()
            .map(|&v| {
                if v.is_nan() {
                    0
                } else {
                    ((v - min) * scale).clamp(0.0, 255.0).round() as u8
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_matrix_roundtrip() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let img = Image::from_matrix(&m);
        assert_eq!(img.channels(), 1);
        assert_eq!((img.rows(), img.cols()), (2, 3));
        assert_eq!(img.channel(0), m);
    }

    #[test]
    fn test_to_uint8_range() {
        let m = DMatrix::from_row_slice(1, 3, &[-1.0, 0.0, 1.0]);
        let bytes = Image::from_matrix(&m).to_uint8();
        assert_eq!(bytes, vec![0, 128, 255]);
    }

    #[test]
    fn test_to_uint8_constant() {
        let m = DMatrix::from_element(2, 2, 3.5);
        assert_eq!(Image::from_matrix(&m).to_uint8(), vec![128; 4]);
    }

    #[test]
    fn test_abs_diff_shape_guard() {
        let a = Image::from_matrix(&DMatrix::zeros(2, 2));
        let b = Image::from_matrix(&DMatrix::zeros(3, 2));
        assert!(a.abs_diff(&b).is_none());
    }
}
