//! Color-spreading objective on masked mazes.
//!
//! A take on the distill.pub momentum demo: color is pinned to a handful of
//! pull pixels and has to propagate through a snake-shaped maze, driven only
//! by a masked finite-difference smoothness penalty. Gradient descent paints
//! the maze one bend at a time, which makes momentum effects very visible.

use nalgebra::{DMatrix, DVector};

use crate::benchmark::{mat_to_vec, signum0, vec_to_mat, BenchState, Benchmark};
use crate::error::{Error, Result};
use crate::image::Image;

/// Snake maze with constant-height openings.
///
/// Alternates wall and path columns of the given width; every wall gets an
/// opening of `width` rows, alternating top and bottom.
///
/// # Panics
///
/// Panics when `width == 0`.
#[must_use]
pub fn snake_mask(rows: usize, cols: usize, width: usize) -> DMatrix<f64> {
    assert!(width > 0, "maze wall width must be positive");
    let mut mask = tiled_walls(rows, cols, width);
    let mut cur = 0;
    let mut cur_up = true;
    loop {
        let span = width.min(rows);
        for r in 0..span {
            let row = if cur_up { r } else { rows - 1 - r };
            for c in cur..(cur + width).min(cols) {
                mask[(row, c)] = 1.0;
            }
        }
        cur_up = !cur_up;
        cur += width * 2;
        if cur + width >= cols {
            break;
        }
    }
    mask
}

/// Snake maze with shrinking openings.
///
/// Like [`snake_mask`], but the opening heights follow a squared linspace
/// from `rows` down to 1, so the maze keeps getting tighter and later bends
/// take longer to color.
///
/// # Panics
///
/// Panics when `width == 0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn better_snake_mask(rows: usize, cols: usize, width: usize) -> DMatrix<f64> {
    assert!(width > 0, "maze wall width must be positive");
    let mut mask = tiled_walls(rows, cols, width);
    let num_sections = (cols / 2) / width;
    if num_sections == 0 {
        return mask;
    }

    let start = (rows as f64).sqrt();
    let mut cur = 0;
    let mut cur_up = true;
    for i in 0..num_sections {
        let t = if num_sections == 1 {
            0.0
        } else {
            i as f64 / (num_sections - 1) as f64
        };
        let v = start + (1.0 - start) * t;
        let vert = ((v * v) as usize).clamp(1, rows);

        for r in 0..vert {
            let row = if cur_up { r } else { rows - 1 - r };
            for c in cur..(cur + width).min(cols) {
                mask[(row, c)] = 1.0;
            }
        }
        cur_up = !cur_up;
        cur += width * 2;
        if cur + width >= cols {
            break;
        }
    }
    mask
}

/// Wall/path column tiling both mask builders start from.
fn tiled_walls(rows: usize, cols: usize, width: usize) -> DMatrix<f64> {
    DMatrix::from_fn(rows, cols, |_, c| {
        if (c / width) % 2 == 0 {
            0.0
        } else {
            1.0
        }
    })
}

/// Masked color-spreading objective.
///
/// The trainable image `p` is gated by the maze mask (`w = p * mask`); the
/// loss pulls the pull pixels toward 1 while penalizing masked
/// finite differences of order `order` raised to `power`:
///
/// ```text
/// 0.5 * sum_idx (1 - w[idx])^2
///   + 0.5 * (sum |diff_v(w)|^power + sum |diff_h(w)|^power)
/// ```
///
/// Parameters are bounded to `[0, 1]`; the run loop clamps after each step.
pub struct Colorization {
    state: BenchState,
    image: DMatrix<f64>,
    mask: DMatrix<f64>,
    pull_idxs: Vec<(usize, usize)>,
    order: usize,
    power: i32,
}

impl Colorization {
    /// Builds the objective from an init image, a 0/1 mask, pull pixels and
    /// the penalty configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when mask and image shapes differ, a pull index is
    /// out of bounds, `order` leaves no differences to take, or
    /// `power < 1`.
    pub fn new(
        init: DMatrix<f64>,
        mask: DMatrix<f64>,
        pull_idxs: Vec<(usize, usize)>,
        order: usize,
        power: i32,
    ) -> Result<Self> {
        let (rows, cols) = init.shape();
        if mask.shape() != (rows, cols) {
            return Err(Error::MaskMismatch {
                mask_rows: mask.nrows(),
                mask_cols: mask.ncols(),
                rows,
                cols,
            });
        }
        if order == 0 || order >= rows || order >= cols {
            return Err(Error::InvalidConfig {
                name: "order",
                reason: format!("difference order {order} does not fit a {rows}x{cols} image"),
            });
        }
        if power < 1 {
            return Err(Error::InvalidConfig {
                name: "power",
                reason: format!("power must be at least 1, got {power}"),
            });
        }
        let mut image = init.component_mul(&mask);
        for &(r, c) in &pull_idxs {
            if r >= rows || c >= cols {
                return Err(Error::IndexOutOfBounds {
                    row: r,
                    col: c,
                    rows,
                    cols,
                });
            }
            image[(r, c)] = 1.0;
        }
        Ok(Self {
            state: BenchState::new(0).with_bounds(0.0, 1.0),
            image,
            mask,
            pull_idxs,
            order,
            power,
        })
    }

    /// The 96x256 snake maze with 16-wide walls.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors from [`Colorization::new`].
    pub fn snake(order: usize, power: i32) -> Result<Self> {
        let init = DMatrix::zeros(96, 256);
        let mask = better_snake_mask(96, 256, 16);
        Self::new(init, mask, vec![(0, 0)], order, power)
    }

    /// The 16x64 snake maze with 4-wide walls; small enough for tests.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors from [`Colorization::new`].
    pub fn small(order: usize, power: i32) -> Result<Self> {
        let init = DMatrix::zeros(16, 64);
        let mask = better_snake_mask(16, 64, 4);
        Self::new(init, mask, vec![(0, 0)], order, power)
    }

    /// The maze mask.
    #[must_use]
    pub fn mask(&self) -> &DMatrix<f64> {
        &self.mask
    }

    /// Masked differences along one axis: `diff^order`, gated by the
    /// shifted mask product.
    fn masked_diff(&self, w: &DMatrix<f64>, vertical: bool) -> (DMatrix<f64>, DMatrix<f64>) {
        let mut t = w.clone();
        for _ in 0..self.order {
            t = diff_once(&t, vertical);
        }
        let (rows, cols) = t.shape();
        let gate = DMatrix::from_fn(rows, cols, |r, c| {
            if vertical {
                self.mask[(r + self.order, c)] * self.mask[(r, c)]
            } else {
                self.mask[(r, c + self.order)] * self.mask[(r, c)]
            }
        });
        (t.component_mul(&gate), gate)
    }

    fn penalty_value(&self, d: &DMatrix<f64>) -> f64 {
        d.iter().map(|v| v.abs().powi(self.power)).sum()
    }

    fn penalty_grad(&self, d: &DMatrix<f64>) -> DMatrix<f64> {
        let p = f64::from(self.power);
        d.map(|v| p * v.abs().powi(self.power - 1) * signum0(v))
    }

    /// Display frame: maze walls dimmed, overflow above 1 tinted red,
    /// below 0 tinted blue.
    fn render_frame(&self, w: &DMatrix<f64>) -> Image {
        let base = w + (self.mask.map(|m| (1.0 - m) * 0.1));
        let m1 = base.map(|v| (v - 1.0).max(0.0));
        let m2 = base.map(|v| (-v).max(0.0));
        let clip = |m: DMatrix<f64>| m.map(|v| v.clamp(0.0, 1.0));
        let r = clip(&base - &m1 + &m2);
        let g = clip(&base - &m1 * 2.0 + &m2);
        let b = clip(&base - &m1 * 2.0 + &m2 * 2.0);
        Image::from_rgb(&r, &g, &b)
    }
}

/// First-order forward difference along one axis.
fn diff_once(m: &DMatrix<f64>, vertical: bool) -> DMatrix<f64> {
    let (rows, cols) = m.shape();
    if vertical {
        DMatrix::from_fn(rows - 1, cols, |r, c| m[(r + 1, c)] - m[(r, c)])
    } else {
        DMatrix::from_fn(rows, cols - 1, |r, c| m[(r, c + 1)] - m[(r, c)])
    }
}

/// Adjoint of [`diff_once`]: maps the difference space back to the image
/// space.
fn diff_once_adjoint(g: &DMatrix<f64>, vertical: bool) -> DMatrix<f64> {
    let (rows, cols) = g.shape();
    if vertical {
        DMatrix::from_fn(rows + 1, cols, |r, c| {
            let above = if r > 0 { g[(r - 1, c)] } else { 0.0 };
            let here = if r < rows { g[(r, c)] } else { 0.0 };
            above - here
        })
    } else {
        DMatrix::from_fn(rows, cols + 1, |r, c| {
            let left = if c > 0 { g[(r, c - 1)] } else { 0.0 };
            let here = if c < cols { g[(r, c)] } else { 0.0 };
            left - here
        })
    }
}

impl Benchmark for Colorization {
    fn name(&self) -> &str {
        "colorization"
    }

    fn state(&self) -> &BenchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BenchState {
        &mut self.state
    }

    fn param_len(&self) -> usize {
        self.image.len()
    }

    fn params(&self) -> DVector<f64> {
        mat_to_vec(&self.image)
    }

    fn set_params(&mut self, params: &DVector<f64>) -> Result<()> {
        if params.len() != self.image.len() {
            return Err(Error::ParamLenMismatch {
                expected: self.image.len(),
                got: params.len(),
            });
        }
        self.image = vec_to_mat(params, self.image.nrows(), self.image.ncols());
        Ok(())
    }

    fn evaluate(&mut self) -> Result<f64> {
        let w = self.image.component_mul(&self.mask);

        let mut colorizer = 0.0;
        for &(r, c) in &self.pull_idxs {
            colorizer += (1.0 - w[(r, c)]).powi(2);
        }

        let (dv, _) = self.masked_diff(&w, true);
        let (dh, _) = self.masked_diff(&w, false);
        let spreader = self.penalty_value(&dv) + self.penalty_value(&dh);

        if self.state.should_log_images() {
            let frame = self.render_frame(&w);
            self.state.log_image("image", frame);
        }

        Ok(0.5 * colorizer + 0.5 * spreader)
    }

    fn gradient(&mut self) -> Result<DVector<f64>> {
        let w = self.image.component_mul(&self.mask);
        let mut g_w = DMatrix::zeros(w.nrows(), w.ncols());

        for &(r, c) in &self.pull_idxs {
            g_w[(r, c)] += w[(r, c)] - 1.0;
        }

        for vertical in [true, false] {
            let (d, gate) = self.masked_diff(&w, vertical);
            // 0.5 factor from the loss.
            let g_d = self.penalty_grad(&d) * 0.5;
            let mut g_t = g_d.component_mul(&gate);
            for _ in 0..self.order {
                g_t = diff_once_adjoint(&g_t, vertical);
            }
            g_w += g_t;
        }

        // Chain through w = image * mask.
        Ok(mat_to_vec(&g_w.component_mul(&self.mask)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_shapes() {
        let mask = better_snake_mask(96, 256, 16);
        assert_eq!(mask.shape(), (96, 256));
        // Walls and paths both present.
        assert!(mask.iter().any(|&v| v == 0.0));
        assert!(mask.iter().any(|&v| v == 1.0));
    }

    #[test]
    fn test_snake_mask_openings_alternate() {
        let mask = snake_mask(8, 32, 2);
        // First wall column pair opens at the top.
        assert_eq!(mask[(0, 0)], 1.0);
        assert_eq!(mask[(7, 0)], 0.0);
    }

    #[test]
    fn test_pull_pixel_initialized_to_one() {
        let bench = Colorization::small(1, 2).unwrap();
        assert_eq!(bench.image[(0, 0)], 1.0);
    }

    #[test]
    fn test_constant_one_on_path_is_low_loss() {
        let mut bench = Colorization::small(1, 2).unwrap();
        // Filling the whole path with the pulled color zeroes both terms.
        let full = bench.mask.clone();
        bench.set_params(&mat_to_vec(&full)).unwrap();
        assert!(bench.evaluate().unwrap() < 1e-20);
    }

    #[test]
    fn test_rejects_bad_config() {
        let init = DMatrix::zeros(4, 4);
        let mask = DMatrix::from_element(4, 4, 1.0);
        assert!(Colorization::new(init.clone(), DMatrix::zeros(3, 4), vec![], 1, 2).is_err());
        assert!(Colorization::new(init.clone(), mask.clone(), vec![(9, 0)], 1, 2).is_err());
        assert!(Colorization::new(init.clone(), mask.clone(), vec![], 0, 2).is_err());
        assert!(Colorization::new(init, mask, vec![], 1, 0).is_err());
    }

    #[test]
    fn test_diff_adjoint_is_transpose() {
        // <Dx, y> == <x, D^T y> for random-ish small matrices.
        let x = DMatrix::from_row_slice(3, 3, &[1.0, -2.0, 0.5, 3.0, 0.0, -1.0, 2.0, 1.0, 4.0]);
        let y = DMatrix::from_row_slice(2, 3, &[0.3, -1.0, 2.0, 1.5, 0.7, -0.2]);
        let dx = diff_once(&x, true);
        let dty = diff_once_adjoint(&y, true);
        let lhs: f64 = dx.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
        let rhs: f64 = x.iter().zip(dty.iter()).map(|(a, b)| a * b).sum();
        assert!((lhs - rhs).abs() < 1e-12);
    }
}
