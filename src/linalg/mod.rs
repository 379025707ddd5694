//! Matrix-recovery objectives.
//!
//! Three ways of asking an optimizer to find a matrix: invert a square one,
//! pseudo-invert a rectangular one, and recover one it can only observe
//! through random matrix-vector products.

mod inverses;
mod recovery;

pub use inverses::{Inverse, MoorePenrose, PinvInit};
pub use recovery::StochasticMatrixRecovery;
