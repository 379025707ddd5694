//! Error types shared across the benchmark catalogue.

/// Everything that can go wrong while constructing or driving a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a benchmark receives a parameter vector of the wrong length.
    #[error("parameter length mismatch: expected {expected} values, got {got}")]
    ParamLenMismatch {
        /// The number of parameters the benchmark owns.
        expected: usize,
        /// The number of values provided.
        got: usize,
    },

    /// Returned when a matrix that must be square is not.
    #[error("matrix is not square: {rows}x{cols}")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when two operands have incompatible shapes.
    #[error("shape mismatch: {left} vs {right} ({context})")]
    ShapeMismatch {
        /// Shape of the left operand, formatted as `rows x cols`.
        left: String,
        /// Shape of the right operand, formatted as `rows x cols`.
        right: String,
        /// Where the mismatch was detected.
        context: &'static str,
    },

    /// Returned when a dimension argument is too small for the objective.
    #[error("invalid dimension: {dim} ({reason})")]
    InvalidDimension {
        /// The offending dimension.
        dim: usize,
        /// Why the dimension is rejected.
        reason: &'static str,
    },

    /// Returned when a configuration value is outside its valid range.
    #[error("invalid config for '{name}': {reason}")]
    InvalidConfig {
        /// The name of the offending option.
        name: &'static str,
        /// The reason the value is rejected.
        reason: String,
    },

    /// Returned when a mask does not cover the image it gates.
    #[error("mask shape {mask_rows}x{mask_cols} does not match image {rows}x{cols}")]
    MaskMismatch {
        /// Mask rows.
        mask_rows: usize,
        /// Mask columns.
        mask_cols: usize,
        /// Image rows.
        rows: usize,
        /// Image columns.
        cols: usize,
    },

    /// Returned when an index lies outside the image it refers to.
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} image")]
    IndexOutOfBounds {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Image rows.
        rows: usize,
        /// Image columns.
        cols: usize,
    },

    /// Returned when requesting best-run data before any evaluation completed.
    #[error("no evaluations recorded")]
    NoEvaluations,

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when writing or reading a report/record file fails.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when (de)serializing a run record fails.
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Build a [`Error::ShapeMismatch`] from two `(rows, cols)` pairs.
    pub(crate) fn shape_mismatch(
        left: (usize, usize),
        right: (usize, usize),
        context: &'static str,
    ) -> Self {
        Error::ShapeMismatch {
            left: format!("{}x{}", left.0, left.1),
            right: format!("{}x{}", right.0, right.1),
            context,
        }
    }
}
