//! Error types for matrix construction and arithmetic.

use std::fmt;

use thiserror::Error;

/// The arithmetic operations that validate operand shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Element-wise addition.
    Add,
    /// Element-wise subtraction.
    Subtract,
    /// Matrix-matrix product.
    Multiply,
    /// Transpose (unary, never fails validation).
    Transpose,
}

impl Operation {
    /// Lower-case name used in log lines and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Transpose => "transpose",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `(rows, cols)` pair, displayed as `ROWSxCOLS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    /// Row count.
    pub rows: usize,
    /// Column count.
    pub cols: usize,
}

impl Shape {
    /// Creates a shape.
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of elements, or `None` if `rows * cols` overflows.
    #[must_use]
    pub fn checked_len(self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Errors raised while building a matrix or combining two matrices.
///
/// Every variant is reported before any element is computed and before any
/// worker is launched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// A dimension is zero, the nested input is empty, or `rows * cols`
    /// does not fit in memory.
    #[error("matrix dimensions must be positive, got {rows}x{cols}")]
    InvalidShape {
        /// Requested row count.
        rows: usize,
        /// Requested column count.
        cols: usize,
    },

    /// A flat value buffer does not hold exactly `rows * cols` values.
    #[error("expected {expected} values for the requested shape, got {actual}")]
    InvalidLength {
        /// `rows * cols`.
        expected: usize,
        /// Length of the supplied buffer.
        actual: usize,
    },

    /// Nested input whose rows do not all have the same length.
    #[error("row {row} has {actual} values but row 0 has {expected}")]
    RaggedRows {
        /// Index of the first offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },

    /// Operand shapes are incompatible for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} and {rhs}")]
    DimensionMismatch {
        /// The operation being attempted.
        op: Operation,
        /// Left operand shape.
        lhs: Shape,
        /// Right operand shape.
        rhs: Shape,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = MatrixError> = std::result::Result<T, E>;
