//! Dense matrix of `f64` stored in row-major order.
//!
//! The shape is fixed at construction. Arithmetic never touches its
//! operands and always returns a fresh matrix; large operands are split
//! across workers according to the [`ParallelConfig`] in effect.

use std::fmt;
use std::mem;
use std::ops::{Add, Index, IndexMut, Mul, Sub};

use crate::config::{self, ParallelConfig};
use crate::error::{MatrixError, Operation, Result, Shape};
use crate::kernels;
use crate::parallel::{self, ExecutionStrategy};

/// Dense matrix stored in row-major order.
///
/// The 0x0 matrix is the empty state; every other matrix has at least one
/// row and one column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Matrix {
    /// Matrix entries in row-major order.
    data: Vec<f64>,
    /// Number of rows.
    rows: usize,
    /// Number of columns.
    cols: usize,
}

impl Matrix {
    /// Creates the empty 0x0 matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a `rows x cols` matrix filled with zeros.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidShape`] if either dimension is zero.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        Ok(Self {
            data: vec![0.0; len],
            rows,
            cols,
        })
    }

    /// Creates a matrix from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidShape`] if either dimension is zero and
    /// [`MatrixError::InvalidLength`] if `values.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let expected = checked_len(rows, cols)?;
        if values.len() != expected {
            return Err(MatrixError::InvalidLength {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            data: values,
            rows,
            cols,
        })
    }

    /// Creates a matrix from a sequence of rows.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::InvalidShape`] if there are no rows or the
    /// first row is empty, and [`MatrixError::RaggedRows`] if the rows do
    /// not all have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Err(MatrixError::InvalidShape { rows: 0, cols: 0 });
        };
        let cols = first.as_ref().len();
        let len = checked_len(rows.len(), cols)?;

        let mut data = Vec::with_capacity(len);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != cols {
                return Err(MatrixError::RaggedRows {
                    row,
                    expected: cols,
                    actual: values.len(),
                });
            }
            data.extend_from_slice(values);
        }

        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Wraps a finished buffer. Callers guarantee `data.len() == rows * cols`.
    fn from_parts(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    /// True for the 0x0 matrix.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the entry at `(row, col)`.
    ///
    /// Indices must be in range; this is checked in debug builds only.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }

    /// Overwrites the entry at `(row, col)`.
    ///
    /// Indices must be in range; this is checked in debug builds only.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }

    /// Returns a slice of the specified row.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        debug_assert!(row < self.rows, "row {row} out of range for {}", self.shape());
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns the entries in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consumes the matrix, returning its row-major buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// True if shapes match and every pair of entries differs by at most `tol`.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// Writes the formatted matrix to stdout.
    pub fn print(&self) {
        print!("{self}");
    }

    /// Element-wise sum using the process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if the shapes differ.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.add_with(other, config::global())
    }

    /// Element-wise sum using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if the shapes differ.
    pub fn add_with(&self, other: &Self, config: &ParallelConfig) -> Result<Self> {
        self.elementwise(Operation::Add, other, config, kernels::add)
    }

    /// Element-wise difference using the process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if the shapes differ.
    pub fn subtract(&self, other: &Self) -> Result<Self> {
        self.subtract_with(other, config::global())
    }

    /// Element-wise difference using `config`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if the shapes differ.
    pub fn subtract_with(&self, other: &Self, config: &ParallelConfig) -> Result<Self> {
        self.elementwise(Operation::Subtract, other, config, kernels::sub)
    }

    fn elementwise(
        &self,
        op: Operation,
        other: &Self,
        config: &ParallelConfig,
        kernel: kernels::ElementwiseKernel,
    ) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(MatrixError::DimensionMismatch {
                op,
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }

        let strategy = ExecutionStrategy::for_operation(op, self.shape(), other.shape(), config);
        let data = parallel::elementwise(op, &self.data, &other.data, strategy, config.executor, kernel);
        Ok(Self::from_parts(data, self.rows, self.cols))
    }

    /// Matrix product using the process-wide configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `self.cols() != other.rows()`.
    pub fn multiply(&self, other: &Self) -> Result<Self> {
        self.multiply_with(other, config::global())
    }

    /// Matrix product using `config`.
    ///
    /// Work is split over output rows. The parallel path is taken when the
    /// output has at least `parallel_threshold` rows or columns.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::DimensionMismatch`] if `self.cols() != other.rows()`.
    pub fn multiply_with(&self, other: &Self, config: &ParallelConfig) -> Result<Self> {
        if self.cols != other.rows {
            return Err(MatrixError::DimensionMismatch {
                op: Operation::Multiply,
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }

        let strategy =
            ExecutionStrategy::for_operation(Operation::Multiply, self.shape(), other.shape(), config);
        let data = parallel::matmul(
            &self.data,
            &other.data,
            self.rows,
            self.cols,
            other.cols,
            strategy,
            config.executor,
        );
        Ok(Self::from_parts(data, self.rows, other.cols))
    }

    /// Returns the transpose using the process-wide configuration.
    #[must_use]
    pub fn transpose(&self) -> Self {
        self.transpose_with(config::global())
    }

    /// Returns the transpose using `config`.
    #[must_use]
    pub fn transpose_with(&self, config: &ParallelConfig) -> Self {
        let strategy =
            ExecutionStrategy::for_operation(Operation::Transpose, self.shape(), Shape::default(), config);
        let data = parallel::transpose(&self.data, self.rows, self.cols, strategy, config.executor);
        Self::from_parts(data, self.cols, self.rows)
    }
}

/// Element count for a `rows x cols` buffer.
///
/// Rejects zero dimensions and any size whose allocation would exceed
/// `isize::MAX` bytes, the limit `Vec` enforces by panicking.
fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    if rows == 0 || cols == 0 {
        return Err(MatrixError::InvalidShape { rows, cols });
    }
    Shape::new(rows, cols)
        .checked_len()
        .filter(|&len| {
            len.checked_mul(mem::size_of::<f64>())
                .is_some_and(|bytes| bytes <= isize::MAX.unsigned_abs())
        })
        .ok_or(MatrixError::InvalidShape { rows, cols })
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        debug_assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for {}",
            self.shape()
        );
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        debug_assert!(
            row < self.rows && col < self.cols,
            "index ({row}, {col}) out of range for {}",
            self.shape()
        );
        &mut self.data[row * self.cols + col]
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl<const R: usize, const C: usize> TryFrom<[[f64; C]; R]> for Matrix {
    type Error = MatrixError;

    fn try_from(rows: [[f64; C]; R]) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl Add for &Matrix {
    type Output = Result<Matrix>;

    fn add(self, other: Self) -> Result<Matrix> {
        Matrix::add(self, other)
    }
}

impl Sub for &Matrix {
    type Output = Result<Matrix>;

    fn sub(self, other: Self) -> Result<Matrix> {
        self.subtract(other)
    }
}

impl Mul for &Matrix {
    type Output = Result<Matrix>;

    fn mul(self, other: Self) -> Result<Matrix> {
        self.multiply(other)
    }
}

/// One line per row: `[` + entries as `{:>8.2}` separated by spaces + `]`.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cols == 0 {
            return Ok(());
        }
        for row in self.data.chunks(self.cols) {
            f.write_str("[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{value:>8.2}")?;
            }
            f.write_str("]\n")?;
        }
        Ok(())
    }
}
