//! # parmat-linalg
//!
//! Dense, row-major `f64` matrices with a parallel execution path.
//!
//! This crate provides:
//! - [`Matrix`]: a fixed-shape matrix backed by one contiguous buffer
//! - Addition, subtraction, multiplication and transpose, each with a
//!   sequential and a parallel path
//! - [`ParallelConfig`]: threshold, worker ceiling and executor settings
//! - The partitioning routine shared by all four operations
//!
//! ## Dispatch
//!
//! | Operation | Parallel when | Split over |
//! |---|---|---|
//! | add, subtract | `rows * cols >= threshold` | flat element ranges |
//! | multiply | `lhs.rows >= threshold` or `rhs.cols >= threshold` | output rows |
//! | transpose | `rows >= threshold` or `cols >= threshold` | input rows |
//!
//! The default threshold is [`MIN_PARALLEL_SIZE`]. Workers are capped at the
//! hardware concurrency, sampled once per process.
//!
//! ```
//! use parmat_linalg::Matrix;
//!
//! let a = Matrix::try_from([[1.0, 2.0], [3.0, 4.0]])?;
//! let b = Matrix::try_from([[5.0, 6.0], [7.0, 8.0]])?;
//! assert_eq!(a.multiply(&b)?, Matrix::try_from([[19.0, 22.0], [43.0, 50.0]])?);
//! # Ok::<(), parmat_linalg::MatrixError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod dense_matrix;
pub mod error;
pub mod kernels;
pub mod parallel;
pub mod partition;

pub use config::{DispatchMode, Executor, ParallelConfig, MIN_PARALLEL_SIZE};
pub use dense_matrix::Matrix;
pub use error::{MatrixError, Operation, Result, Shape};
pub use parallel::ExecutionStrategy;


#[cfg(test)]
mod proptests;
