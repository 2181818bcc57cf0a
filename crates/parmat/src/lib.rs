//! # parmat
//!
//! Dense `f64` matrices whose arithmetic splits large workloads across
//! threads.
//!
//! ## Features
//!
//! - **Row-major storage**: one contiguous buffer per matrix
//! - **Fork-join parallelism**: add, subtract, multiply and transpose split
//!   their output into disjoint ranges once operands cross a size threshold
//! - **Explicit configuration**: worker ceiling, threshold and executor are
//!   plain values, per call or installed once per process
//!
//! ## Quick Start
//!
//! ```
//! use parmat::prelude::*;
//!
//! let a = Matrix::try_from([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])?;
//! let t = a.transpose();
//! assert_eq!(t.shape(), Shape::new(3, 2));
//!
//! let config = ParallelConfig::parallel().with_max_workers(2);
//! let gram = a.multiply_with(&t, &config)?;
//! print!("{gram}");
//! # Ok::<(), MatrixError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub use parmat_linalg as linalg;
pub use parmat_linalg::config;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use parmat_linalg::{
        DispatchMode, ExecutionStrategy, Executor, Matrix, MatrixError, Operation, ParallelConfig,
        Shape, MIN_PARALLEL_SIZE,
    };
}
