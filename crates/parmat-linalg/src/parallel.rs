//! Sequential/parallel dispatch for matrix operations.
//!
//! Every operation goes through the same three steps: pick an
//! [`ExecutionStrategy`] from the operand shapes and the
//! [`ParallelConfig`], split the freshly allocated output buffer into
//! disjoint views with [`crate::partition`], and fork-join one task per view
//! with [`run_ranges`]. The caller is blocked until every task is done.

use std::ops::Range;

use crate::config::{DispatchMode, Executor, ParallelConfig};
use crate::error::{Operation, Shape};
use crate::kernels;
use crate::partition::{partition, split_column_bands, split_contiguous, worker_count};

/// Sequential or parallel execution of one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Run the whole range on the calling thread.
    Sequential,
    /// Split the work over at most `workers` tasks.
    Parallel {
        /// Nominal worker count; empty ranges are not launched.
        workers: usize,
    },
}

/// Size of an operation as seen by the dispatch policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Workload {
    /// Number of partition units (flat elements or rows).
    pub units: usize,
    /// Whether the size threshold asks for the parallel path.
    pub triggered: bool,
}

impl Workload {
    /// Measures an operation on operands of the given shapes.
    ///
    /// `rhs` is ignored for [`Operation::Transpose`]. Shapes are assumed to
    /// be compatible already.
    #[must_use]
    pub fn measure(op: Operation, lhs: Shape, rhs: Shape, threshold: usize) -> Self {
        match op {
            Operation::Add | Operation::Subtract => {
                let units = lhs.rows * lhs.cols;
                Self {
                    units,
                    triggered: units >= threshold,
                }
            }
            // Thresholded on the output shape, partitioned over output rows.
            Operation::Multiply => Self {
                units: lhs.rows,
                triggered: lhs.rows >= threshold || rhs.cols >= threshold,
            },
            Operation::Transpose => Self {
                units: lhs.rows,
                triggered: lhs.rows >= threshold || lhs.cols >= threshold,
            },
        }
    }
}

impl ExecutionStrategy {
    /// Applies the dispatch mode and worker ceiling to a workload.
    #[must_use]
    pub fn select(workload: Workload, config: &ParallelConfig) -> Self {
        if workload.units == 0 {
            return ExecutionStrategy::Sequential;
        }
        let parallel = match config.dispatch {
            DispatchMode::Sequential => false,
            DispatchMode::Parallel => true,
            DispatchMode::Auto => workload.triggered,
        };
        if parallel {
            ExecutionStrategy::Parallel {
                workers: worker_count(config.worker_ceiling(), workload.units),
            }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Strategy for `op` on operands of the given shapes.
    #[must_use]
    pub fn for_operation(op: Operation, lhs: Shape, rhs: Shape, config: &ParallelConfig) -> Self {
        let workload = Workload::measure(op, lhs, rhs, config.parallel_threshold);
        let strategy = Self::select(workload, config);
        log::debug!(
            "{op}: lhs {lhs}, rhs {rhs}, {} units, threshold {} -> {strategy:?}",
            workload.units,
            config.parallel_threshold,
        );
        strategy
    }

    /// Whether this strategy launches workers.
    #[must_use]
    pub fn is_parallel(self) -> bool {
        matches!(self, ExecutionStrategy::Parallel { .. })
    }
}

/// Runs `f` once per `(range, view)` pair and waits for all of them.
///
/// Each view is moved into exactly one task, so tasks never share mutable
/// state. A panic in any task resurfaces here after the others finish.
pub fn run_ranges<V, F>(executor: Executor, op: Operation, work: Vec<(Range<usize>, V)>, f: F)
where
    V: Send,
    F: Fn(Range<usize>, V) + Sync,
{
    let f = &f;
    match executor {
        Executor::Rayon => rayon::scope(|s| {
            for (range, view) in work {
                log::trace!("{op}: spawning task for {range:?}");
                s.spawn(move |_| f(range, view));
            }
        }),
        Executor::ScopedThreads => std::thread::scope(|s| {
            for (range, view) in work {
                log::trace!("{op}: spawning thread for {range:?}");
                s.spawn(move || f(range, view));
            }
        }),
    }
}

/// Element-wise combination of two equally sized buffers.
pub(crate) fn elementwise(
    op: Operation,
    lhs: &[f64],
    rhs: &[f64],
    strategy: ExecutionStrategy,
    executor: Executor,
    kernel: kernels::ElementwiseKernel,
) -> Vec<f64> {
    debug_assert_eq!(lhs.len(), rhs.len());
    let mut out = vec![0.0; lhs.len()];

    match strategy {
        ExecutionStrategy::Sequential => kernel(lhs, rhs, &mut out),
        ExecutionStrategy::Parallel { workers } => {
            let ranges = partition(lhs.len(), workers);
            let views = split_contiguous(&mut out, &ranges, 1);
            let work: Vec<(Range<usize>, &mut [f64])> = ranges.into_iter().zip(views).collect();
            run_ranges(executor, op, work, |range, view| {
                kernel(&lhs[range.clone()], &rhs[range], view);
            });
        }
    }
    out
}

/// Product of a `lhs_rows x inner` and an `inner x rhs_cols` buffer.
pub(crate) fn matmul(
    lhs: &[f64],
    rhs: &[f64],
    lhs_rows: usize,
    inner: usize,
    rhs_cols: usize,
    strategy: ExecutionStrategy,
    executor: Executor,
) -> Vec<f64> {
    let mut out = vec![0.0; lhs_rows * rhs_cols];

    match strategy {
        ExecutionStrategy::Sequential => {
            kernels::matmul_rows(lhs, rhs, inner, rhs_cols, 0..lhs_rows, &mut out);
        }
        ExecutionStrategy::Parallel { workers } => {
            let ranges = partition(lhs_rows, workers);
            let views = split_contiguous(&mut out, &ranges, rhs_cols);
            let work: Vec<(Range<usize>, &mut [f64])> = ranges.into_iter().zip(views).collect();
            run_ranges(executor, Operation::Multiply, work, |rows, view| {
                kernels::matmul_rows(lhs, rhs, inner, rhs_cols, rows, view);
            });
        }
    }
    out
}

/// Transpose of a `rows x cols` buffer into a `cols x rows` buffer.
pub(crate) fn transpose(
    input: &[f64],
    rows: usize,
    cols: usize,
    strategy: ExecutionStrategy,
    executor: Executor,
) -> Vec<f64> {
    let mut out = vec![0.0; rows * cols];

    // Output rows have length `rows`; a band of input rows is a band of
    // output columns.
    match strategy {
        ExecutionStrategy::Sequential => {
            let all = [0..rows];
            if let Some(mut band) = split_column_bands(&mut out, rows, &all).pop() {
                kernels::transpose_rows(input, cols, 0..rows, &mut band);
            }
        }
        ExecutionStrategy::Parallel { workers } => {
            let ranges = partition(rows, workers);
            let bands = split_column_bands(&mut out, rows, &ranges);
            let work: Vec<(Range<usize>, Vec<&mut [f64]>)> = ranges.into_iter().zip(bands).collect();
            run_ranges(executor, Operation::Transpose, work, |in_rows, mut band| {
                kernels::transpose_rows(input, cols, in_rows, &mut band);
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::config::MIN_PARALLEL_SIZE;

    fn auto(max_workers: usize) -> ParallelConfig {
        ParallelConfig::default().with_max_workers(max_workers)
    }

    #[test]
    fn test_elementwise_threshold_boundary() {
        let config = auto(4);
        let at = Workload::measure(Operation::Add, Shape::new(8, 8), Shape::new(8, 8), MIN_PARALLEL_SIZE);
        assert_eq!(at.units, 64);
        assert!(at.triggered);
        assert_eq!(
            ExecutionStrategy::select(at, &config),
            ExecutionStrategy::Parallel { workers: 4 }
        );

        let below = Workload::measure(Operation::Subtract, Shape::new(7, 9), Shape::new(7, 9), MIN_PARALLEL_SIZE);
        assert_eq!(below.units, 63);
        assert!(!below.triggered);
        assert_eq!(ExecutionStrategy::select(below, &config), ExecutionStrategy::Sequential);
    }

    #[test]
    fn test_multiply_trigger_uses_output_shape() {
        let config = auto(8);
        // Large contracted dimension alone does not trigger.
        let s = ExecutionStrategy::for_operation(
            Operation::Multiply,
            Shape::new(2, 1000),
            Shape::new(1000, 2),
            &config,
        );
        assert_eq!(s, ExecutionStrategy::Sequential);

        // Wide output triggers even with only two output rows.
        let s = ExecutionStrategy::for_operation(
            Operation::Multiply,
            Shape::new(2, 3),
            Shape::new(3, 64),
            &config,
        );
        assert_eq!(s, ExecutionStrategy::Parallel { workers: 2 });
    }

    #[test]
    fn test_transpose_trigger() {
        let config = auto(8);
        let s = ExecutionStrategy::for_operation(
            Operation::Transpose,
            Shape::new(1, 64),
            Shape::default(),
            &config,
        );
        assert_eq!(s, ExecutionStrategy::Parallel { workers: 1 });

        let s = ExecutionStrategy::for_operation(
            Operation::Transpose,
            Shape::new(63, 63),
            Shape::default(),
            &config,
        );
        assert_eq!(s, ExecutionStrategy::Sequential);
    }

    #[test]
    fn test_forced_modes() {
        let small = Workload { units: 3, triggered: false };
        let big = Workload { units: 500, triggered: true };

        let par = ParallelConfig::parallel().with_max_workers(16);
        assert_eq!(
            ExecutionStrategy::select(small, &par),
            ExecutionStrategy::Parallel { workers: 3 }
        );

        let seq = ParallelConfig::sequential();
        assert_eq!(ExecutionStrategy::select(big, &seq), ExecutionStrategy::Sequential);

        let empty = Workload { units: 0, triggered: true };
        assert_eq!(ExecutionStrategy::select(empty, &par), ExecutionStrategy::Sequential);
    }

    #[test]
    fn test_run_ranges_visits_each_range_once() {
        for executor in [Executor::Rayon, Executor::ScopedThreads] {
            let seen = Mutex::new(Vec::new());
            let calls = AtomicUsize::new(0);
            let work: Vec<_> = partition(17, 4).into_iter().map(|r| (r, ())).collect();

            run_ranges(executor, Operation::Add, work, |range, ()| {
                calls.fetch_add(1, Ordering::Relaxed);
                seen.lock().unwrap().push(range);
            });

            let mut seen = seen.into_inner().unwrap();
            seen.sort_by_key(|r| r.start);
            assert_eq!(seen, vec![0..4, 4..8, 8..12, 12..17]);
            assert_eq!(calls.into_inner(), 4);
        }
    }

    #[test]
    fn test_elementwise_paths_agree() {
        let lhs: Vec<f64> = (0..100).map(|i| f64::from(i) * 0.5).collect();
        let rhs: Vec<f64> = (0..100).map(|i| 3.0 - f64::from(i)).collect();

        let seq = elementwise(
            Operation::Add,
            &lhs,
            &rhs,
            ExecutionStrategy::Sequential,
            Executor::Rayon,
            kernels::add,
        );
        for executor in [Executor::Rayon, Executor::ScopedThreads] {
            for workers in 1..9 {
                let par = elementwise(
                    Operation::Add,
                    &lhs,
                    &rhs,
                    ExecutionStrategy::Parallel { workers },
                    executor,
                    kernels::add,
                );
                assert_eq!(seq, par);
            }
        }
    }

    #[test]
    fn test_transpose_paths_agree() {
        let (rows, cols) = (7, 5);
        let input: Vec<f64> = (0..35).map(f64::from).collect();
        let seq = transpose(&input, rows, cols, ExecutionStrategy::Sequential, Executor::Rayon);
        for i in 0..rows {
            for j in 0..cols {
                assert_eq!(seq[j * rows + i], input[i * cols + j]);
            }
        }
        for workers in 1..10 {
            let par = transpose(
                &input,
                rows,
                cols,
                ExecutionStrategy::Parallel { workers },
                Executor::ScopedThreads,
            );
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn test_matmul_paths_agree() {
        let lhs: Vec<f64> = (0..12).map(f64::from).collect(); // 3x4
        let rhs: Vec<f64> = (0..8).map(|i| f64::from(i) - 2.5).collect(); // 4x2
        let seq = matmul(&lhs, &rhs, 3, 4, 2, ExecutionStrategy::Sequential, Executor::Rayon);
        for workers in 1..5 {
            let par = matmul(&lhs, &rhs, 3, 4, 2, ExecutionStrategy::Parallel { workers }, Executor::Rayon);
            assert_eq!(seq, par);
        }
    }
}
