//! Property-based tests for matrix arithmetic and partitioning.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::config::{Executor, ParallelConfig};
    use crate::dense_matrix::Matrix;
    use crate::partition::partition;

    const TOL: f64 = 1e-9;

    // Strategy for generating a matrix of the given shape
    fn matrix(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
        prop::collection::vec(-100.0f64..100.0, rows * cols)
            .prop_map(move |values| Matrix::from_vec(rows, cols, values).unwrap())
    }

    // Strategy for generating a matrix of arbitrary small shape
    fn any_matrix() -> impl Strategy<Value = Matrix> {
        (1usize..12, 1usize..12).prop_flat_map(|(r, c)| matrix(r, c))
    }

    // Three matrices sharing one shape
    fn same_shape_triple() -> impl Strategy<Value = (Matrix, Matrix, Matrix)> {
        (1usize..10, 1usize..10).prop_flat_map(|(r, c)| (matrix(r, c), matrix(r, c), matrix(r, c)))
    }

    // A, B, C with A*B*C defined
    fn chain() -> impl Strategy<Value = (Matrix, Matrix, Matrix)> {
        (1usize..8, 1usize..8, 1usize..8, 1usize..8)
            .prop_flat_map(|(m, n, p, q)| (matrix(m, n), matrix(n, p), matrix(p, q)))
    }

    fn forced_parallel() -> impl Strategy<Value = ParallelConfig> {
        (1usize..9, prop_oneof![Just(Executor::Rayon), Just(Executor::ScopedThreads)])
            .prop_map(|(workers, executor)| {
                ParallelConfig::parallel()
                    .with_max_workers(workers)
                    .with_executor(executor)
            })
    }

    proptest! {
        #[test]
        fn transpose_involution(a in any_matrix()) {
            prop_assert_eq!(a.transpose().transpose(), a);
        }

        #[test]
        fn add_associative((a, b, c) in same_shape_triple()) {
            let left = a.add(&b).unwrap().add(&c).unwrap();
            let right = a.add(&b.add(&c).unwrap()).unwrap();
            prop_assert!(left.approx_eq(&right, TOL));
        }

        #[test]
        fn add_then_subtract((a, b, _c) in same_shape_triple()) {
            let back = a.add(&b).unwrap().subtract(&b).unwrap();
            prop_assert!(back.approx_eq(&a, TOL));
        }

        #[test]
        fn multiply_associative((a, b, c) in chain()) {
            let left = a.multiply(&b).unwrap().multiply(&c).unwrap();
            let right = a.multiply(&b.multiply(&c).unwrap()).unwrap();
            prop_assert!(left.approx_eq(&right, 1e-6));
        }

        #[test]
        fn transpose_of_product((a, b, _c) in chain()) {
            let left = a.multiply(&b).unwrap().transpose();
            let right = b.transpose().multiply(&a.transpose()).unwrap();
            prop_assert!(left.approx_eq(&right, TOL));
        }

        #[test]
        fn sequential_matches_parallel(
            (a, b, c) in chain(),
            config in forced_parallel(),
        ) {
            let seq = ParallelConfig::sequential();
            prop_assert_eq!(a.add_with(&a, &config).unwrap(), a.add_with(&a, &seq).unwrap());
            prop_assert_eq!(
                b.subtract_with(&b, &config).unwrap(),
                b.subtract_with(&b, &seq).unwrap()
            );
            prop_assert_eq!(b.multiply_with(&c, &config).unwrap(), b.multiply_with(&c, &seq).unwrap());
            prop_assert_eq!(c.transpose_with(&config), c.transpose_with(&seq));
        }

        #[test]
        fn partition_covers_exactly_once(total in 0usize..500, workers in 0usize..64) {
            let ranges = partition(total, workers);
            prop_assert!(ranges.len() <= workers.max(1));

            let mut next = 0;
            for range in &ranges {
                prop_assert_eq!(range.start, next);
                prop_assert!(range.end > range.start);
                next = range.end;
            }
            prop_assert_eq!(next, total);
        }
    }
}
