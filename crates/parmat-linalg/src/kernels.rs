//! Range workers shared by the sequential and parallel paths.
//!
//! A kernel only sees its own slice of the output. The sequential path
//! calls it once with the whole range.

use std::ops::Range;

/// Signature of an element-wise kernel: `out[i] = op(lhs[i], rhs[i])`.
pub type ElementwiseKernel = fn(&[f64], &[f64], &mut [f64]);

/// `out[i] = lhs[i] + rhs[i]`.
pub fn add(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
    for ((o, a), b) in out.iter_mut().zip(lhs).zip(rhs) {
        *o = a + b;
    }
}

/// `out[i] = lhs[i] - rhs[i]`.
pub fn sub(lhs: &[f64], rhs: &[f64], out: &mut [f64]) {
    for ((o, a), b) in out.iter_mut().zip(lhs).zip(rhs) {
        *o = a - b;
    }
}

/// Computes output rows `rows` of `lhs * rhs` into `out`.
///
/// `lhs` is `? x inner`, `rhs` is `inner x rhs_cols`, and `out` holds
/// exactly `rows.len()` rows of `rhs_cols` values. Each cell is accumulated
/// from `0.0` in increasing `k`, iterating `i`, then `j`, then `k`.
pub fn matmul_rows(
    lhs: &[f64],
    rhs: &[f64],
    inner: usize,
    rhs_cols: usize,
    rows: Range<usize>,
    out: &mut [f64],
) {
    debug_assert_eq!(out.len(), rows.len() * rhs_cols);
    for (local, i) in rows.enumerate() {
        let lhs_row = &lhs[i * inner..(i + 1) * inner];
        let out_row = &mut out[local * rhs_cols..(local + 1) * rhs_cols];
        for (j, cell) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (k, a) in lhs_row.iter().enumerate() {
                sum += a * rhs[k * rhs_cols + j];
            }
            *cell = sum;
        }
    }
}

/// Transposes input rows `rows` of a `? x cols` matrix.
///
/// `band[j]` is the slice of output row `j` covering the output columns
/// `rows`, so `band` has `cols` entries of `rows.len()` values each.
pub fn transpose_rows(input: &[f64], cols: usize, rows: Range<usize>, band: &mut [&mut [f64]]) {
    debug_assert_eq!(band.len(), cols);
    for (local, i) in rows.enumerate() {
        let in_row = &input[i * cols..(i + 1) * cols];
        for (segment, &value) in band.iter_mut().zip(in_row) {
            segment[local] = value;
        }
    }
}
