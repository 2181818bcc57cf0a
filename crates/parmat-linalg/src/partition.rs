//! Work partitioning.
//!
//! A workload of `total` units (flat elements or rows) is divided into
//! contiguous, non-overlapping ranges, one per worker. The last range
//! absorbs the remainder of the integer division, so the ranges always
//! cover `[0, total)` exactly once. Empty ranges are dropped, which means
//! fewer ranges than requested workers may come back.
//!
//! The `split_*` helpers turn one exclusively borrowed output buffer into
//! the matching disjoint mutable views, so each worker can only ever write
//! its own slots.

use std::mem;
use std::ops::Range;

/// Number of workers for `units` units of work under a ceiling.
///
/// Never zero, never more than `units` (unless `units` is zero).
#[must_use]
pub fn worker_count(ceiling: usize, units: usize) -> usize {
    ceiling.max(1).min(units.max(1))
}

/// Splits `[0, total)` into at most `workers` contiguous ranges.
///
/// Range `w` starts at `w * (total / workers)`; the last one ends at
/// `total`. A range whose start is at or past `total`, or that would be
/// empty, is skipped.
#[must_use]
pub fn partition(total: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let chunk = total / workers;

    let mut ranges = Vec::with_capacity(workers);
    for w in 0..workers {
        let start = w * chunk;
        if start >= total {
            continue;
        }
        let end = if w + 1 == workers { total } else { start + chunk };
        if start < end {
            ranges.push(start..end);
        }
    }
    ranges
}

/// Splits `out` into one sub-slice per range, scaled by `stride`.
///
/// Unit range `r` maps to `out[r.start * stride..r.end * stride]`. Ranges
/// must be sorted, contiguous from zero and cover `out.len() / stride` units,
/// as produced by [`partition`].
pub fn split_contiguous<'a>(
    mut out: &'a mut [f64],
    ranges: &[Range<usize>],
    stride: usize,
) -> Vec<&'a mut [f64]> {
    let mut views = Vec::with_capacity(ranges.len());
    let mut consumed = 0;
    for range in ranges {
        debug_assert_eq!(range.start, consumed, "ranges must be contiguous");
        let (head, tail) = mem::take(&mut out).split_at_mut((range.end - range.start) * stride);
        views.push(head);
        out = tail;
        consumed = range.end;
    }
    debug_assert!(out.is_empty(), "ranges must cover the whole buffer");
    views
}

/// Splits a row-major buffer into column bands.
///
/// `out` has rows of length `row_len`. For each column range, the returned
/// entry holds that range's segment of every row, in row order. Ranges
/// must be sorted, contiguous from zero and cover `row_len` columns.
pub fn split_column_bands<'a>(
    out: &'a mut [f64],
    row_len: usize,
    ranges: &[Range<usize>],
) -> Vec<Vec<&'a mut [f64]>> {
    if row_len == 0 {
        return ranges.iter().map(|_| Vec::new()).collect();
    }

    let n_rows = out.len() / row_len;
    let mut bands: Vec<Vec<&'a mut [f64]>> = ranges
        .iter()
        .map(|_| Vec::with_capacity(n_rows))
        .collect();

    for row in out.chunks_mut(row_len) {
        let mut rest = row;
        for (band, range) in bands.iter_mut().zip(ranges) {
            let (segment, tail) = mem::take(&mut rest).split_at_mut(range.end - range.start);
            band.push(segment);
            rest = tail;
        }
        debug_assert!(rest.is_empty(), "ranges must cover every column");
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(ranges: &[Range<usize>], total: usize) {
        let mut hits = vec![0u32; total];
        for range in ranges {
            assert!(range.start < range.end, "empty range {range:?}");
            for i in range.clone() {
                hits[i] += 1;
            }
        }
        assert!(hits.iter().all(|&h| h == 1), "coverage {hits:?}");
    }

    #[test]
    fn test_even_split() {
        assert_eq!(partition(8, 4), vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn test_remainder_goes_to_last() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
    }

    #[test]
    fn test_more_workers_than_units() {
        // chunk is zero, so only the last worker gets anything
        assert_eq!(partition(3, 8), vec![0..3]);
        assert_covers(&partition(3, 8), 3);
    }

    #[test]
    fn test_empty_workload() {
        assert!(partition(0, 4).is_empty());
        assert!(partition(0, 0).is_empty());
    }

    #[test]
    fn test_zero_workers_treated_as_one() {
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn test_coverage_grid() {
        for total in 0..40 {
            for workers in 0..12 {
                assert_covers(&partition(total, workers), total);
            }
        }
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(worker_count(8, 100), 8);
        assert_eq!(worker_count(8, 3), 3);
        assert_eq!(worker_count(0, 3), 1);
        assert_eq!(worker_count(8, 0), 1);
    }

    #[test]
    fn test_split_contiguous() {
        let mut buf: Vec<f64> = (0..12).map(f64::from).collect();
        let ranges = partition(4, 3);
        let views = split_contiguous(&mut buf, &ranges, 3);
        assert_eq!(views.len(), 3);
        assert_eq!(views[0], &[0.0, 1.0, 2.0]);
        assert_eq!(views[1], &[3.0, 4.0, 5.0]);
        assert_eq!(views[2], &[6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
    }

    #[test]
    fn test_split_column_bands() {
        // 2 rows of 5 columns
        let mut buf: Vec<f64> = (0..10).map(f64::from).collect();
        let ranges = partition(5, 2);
        let mut bands = split_column_bands(&mut buf, 5, &ranges);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].len(), 2);
        assert_eq!(bands[0][0], &[0.0, 1.0]);
        assert_eq!(bands[0][1], &[5.0, 6.0]);
        assert_eq!(bands[1][0], &[2.0, 3.0, 4.0]);
        assert_eq!(bands[1][1], &[7.0, 8.0, 9.0]);

        bands[1][1][0] = -1.0;
        drop(bands);
        assert_eq!(buf[7], -1.0);
    }
}
