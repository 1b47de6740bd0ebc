//! Explicit worker threads pulling rows from an atomic counter.
//!
//! A fixed set of scoped threads share one `AtomicUsize`. Each worker
//! `fetch_add`s the next row index, computes that whole output row, and
//! exits once the index passes the row count. Output rows are disjoint, so
//! the counter is the only synchronized state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use mb_matrix::{DenseMatrix, FlatMatrix, NestedMatrix};
use tracing::{debug, trace};

use crate::backend::ComputeBackend;
use crate::config::ThreadConfig;
use crate::error::{BackendError, Result};
use crate::rows::DisjointRows;

/// Thread pool with atomic row claiming.
#[derive(Debug, Clone)]
pub struct ThreadAtomicBackend {
    config: ThreadConfig,
}

impl ThreadAtomicBackend {
    pub fn new(config: ThreadConfig) -> Self {
        ThreadAtomicBackend { config }
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    /// Runs `compute(i, row)` exactly once for every output row and joins
    /// all workers before returning.
    fn run_rows<F>(&self, mut rows: Vec<&mut [f64]>, compute: F) -> Result<()>
    where
        F: Fn(usize, &mut [f64]) + Sync,
    {
        let next = AtomicUsize::new(0);
        let sink = DisjointRows::new(&mut rows);
        let total = sink.len();
        let workers = self.config.num_threads;
        let (next, sink, compute) = (&next, &sink, &compute);

        let joined: Vec<thread::Result<usize>> = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(move || {
                        let mut claimed = 0usize;
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            if i >= total {
                                break;
                            }
                            // SAFETY: `fetch_add` hands out every index once.
                            let row = unsafe { sink.claim(i) };
                            compute(i, &mut **row);
                            claimed += 1;
                        }
                        claimed
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect()
        });

        for (worker, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok(claimed) => trace!(worker, claimed, "worker exited"),
                Err(_) => return Err(BackendError::WorkerPanicked),
            }
        }
        Ok(())
    }
}

impl Default for ThreadAtomicBackend {
    fn default() -> Self {
        Self::new(ThreadConfig::default())
    }
}

impl ComputeBackend for ThreadAtomicBackend {
    fn name(&self) -> &str {
        "atomic"
    }

    fn multiply(&self, a: &NestedMatrix, b: &NestedMatrix) -> Result<NestedMatrix> {
        let out = a.shape().matmul(&b.shape())?;
        debug!(
            a = %a.shape(),
            b = %b.shape(),
            workers = self.config.num_threads,
            "atomic multiply (nested)"
        );

        let mut c = NestedMatrix::zeros(out.rows, out.cols);
        if out.is_empty() {
            return Ok(c);
        }
        let a_rows: Vec<&[f64]> = a.iter_rows().collect();
        let b_rows: Vec<&[f64]> = b.iter_rows().collect();

        self.run_rows(c.iter_rows_mut().collect(), |i, c_row| {
            for (j, cell) in c_row.iter_mut().enumerate() {
                for (p, &x) in a_rows[i].iter().enumerate() {
                    *cell += x * b_rows[p][j];
                }
            }
        })?;
        Ok(c)
    }

    fn multiply_flat(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape().matmul(&b.shape())?;
        debug!(
            a = %a.shape(),
            b = %b.shape(),
            workers = self.config.num_threads,
            "atomic multiply (flat)"
        );

        let mut c = FlatMatrix::zeros(out.rows, out.cols);
        if out.is_empty() {
            return Ok(c);
        }
        let (k, n) = (a.cols(), out.cols);
        let (a_data, b_data) = (a.as_slice(), b.as_slice());

        self.run_rows(c.as_mut_slice().chunks_mut(n).collect(), |i, c_row| {
            for (j, cell) in c_row.iter_mut().enumerate() {
                for p in 0..k {
                    *cell += a_data[i * k + p] * b_data[p * n + j];
                }
            }
        })?;
        Ok(c)
    }

    fn multiply_flat_pretransposed(&self, a: &FlatMatrix, b_t: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape().matmul_transposed(&b_t.shape())?;
        debug!(
            a = %a.shape(),
            b_t = %b_t.shape(),
            workers = self.config.num_threads,
            "atomic multiply (flat, transposed B)"
        );

        let mut c = FlatMatrix::zeros(out.rows, out.cols);
        if out.is_empty() {
            return Ok(c);
        }
        let (k, n) = (a.cols(), out.cols);
        let (a_data, bt_data) = (a.as_slice(), b_t.as_slice());

        self.run_rows(c.as_mut_slice().chunks_mut(n).collect(), |i, c_row| {
            let a_row = &a_data[i * k..(i + 1) * k];
            for (j, cell) in c_row.iter_mut().enumerate() {
                let bt_row = &bt_data[j * k..(j + 1) * k];
                for (x, y) in a_row.iter().zip(bt_row) {
                    *cell += x * y;
                }
            }
        })?;
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn backend(threads: usize) -> ThreadAtomicBackend {
        ThreadAtomicBackend::new(ThreadConfig::with_threads(threads))
    }

    fn square3() -> FlatMatrix {
        FlatMatrix::from_vec(3, 3, (1..=9).map(f64::from).collect()).unwrap()
    }

    const SQUARE3_PRODUCT: [f64; 9] = [30.0, 36.0, 42.0, 66.0, 81.0, 96.0, 102.0, 126.0, 150.0];

    #[test]
    fn test_square_flat() {
        let a = square3();
        let c = backend(4).multiply_flat(&a, &a).unwrap();
        assert_eq!(c.as_slice(), &SQUARE3_PRODUCT);
    }

    #[test]
    fn test_square_nested() {
        let a = NestedMatrix::from(&square3());
        let c = backend(2).multiply(&a, &a).unwrap();
        assert_eq!(FlatMatrix::from(&c).as_slice(), &SQUARE3_PRODUCT);
    }

    #[test]
    fn test_square_transposed() {
        let a = square3();
        let c = backend(3).multiply_flat_transposed(&a, &a).unwrap();
        assert_eq!(c.as_slice(), &SQUARE3_PRODUCT);
        let c = backend(3).multiply_flat_pretransposed(&a, &a.transposed()).unwrap();
        assert_eq!(c.as_slice(), &SQUARE3_PRODUCT);
    }

    #[test]
    fn test_one_by_one() {
        let a = FlatMatrix::filled(1, 1, 5.0);
        let c = backend(8).multiply_flat(&a, &a).unwrap();
        assert_eq!(c.as_slice(), &[25.0]);
    }

    #[test]
    fn test_more_workers_than_rows() {
        let a = FlatMatrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = FlatMatrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
        let c = backend(32).multiply_flat(&a, &b).unwrap();
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matches_reference_rectangular() {
        let a = FlatMatrix::from_vec(5, 7, (0..35).map(|v| (v % 11) as f64 * 0.5).collect()).unwrap();
        let b = FlatMatrix::from_vec(7, 3, (0..21).map(|v| (v % 5) as f64 - 2.0).collect()).unwrap();
        let expected = FlatMatrix::multiply(&a, &b).unwrap();
        for threads in [1, 2, 5] {
            let got = backend(threads).multiply_flat_transposed(&a, &b).unwrap();
            for (x, y) in expected.as_slice().iter().zip(got.as_slice()) {
                assert_abs_diff_eq!(*x, *y, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = FlatMatrix::zeros(2, 3);
        let err = backend(2).multiply_flat(&a, &a).unwrap_err();
        assert!(err.is_dimension_mismatch());
        let err = backend(2).multiply_flat_transposed(&a, &a).unwrap_err();
        assert!(err.is_dimension_mismatch());
        let nested = NestedMatrix::zeros(2, 3);
        assert!(backend(2).multiply(&nested, &nested).is_err());
    }

    #[test]
    fn test_empty_output() {
        let a = FlatMatrix::zeros(0, 3);
        let b = FlatMatrix::zeros(3, 4);
        let c = backend(2).multiply_flat(&a, &b).unwrap();
        assert_eq!(c.shape().rows, 0);
        assert_eq!(c.shape().cols, 4);
    }
}
