//! Nested data-parallel multiply: a parallel loop over output rows, and a
//! parallel sum reduction for every output cell.
//!
//! Both levels run on one dedicated rayon pool. Partial sums of a cell are
//! combined by rayon's reduction tree, so the summation order differs from
//! the sequential reference and results agree only within tolerance.

use std::sync::Arc;

use mb_matrix::{DenseMatrix, FlatMatrix, NestedMatrix};
use rayon::prelude::*;
use tracing::debug;

use crate::backend::ComputeBackend;
use crate::config::ThreadConfig;
use crate::error::Result;

/// Data-parallel backend with an inner parallel reduction.
#[derive(Debug, Clone)]
pub struct ReductionBackend {
    pool: Arc<rayon::ThreadPool>,
    config: ThreadConfig,
}

impl ReductionBackend {
    /// Build a backend with its own rayon pool of `config.num_threads`
    /// workers.
    pub fn new(config: ThreadConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|idx| format!("mb-reduce-{idx}"))
            .build()?;
        Ok(ReductionBackend {
            pool: Arc::new(pool),
            config,
        })
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }
}

impl ComputeBackend for ReductionBackend {
    fn name(&self) -> &str {
        "openmp"
    }

    fn multiply(&self, a: &NestedMatrix, b: &NestedMatrix) -> Result<NestedMatrix> {
        let out = a.shape().matmul(&b.shape())?;
        debug!(
            a = %a.shape(),
            b = %b.shape(),
            workers = self.pool.current_num_threads(),
            "reduction multiply (nested)"
        );

        let mut c = NestedMatrix::zeros(out.rows, out.cols);
        if out.is_empty() {
            return Ok(c);
        }
        let a_rows: Vec<&[f64]> = a.iter_rows().collect();
        let b_rows: Vec<&[f64]> = b.iter_rows().collect();
        let c_rows: Vec<&mut [f64]> = c.iter_rows_mut().collect();

        self.pool.install(|| {
            c_rows.into_par_iter().enumerate().for_each(|(i, c_row)| {
                let a_row = a_rows[i];
                for (j, cell) in c_row.iter_mut().enumerate() {
                    *cell = a_row
                        .par_iter()
                        .enumerate()
                        .map(|(p, &x)| x * b_rows[p][j])
                        .sum::<f64>();
                }
            });
        });
        Ok(c)
    }

    fn multiply_flat(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape().matmul(&b.shape())?;
        debug!(
            a = %a.shape(),
            b = %b.shape(),
            workers = self.pool.current_num_threads(),
            "reduction multiply (flat)"
        );

        let mut c = FlatMatrix::zeros(out.rows, out.cols);
        if out.is_empty() {
            return Ok(c);
        }
        let (k, n) = (a.cols(), out.cols);
        let (a_data, b_data) = (a.as_slice(), b.as_slice());

        self.pool.install(|| {
            c.as_mut_slice()
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, c_row)| {
                    for (j, cell) in c_row.iter_mut().enumerate() {
                        *cell = (0..k)
                            .into_par_iter()
                            .map(|p| a_data[i * k + p] * b_data[p * n + j])
                            .sum::<f64>();
                    }
                });
        });
        Ok(c)
    }

    fn multiply_flat_pretransposed(&self, a: &FlatMatrix, b_t: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape().matmul_transposed(&b_t.shape())?;
        debug!(
            a = %a.shape(),
            b_t = %b_t.shape(),
            workers = self.pool.current_num_threads(),
            "reduction multiply (flat, transposed B)"
        );

        let mut c = FlatMatrix::zeros(out.rows, out.cols);
        if out.is_empty() {
            return Ok(c);
        }
        let (k, n) = (a.cols(), out.cols);
        let (a_data, bt_data) = (a.as_slice(), b_t.as_slice());

        self.pool.install(|| {
            c.as_mut_slice()
                .par_chunks_mut(n)
                .enumerate()
                .for_each(|(i, c_row)| {
                    let a_row = &a_data[i * k..(i + 1) * k];
                    for (j, cell) in c_row.iter_mut().enumerate() {
                        let bt_row = &bt_data[j * k..(j + 1) * k];
                        *cell = a_row
                            .par_iter()
                            .zip(bt_row.par_iter())
                            .map(|(x, y)| x * y)
                            .sum::<f64>();
                    }
                });
        });
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use mb_matrix::DEFAULT_EPSILON;

    fn backend(threads: usize) -> ReductionBackend {
        ReductionBackend::new(ThreadConfig::with_threads(threads)).unwrap()
    }

    fn square3() -> FlatMatrix {
        FlatMatrix::from_vec(3, 3, (1..=9).map(f64::from).collect()).unwrap()
    }

    fn assert_close(expected: &[f64], got: &[f64]) {
        assert_eq!(expected.len(), got.len());
        for (x, y) in expected.iter().zip(got) {
            assert_abs_diff_eq!(*x, *y, epsilon = DEFAULT_EPSILON);
        }
    }

    const SQUARE3_PRODUCT: [f64; 9] = [30.0, 36.0, 42.0, 66.0, 81.0, 96.0, 102.0, 126.0, 150.0];

    #[test]
    fn test_name() {
        assert_eq!(backend(1).name(), "openmp");
    }

    #[test]
    fn test_square_all_variants() {
        let b = backend(4);
        let a = square3();
        assert_close(&SQUARE3_PRODUCT, b.multiply_flat(&a, &a).unwrap().as_slice());
        assert_close(&SQUARE3_PRODUCT, b.multiply_flat_transposed(&a, &a).unwrap().as_slice());

        let nested = NestedMatrix::from(&a);
        let c = b.multiply(&nested, &nested).unwrap();
        assert_close(&SQUARE3_PRODUCT, FlatMatrix::from(&c).as_slice());
    }

    #[test]
    fn test_one_by_one() {
        let a = FlatMatrix::filled(1, 1, 5.0);
        assert_eq!(backend(2).multiply_flat(&a, &a).unwrap().as_slice(), &[25.0]);
    }

    #[test]
    fn test_matches_reference_large_inner_dimension() {
        // Long dot products make rayon actually split the inner reduction.
        let k = 4096;
        let a = FlatMatrix::from_vec(3, k, (0..3 * k).map(|v| ((v % 13) as f64) * 0.25).collect())
            .unwrap();
        let b = FlatMatrix::from_vec(k, 2, (0..2 * k).map(|v| ((v % 7) as f64) - 3.0).collect())
            .unwrap();
        let expected = FlatMatrix::multiply(&a, &b).unwrap();
        let b4 = backend(4);
        assert_close(expected.as_slice(), b4.multiply_flat(&a, &b).unwrap().as_slice());
        assert_close(expected.as_slice(), b4.multiply_flat_transposed(&a, &b).unwrap().as_slice());
    }

    #[test]
    fn test_transposed_does_not_touch_input() {
        let a = square3();
        let b = FlatMatrix::from_vec(3, 2, vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        let before = b.clone();
        backend(2).multiply_flat_transposed(&a, &b).unwrap();
        assert_eq!(b, before);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = FlatMatrix::zeros(3, 2);
        let b = FlatMatrix::zeros(3, 2);
        assert!(backend(2).multiply_flat(&a, &b).unwrap_err().is_dimension_mismatch());
        assert!(backend(2)
            .multiply_flat_pretransposed(&a, &FlatMatrix::zeros(2, 3))
            .unwrap_err()
            .is_dimension_mismatch());
    }
}
