use std::fmt::Debug;

use mb_matrix::{DenseMatrix, FlatMatrix, NestedMatrix};

use crate::error::Result;

/// Trait for pluggable multiplication strategies (threads, reduction,
/// accelerator).
///
/// Every method computes `C = A @ B` and must agree with the sequential
/// reference multiply within `mb_matrix::DEFAULT_EPSILON`. Inputs are
/// borrowed read-only; the returned matrix is freshly allocated. Calls block
/// until the whole product is complete.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "atomic", "openmp", "cuda").
    fn name(&self) -> &str;

    /// Product of two row-of-rows matrices.
    ///
    /// # Errors
    /// Fails with a dimension mismatch when `a.cols != b.rows`, before any
    /// work is started.
    fn multiply(&self, a: &NestedMatrix, b: &NestedMatrix) -> Result<NestedMatrix>;

    /// Product of two flat matrices.
    ///
    /// # Errors
    /// Fails with a dimension mismatch when `a.cols != b.rows`.
    fn multiply_flat(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix>;

    /// Product `a @ b` where `b_t` is the already transposed right operand.
    ///
    /// # Errors
    /// Fails with a dimension mismatch when `a.cols != b_t.cols`.
    fn multiply_flat_pretransposed(&self, a: &FlatMatrix, b_t: &FlatMatrix)
        -> Result<FlatMatrix>;

    /// Product `a @ b` computed against a private transposed copy of `b`.
    ///
    /// The copy is rebuilt on every call.
    fn multiply_flat_transposed(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        a.shape().matmul(&b.shape())?;
        let b_t = b.transposed();
        self.multiply_flat_pretransposed(a, &b_t)
    }
}
