use std::fmt;

use crate::dense::{self, DenseMatrix};
use crate::error::{MatrixError, Result};
use crate::nested::NestedMatrix;
use crate::shape::Shape;

/// A dense matrix stored in one contiguous row-major buffer.
///
/// Element `(i, j)` lives at offset `i * cols + j` and the buffer always
/// holds exactly `rows * cols` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMatrix {
    shape: Shape,
    data: Vec<f64>,
}

impl FlatMatrix {
    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        FlatMatrix {
            shape: Shape::new(rows, cols),
            data: vec![value; rows * cols],
        }
    }

    /// Create a matrix from row-major data.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        if data.len() != shape.numel() {
            return Err(MatrixError::DimensionMismatch {
                expected: format!("{} elements for {}", shape.numel(), shape),
                got: format!("{} elements", data.len()),
            });
        }
        Ok(FlatMatrix { shape, data })
    }

    /// Mutable reference to element `(i, j)`.
    pub fn get_mut(&mut self, i: usize, j: usize) -> Result<&mut f64> {
        let offset = self.shape.offset(i, j)?;
        Ok(&mut self.data[offset])
    }

    /// Overwrite element `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        *self.get_mut(i, j)? = value;
        Ok(())
    }

    /// The whole row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The whole row-major buffer, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the matrix, returning its row-major buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Transpose in place.
    ///
    /// Swaps `rows` and `cols` and moves the element at `i * cols + j` to
    /// `j * rows + i`. Applying it twice restores the original matrix.
    pub fn transpose(&mut self) {
        let Shape { rows, cols } = self.shape;
        let mut moved = vec![0.0; self.data.len()];
        for i in 0..rows {
            for j in 0..cols {
                moved[j * rows + i] = self.data[i * cols + j];
            }
        }
        self.shape = self.shape.transposed();
        self.data = moved;
    }

    /// A transposed copy, leaving `self` untouched.
    pub fn transposed(&self) -> FlatMatrix {
        let mut t = self.clone();
        t.transpose();
        t
    }

    /// Sequential reference product `a @ b`.
    ///
    /// # Errors
    /// Returns a dimension mismatch when `a.cols != b.rows`.
    pub fn multiply(a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape.matmul(&b.shape)?;
        let (m, k, n) = (a.shape.rows, a.shape.cols, b.shape.cols);
        let mut c = FlatMatrix::zeros(out.rows, out.cols);
        for i in 0..m {
            for j in 0..n {
                let mut sum = 0.0;
                for p in 0..k {
                    sum += a.data[i * k + p] * b.data[p * n + j];
                }
                c.data[i * n + j] = sum;
            }
        }
        Ok(c)
    }

    /// Sequential reference product `a @ b` given `b_t`, the already
    /// transposed right operand.
    ///
    /// Each output cell is the dot product of a row of `a` and a row of
    /// `b_t`.
    ///
    /// # Errors
    /// Returns a dimension mismatch when `a.cols != b_t.cols`.
    pub fn multiply_transposed(a: &FlatMatrix, b_t: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape.matmul_transposed(&b_t.shape)?;
        let k = a.shape.cols;
        let mut c = FlatMatrix::zeros(out.rows, out.cols);
        for i in 0..out.rows {
            let a_row = &a.data[i * k..(i + 1) * k];
            for j in 0..out.cols {
                let b_row = &b_t.data[j * k..(j + 1) * k];
                c.data[i * out.cols + j] = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
            }
        }
        Ok(c)
    }
}

impl DenseMatrix for FlatMatrix {
    fn shape(&self) -> Shape {
        self.shape
    }

    fn row(&self, i: usize) -> Result<&[f64]> {
        if i >= self.shape.rows {
            return Err(MatrixError::IndexOutOfRange {
                row: i,
                col: 0,
                rows: self.shape.rows,
                cols: self.shape.cols,
            });
        }
        let cols = self.shape.cols;
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    fn get(&self, i: usize, j: usize) -> Result<f64> {
        Ok(self.data[self.shape.offset(i, j)?])
    }
}

impl From<&NestedMatrix> for FlatMatrix {
    fn from(nested: &NestedMatrix) -> Self {
        let shape = nested.shape();
        let mut data = Vec::with_capacity(shape.numel());
        for row in nested.iter_rows() {
            data.extend_from_slice(row);
        }
        FlatMatrix { shape, data }
    }
}

impl fmt::Display for FlatMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dense::write_rows(self, f)
    }
}
