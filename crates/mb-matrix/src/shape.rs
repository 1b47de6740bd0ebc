use crate::error::{MatrixError, Result};
use std::fmt;

/// Dimensions of a dense 2D matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    /// Create a new shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Checks that `(row, col)` lies inside this shape.
    pub fn check_index(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(MatrixError::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Row-major offset of `(row, col)`, i.e. `row * cols + col`.
    pub fn offset(&self, row: usize, col: usize) -> Result<usize> {
        self.check_index(row, col)?;
        Ok(row * self.cols + col)
    }

    /// The shape with rows and columns swapped.
    pub fn transposed(&self) -> Shape {
        Shape::new(self.cols, self.rows)
    }

    /// Shape of `self @ rhs`.
    ///
    /// Fails unless `self.cols == rhs.rows`.
    pub fn matmul(&self, rhs: &Shape) -> Result<Shape> {
        if self.cols != rhs.rows {
            return Err(MatrixError::MatmulMismatch {
                m: self.rows,
                k: self.cols,
                k2: rhs.rows,
                n: rhs.cols,
            });
        }
        Ok(Shape::new(self.rows, rhs.cols))
    }

    /// Shape of `self @ rhs_t^T` where `rhs_t` already holds the transposed
    /// right operand.
    ///
    /// Fails unless `self.cols == rhs_t.cols`.
    pub fn matmul_transposed(&self, rhs_t: &Shape) -> Result<Shape> {
        self.matmul(&rhs_t.transposed())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}x{}]", self.rows, self.cols)
    }
}

impl From<(usize, usize)> for Shape {
    fn from((rows, cols): (usize, usize)) -> Self {
        Shape::new(rows, cols)
    }
}
