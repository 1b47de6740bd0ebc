use std::fmt;

use crate::dense::{self, DenseMatrix};
use crate::error::{MatrixError, Result};
use crate::flat::FlatMatrix;
use crate::shape::Shape;

/// A dense matrix stored as one independently allocated `Vec<f64>` per row.
///
/// Every row holds exactly `cols` values and there are exactly `rows` rows;
/// no public operation can break that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedMatrix {
    shape: Shape,
    data: Vec<Vec<f64>>,
}

impl NestedMatrix {
    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Create a matrix with every element set to `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        NestedMatrix {
            shape: Shape::new(rows, cols),
            data: vec![vec![value; cols]; rows],
        }
    }

    /// Create a matrix from explicit rows.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` unless `data` has `rows` rows of `cols`
    /// values each.
    pub fn from_rows(rows: usize, cols: usize, data: Vec<Vec<f64>>) -> Result<Self> {
        if data.len() != rows {
            return Err(MatrixError::DimensionMismatch {
                expected: format!("{} rows", rows),
                got: format!("{} rows", data.len()),
            });
        }
        if let Some((i, bad)) = data.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(MatrixError::DimensionMismatch {
                expected: format!("{} columns", cols),
                got: format!("{} columns in row {}", bad.len(), i),
            });
        }
        Ok(NestedMatrix {
            shape: Shape::new(rows, cols),
            data,
        })
    }

    /// Mutable reference to element `(i, j)`.
    pub fn get_mut(&mut self, i: usize, j: usize) -> Result<&mut f64> {
        self.shape.check_index(i, j)?;
        Ok(&mut self.data[i][j])
    }

    /// Overwrite element `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        *self.get_mut(i, j)? = value;
        Ok(())
    }

    /// Mutable access to row `i`.
    pub fn row_mut(&mut self, i: usize) -> Result<&mut [f64]> {
        if i >= self.shape.rows {
            return Err(MatrixError::IndexOutOfRange {
                row: i,
                col: 0,
                rows: self.shape.rows,
                cols: self.shape.cols,
            });
        }
        Ok(self.data[i].as_mut_slice())
    }

    /// All rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.iter().map(Vec::as_slice)
    }

    /// All rows in order, mutably. Row lengths stay fixed.
    pub fn iter_rows_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.data.iter_mut().map(Vec::as_mut_slice)
    }

    /// Consume the matrix, returning its rows.
    pub fn into_rows(self) -> Vec<Vec<f64>> {
        self.data
    }

    /// Sequential reference product `a @ b`.
    ///
    /// # Errors
    /// Returns a dimension mismatch when `a.cols != b.rows`.
    pub fn multiply(a: &NestedMatrix, b: &NestedMatrix) -> Result<NestedMatrix> {
        let out = a.shape.matmul(&b.shape)?;
        let mut c = NestedMatrix::zeros(out.rows, out.cols);
        for (a_row, c_row) in a.data.iter().zip(c.data.iter_mut()) {
            for (j, cell) in c_row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for (p, &a_val) in a_row.iter().enumerate() {
                    sum += a_val * b.data[p][j];
                }
                *cell = sum;
            }
        }
        Ok(c)
    }
}

impl DenseMatrix for NestedMatrix {
    fn shape(&self) -> Shape {
        self.shape
    }

    fn row(&self, i: usize) -> Result<&[f64]> {
        self.data
            .get(i)
            .map(Vec::as_slice)
            .ok_or(MatrixError::IndexOutOfRange {
                row: i,
                col: 0,
                rows: self.shape.rows,
                cols: self.shape.cols,
            })
    }
}

impl From<&FlatMatrix> for NestedMatrix {
    fn from(flat: &FlatMatrix) -> Self {
        let shape = flat.shape();
        let data = if shape.cols == 0 {
            vec![Vec::new(); shape.rows]
        } else {
            flat.as_slice().chunks(shape.cols).map(<[f64]>::to_vec).collect()
        };
        NestedMatrix { shape, data }
    }
}

impl fmt::Display for NestedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dense::write_rows(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square3() -> NestedMatrix {
        NestedMatrix::from_rows(
            3,
            3,
            vec![
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_zeros_and_filled() {
        let z = NestedMatrix::zeros(2, 3);
        assert_eq!(z.shape(), Shape::new(2, 3));
        assert!(z.iter_rows().all(|r| r == [0.0; 3]));

        let f = NestedMatrix::filled(2, 2, 1.5);
        assert_eq!(f.get(1, 1).unwrap(), 1.5);
    }

    #[test]
    fn test_default_is_empty() {
        let m = NestedMatrix::default();
        assert_eq!(m.rows(), 0);
        assert_eq!(m.cols(), 0);
        assert!(m.get(0, 0).is_err());
    }

    #[test]
    fn test_from_rows_mismatch() {
        assert!(NestedMatrix::from_rows(2, 2, vec![vec![1.0, 2.0]]).is_err());
        let err = NestedMatrix::from_rows(2, 2, vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_bounds_checked_access() {
        let mut m = NestedMatrix::zeros(2, 2);
        m.set(1, 0, 4.0).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), 4.0);
        assert!(matches!(
            m.get(2, 0),
            Err(MatrixError::IndexOutOfRange { row: 2, .. })
        ));
        assert!(m.set(0, 2, 1.0).is_err());
        assert!(m.row(2).is_err());
        assert!(m.row_mut(2).is_err());
    }

    #[test]
    fn test_multiply_square() {
        let a = square3();
        let c = NestedMatrix::multiply(&a, &a).unwrap();
        assert_eq!(
            c.into_rows(),
            vec![
                vec![30.0, 36.0, 42.0],
                vec![66.0, 81.0, 96.0],
                vec![102.0, 126.0, 150.0],
            ]
        );
    }

    #[test]
    fn test_multiply_rectangular_shape() {
        let a = NestedMatrix::filled(2, 3, 1.0);
        let b = NestedMatrix::filled(3, 4, 2.0);
        let c = NestedMatrix::multiply(&a, &b).unwrap();
        assert_eq!(c.shape(), Shape::new(2, 4));
        assert_eq!(c.get(1, 3).unwrap(), 6.0);
    }

    #[test]
    fn test_multiply_mismatch() {
        let a = NestedMatrix::zeros(2, 3);
        let b = NestedMatrix::zeros(2, 3);
        let err = NestedMatrix::multiply(&a, &b).unwrap_err();
        assert!(err.is_dimension_mismatch());
    }

    #[test]
    fn test_clone_is_deep() {
        let a = square3();
        let mut b = a.clone();
        b.set(0, 0, 100.0).unwrap();
        assert_eq!(a.get(0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_from_flat() {
        let flat = FlatMatrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let nested = NestedMatrix::from(&flat);
        assert_eq!(nested.into_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_display() {
        let m = NestedMatrix::from_rows(1, 2, vec![vec![1.0, 25.5]]).unwrap();
        assert_eq!(m.to_string(), "         1       25.5 \n");
    }
}
