use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },
    #[error("matmul dimension mismatch: [{m}x{k}] @ [{k2}x{n}]")]
    MatmulMismatch {
        m: usize,
        k: usize,
        k2: usize,
        n: usize,
    },
    #[error("index ({row}, {col}) out of range for [{rows}x{cols}] matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: line {line} has {got} values, expected {expected}", .path.display())]
    RaggedRows {
        path: PathBuf,
        line: usize,
        expected: usize,
        got: usize,
    },
    #[error("{}: line {line}: invalid number {token:?}", .path.display())]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        token: String,
    },
    #[error("{}: no numeric rows found", .path.display())]
    Empty { path: PathBuf },
    #[error("invalid value range [{low}, {high})")]
    InvalidRange { low: f64, high: f64 },
}

impl MatrixError {
    /// True for every variant that originates from loading a matrix file.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            MatrixError::Io { .. }
                | MatrixError::RaggedRows { .. }
                | MatrixError::InvalidNumber { .. }
                | MatrixError::Empty { .. }
        )
    }

    /// True for both construction-time and multiply-time shape errors.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            MatrixError::DimensionMismatch { .. } | MatrixError::MatmulMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MatrixError>;
