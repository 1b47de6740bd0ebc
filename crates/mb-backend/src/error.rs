use mb_matrix::MatrixError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("worker thread panicked")]
    WorkerPanicked,
    #[error("device error: {0}")]
    Device(String),
    #[error("unknown mode: {0}")]
    UnknownMode(String),
}

impl BackendError {
    /// True when the operands had incompatible shapes.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, BackendError::Matrix(e) if e.is_dimension_mismatch())
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
