//! `mb-matrix` - Dense matrix storage for matbench.
//!
//! This crate provides:
//! - `NestedMatrix`, one heap allocation per row
//! - `FlatMatrix`, one contiguous row-major buffer with in-place transpose
//! - Sequential reference multiplies used as ground truth
//! - A text loader, a tolerance-based `Oracle` and a seeded input generator

pub mod dense;
pub mod error;
pub mod flat;
pub mod nested;
pub mod oracle;
pub mod random;
pub mod shape;
pub mod text;

// Re-export primary types at the crate root for convenience.
pub use dense::DenseMatrix;
pub use error::{MatrixError, Result};
pub use flat::FlatMatrix;
pub use nested::NestedMatrix;
pub use oracle::{approx_eq, Oracle, DEFAULT_EPSILON};
pub use random::{generate_pair, GeneratorConfig};
pub use shape::Shape;
