use std::path::Path;

use tracing::{debug, info};

use crate::dense::DenseMatrix;
use crate::error::Result;
use crate::nested::NestedMatrix;

/// Element-wise tolerance used when comparing against a reference product.
pub const DEFAULT_EPSILON: f64 = 1e-4;

/// Returns true if `a` and `b` have identical shapes and every pair of
/// corresponding elements differs by at most `epsilon`.
///
/// The two sides may use different storage layouts.
pub fn approx_eq<A, B>(a: &A, b: &B, epsilon: f64) -> bool
where
    A: DenseMatrix + ?Sized,
    B: DenseMatrix + ?Sized,
{
    if a.shape() != b.shape() {
        return false;
    }
    (0..a.rows()).all(|i| match (a.row(i), b.row(i)) {
        (Ok(ra), Ok(rb)) => ra.iter().zip(rb).all(|(x, y)| (x - y).abs() <= epsilon),
        _ => false,
    })
}

/// A trusted input/product pair that candidate products are checked against.
///
/// The reference is the product of `input` with itself.
#[derive(Debug, Clone)]
pub struct Oracle {
    input: NestedMatrix,
    expected: NestedMatrix,
    epsilon: f64,
}

impl Oracle {
    /// Build an oracle from an input and its known square.
    ///
    /// Any reference is accepted; one whose shape is not that of
    /// `input @ input` simply never matches a candidate.
    pub fn new(input: NestedMatrix, expected: NestedMatrix) -> Self {
        Oracle {
            input,
            expected,
            epsilon: DEFAULT_EPSILON,
        }
    }

    /// Build an oracle whose reference is computed by the sequential
    /// multiply.
    pub fn from_input(input: NestedMatrix) -> Result<Self> {
        let expected = NestedMatrix::multiply(&input, &input)?;
        Ok(Self::new(input, expected))
    }

    /// Load the input and reference product from text files.
    pub fn load(input: impl AsRef<Path>, expected: impl AsRef<Path>) -> Result<Self> {
        let input = NestedMatrix::load(input)?;
        let expected = NestedMatrix::load(expected)?;
        info!(
            input = %input.shape(),
            expected = %expected.shape(),
            "oracle loaded"
        );
        Ok(Self::new(input, expected))
    }

    /// Replace the comparison tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The input operand, used as both `A` and `B`.
    pub fn input(&self) -> &NestedMatrix {
        &self.input
    }

    /// The reference product.
    pub fn expected(&self) -> &NestedMatrix {
        &self.expected
    }

    /// Checks a candidate product against the reference.
    pub fn check<M: DenseMatrix + ?Sized>(&self, candidate: &M) -> bool {
        let ok = approx_eq(candidate, &self.expected, self.epsilon);
        debug!(candidate = %candidate.shape(), ok, "oracle check");
        ok
    }
}
