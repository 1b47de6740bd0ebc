use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{MatrixError, Result};
use crate::nested::NestedMatrix;

/// Settings for deterministic benchmark input generation.
///
/// The value range is always finite and non-empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorConfig {
    seed: u64,
    low: f64,
    high: f64,
}

impl GeneratorConfig {
    /// Default `[0, 1)` range with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        GeneratorConfig {
            seed,
            ..Self::default()
        }
    }

    /// Values drawn uniformly from `[low, high)`.
    ///
    /// # Errors
    /// Returns `InvalidRange` unless `low < high` and the width of the range
    /// is finite.
    pub fn with_range(seed: u64, low: f64, high: f64) -> Result<Self> {
        if !(low < high && (high - low).is_finite()) {
            return Err(MatrixError::InvalidRange { low, high });
        }
        Ok(GeneratorConfig { seed, low, high })
    }

    /// RNG seed; the same seed and size always give the same pair.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Inclusive lower bound of generated values.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Exclusive upper bound of generated values.
    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: 42,
            low: 0.0,
            high: 1.0,
        }
    }
}

/// Generates a pair of `size x size` matrices filled with uniform values.
///
/// Values are drawn alternately for `A[i][j]` and `B[i][j]`, in row-major
/// order.
pub fn generate_pair(size: usize, config: &GeneratorConfig) -> (NestedMatrix, NestedMatrix) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let dist = Uniform::new(config.low, config.high);

    let mut a = NestedMatrix::zeros(size, size);
    let mut b = NestedMatrix::zeros(size, size);
    for (a_row, b_row) in a.iter_rows_mut().zip(b.iter_rows_mut()) {
        for (x, y) in a_row.iter_mut().zip(b_row.iter_mut()) {
            *x = dist.sample(&mut rng);
            *y = dist.sample(&mut rng);
        }
    }
    (a, b)
}
