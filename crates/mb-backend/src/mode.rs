//! Benchmark modes and by-value backend dispatch.

use std::fmt;
use std::str::FromStr;

use mb_matrix::{DenseMatrix, FlatMatrix, NestedMatrix, Shape};
use tracing::info;

use crate::accel::AcceleratorBackend;
use crate::backend::ComputeBackend;
use crate::config::ThreadConfig;
use crate::error::{BackendError, Result};
use crate::reduction::ReductionBackend;
use crate::threaded::ThreadAtomicBackend;

/// Concurrency model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    ThreadAtomic,
    Reduction,
    Accelerator,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::ThreadAtomic, Strategy::Reduction, Strategy::Accelerator];

    /// Mode-name prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ThreadAtomic => "atomic",
            Strategy::Reduction => "openmp",
            Strategy::Accelerator => "cuda",
        }
    }
}

/// Storage layout a mode runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// One allocation per row.
    Nested,
    /// One contiguous buffer.
    Flat,
    /// Contiguous buffers with `B` transposed before the inner loop.
    FlatTransposed,
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::Nested, Layout::Flat, Layout::FlatTransposed];

    /// Mode-name suffix.
    pub fn suffix(&self) -> &'static str {
        match self {
            Layout::Nested => "",
            Layout::Flat => "_flat",
            Layout::FlatTransposed => "_flat_transposed",
        }
    }
}

/// A strategy and a layout, named like `atomic_flat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    pub strategy: Strategy,
    pub layout: Layout,
}

impl Mode {
    pub fn new(strategy: Strategy, layout: Layout) -> Self {
        Mode { strategy, layout }
    }

    /// All nine modes, grouped by layout.
    pub fn all() -> impl Iterator<Item = Mode> {
        Layout::ALL
            .into_iter()
            .flat_map(|layout| Strategy::ALL.into_iter().map(move |s| Mode::new(s, layout)))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.strategy.as_str(), self.layout.suffix())
    }
}

impl FromStr for Mode {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self> {
        Mode::all()
            .find(|m| m.to_string() == s)
            .ok_or_else(|| BackendError::UnknownMode(s.to_string()))
    }
}

/// One instance of each concurrency model, selected by value.
#[derive(Debug, Clone)]
pub enum Backend {
    ThreadAtomic(ThreadAtomicBackend),
    Reduction(ReductionBackend),
    Accelerator(AcceleratorBackend),
}

impl Backend {
    /// Build the backend for `strategy`.
    pub fn new(strategy: Strategy, config: ThreadConfig) -> Result<Self> {
        Ok(match strategy {
            Strategy::ThreadAtomic => Backend::ThreadAtomic(ThreadAtomicBackend::new(config)),
            Strategy::Reduction => Backend::Reduction(ReductionBackend::new(config)?),
            Strategy::Accelerator => Backend::Accelerator(AcceleratorBackend::host(config)?),
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Backend::ThreadAtomic(_) => Strategy::ThreadAtomic,
            Backend::Reduction(_) => Strategy::Reduction,
            Backend::Accelerator(_) => Strategy::Accelerator,
        }
    }

    fn inner(&self) -> &dyn ComputeBackend {
        match self {
            Backend::ThreadAtomic(b) => b,
            Backend::Reduction(b) => b,
            Backend::Accelerator(b) => b,
        }
    }

    /// Multiply `a @ b` laid out as `layout`.
    pub fn run(&self, layout: Layout, a: &Operand, b: &Operand) -> Result<Product> {
        let backend = self.inner();
        info!(mode = %Mode::new(self.strategy(), layout), "running");
        Ok(match layout {
            Layout::Nested => Product::Nested(backend.multiply(&a.nested, &b.nested)?),
            Layout::Flat => Product::Flat(backend.multiply_flat(&a.flat, &b.flat)?),
            Layout::FlatTransposed => {
                Product::Flat(backend.multiply_flat_transposed(&a.flat, &b.flat)?)
            }
        })
    }
}

impl ComputeBackend for Backend {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn multiply(&self, a: &NestedMatrix, b: &NestedMatrix) -> Result<NestedMatrix> {
        self.inner().multiply(a, b)
    }

    fn multiply_flat(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        self.inner().multiply_flat(a, b)
    }

    fn multiply_flat_pretransposed(&self, a: &FlatMatrix, b_t: &FlatMatrix) -> Result<FlatMatrix> {
        self.inner().multiply_flat_pretransposed(a, b_t)
    }

    fn multiply_flat_transposed(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        self.inner().multiply_flat_transposed(a, b)
    }
}

/// The same logical matrix held in both layouts.
#[derive(Debug, Clone)]
pub struct Operand {
    pub nested: NestedMatrix,
    pub flat: FlatMatrix,
}

impl From<NestedMatrix> for Operand {
    fn from(nested: NestedMatrix) -> Self {
        let flat = FlatMatrix::from(&nested);
        Operand { nested, flat }
    }
}

/// Output of a backend run, in the layout it was computed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Product {
    Nested(NestedMatrix),
    Flat(FlatMatrix),
}

impl Product {
    pub fn as_dense(&self) -> &dyn DenseMatrix {
        match self {
            Product::Nested(m) => m,
            Product::Flat(m) => m,
        }
    }

    pub fn shape(&self) -> Shape {
        self.as_dense().shape()
    }
}
