//! `mb-backend` - Parallel matrix multiplication backends for matbench.
//!
//! This crate provides:
//! - A `ComputeBackend` trait shared by every concurrency model
//! - `ThreadAtomicBackend`: scoped threads claiming rows from an atomic counter
//! - `ReductionBackend`: nested rayon parallel-for with a parallel sum per cell
//! - `AcceleratorBackend`: synchronous offload to a pluggable `Device`
//! - `Mode`/`Backend` for resolving the nine benchmark modes by value

pub mod accel;
pub mod backend;
pub mod config;
pub mod error;
pub mod mode;
pub mod reduction;
mod rows;
pub mod threaded;

// Re-export primary types at the crate root for convenience.
pub use accel::{AcceleratorBackend, Device, HostDevice, LaunchConfig};
pub use backend::ComputeBackend;
pub use config::ThreadConfig;
pub use error::{BackendError, Result};
pub use mode::{Backend, Layout, Mode, Operand, Product, Strategy};
pub use reduction::ReductionBackend;
pub use threaded::ThreadAtomicBackend;
