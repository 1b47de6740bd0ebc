//! Accelerator offload behind a synchronous host call.
//!
//! Each multiply uploads its operands, launches one device thread per output
//! cell, and downloads the product before returning. The device itself is
//! pluggable through [`Device`]; [`HostDevice`] emulates the grid on CPU
//! threads.

pub mod device;
pub mod launch;

use mb_matrix::{DenseMatrix, FlatMatrix, NestedMatrix, Shape};
use tracing::debug;

use crate::backend::ComputeBackend;
use crate::config::ThreadConfig;
use crate::error::Result;

pub use device::{Device, DeviceBuffer, HostDevice, MatmulArgs, MatmulKernel};
pub use launch::{Dim2, LaunchConfig};

/// Offloads multiplication to a [`Device`].
#[derive(Debug, Clone)]
pub struct AcceleratorBackend<D: Device = HostDevice> {
    device: D,
    block: Dim2,
}

impl AcceleratorBackend<HostDevice> {
    /// Accelerator backed by the host-emulated device.
    pub fn host(config: ThreadConfig) -> Result<Self> {
        Ok(Self::with_device(HostDevice::new(config)?))
    }
}

impl<D: Device> AcceleratorBackend<D> {
    /// Accelerator on `device` with the default 16x16 thread blocks.
    pub fn with_device(device: D) -> Self {
        AcceleratorBackend {
            device,
            block: Dim2::new(LaunchConfig::DEFAULT_BLOCK, LaunchConfig::DEFAULT_BLOCK),
        }
    }

    /// Override the thread block shape.
    pub fn with_block(mut self, block: Dim2) -> Self {
        self.block = block;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Upload, launch and download one row-major product of shape `out`.
    fn offload(&self, kernel: MatmulKernel, a: &[f64], b: &[f64], k: usize, out: Shape) -> Result<Vec<f64>> {
        let config = LaunchConfig::with_block(out.rows, out.cols, self.block)?;
        let args = MatmulArgs {
            kernel,
            m: out.rows,
            k,
            n: out.cols,
        };
        debug!(
            device = self.device.name(),
            ?kernel,
            grid_x = config.grid.x,
            grid_y = config.grid.y,
            "accelerator launch"
        );

        let d_a = self.device.upload(a)?;
        let d_b = self.device.upload(b)?;
        let mut d_c = self.device.alloc_zeroed(out.numel())?;
        self.device.launch_matmul(&config, &args, &d_a, &d_b, &mut d_c)?;
        self.device.download(&d_c)
    }
}

impl<D: Device> ComputeBackend for AcceleratorBackend<D> {
    fn name(&self) -> &str {
        "cuda"
    }

    fn multiply(&self, a: &NestedMatrix, b: &NestedMatrix) -> Result<NestedMatrix> {
        a.shape().matmul(&b.shape())?;
        // The device only understands contiguous buffers, so rows are
        // staged into flat copies on the host first.
        let c = self.multiply_flat(&FlatMatrix::from(a), &FlatMatrix::from(b))?;
        Ok(NestedMatrix::from(&c))
    }

    fn multiply_flat(&self, a: &FlatMatrix, b: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape().matmul(&b.shape())?;
        let data = self.offload(MatmulKernel::RowByColumn, a.as_slice(), b.as_slice(), a.cols(), out)?;
        Ok(FlatMatrix::from_vec(out.rows, out.cols, data)?)
    }

    fn multiply_flat_pretransposed(&self, a: &FlatMatrix, b_t: &FlatMatrix) -> Result<FlatMatrix> {
        let out = a.shape().matmul_transposed(&b_t.shape())?;
        let data = self.offload(MatmulKernel::RowByRow, a.as_slice(), b_t.as_slice(), a.cols(), out)?;
        Ok(FlatMatrix::from_vec(out.rows, out.cols, data)?)
    }
}
