use std::fmt::Debug;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::trace;

use super::launch::{Dim2, LaunchConfig};
use crate::config::ThreadConfig;
use crate::error::{BackendError, Result};

/// Memory owned by a device. Host code only reaches its contents through
/// [`Device::download`].
#[derive(Debug, Clone)]
pub struct DeviceBuffer {
    data: Vec<f64>,
}

impl DeviceBuffer {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Which device kernel to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatmulKernel {
    /// `c[i][j] = sum_p a[i][p] * b[p][j]`.
    RowByColumn,
    /// `c[i][j] = sum_p a[i][p] * b_t[j][p]`, with `b` already transposed.
    RowByRow,
}

/// Arguments of one matmul launch: `a` is `m x k`, the output is `m x n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatmulArgs {
    pub kernel: MatmulKernel,
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl MatmulArgs {
    /// Body of the device thread assigned to output cell `(row, col)`.
    fn cell(&self, a: &[f64], b: &[f64], row: usize, col: usize) -> f64 {
        let (k, n) = (self.k, self.n);
        let a_row = &a[row * k..(row + 1) * k];
        match self.kernel {
            MatmulKernel::RowByColumn => {
                let mut sum = 0.0;
                for (p, x) in a_row.iter().enumerate() {
                    sum += x * b[p * n + col];
                }
                sum
            }
            MatmulKernel::RowByRow => {
                let bt_row = &b[col * k..(col + 1) * k];
                a_row.iter().zip(bt_row).map(|(x, y)| x * y).sum()
            }
        }
    }

    fn check_buffers(&self, a: &DeviceBuffer, b: &DeviceBuffer, c: &DeviceBuffer) -> Result<()> {
        let expected = [
            ("a", a.len(), self.m * self.k),
            ("b", b.len(), self.k * self.n),
            ("c", c.len(), self.m * self.n),
        ];
        for (name, got, want) in expected {
            if got != want {
                return Err(BackendError::Device(format!(
                    "buffer {name} holds {got} elements, kernel expects {want}"
                )));
            }
        }
        Ok(())
    }
}

/// A compute device with its own memory.
///
/// Every call is synchronous: `launch_matmul` returns only after all thread
/// blocks have finished writing `c`.
pub trait Device: Send + Sync + Debug {
    /// Returns the name of this device.
    fn name(&self) -> &str;

    /// Copy a host slice into a new device buffer.
    fn upload(&self, host: &[f64]) -> Result<DeviceBuffer>;

    /// Allocate a zero-filled device buffer.
    fn alloc_zeroed(&self, len: usize) -> Result<DeviceBuffer>;

    /// Run a matmul kernel over the launch grid, writing into `c`.
    fn launch_matmul(
        &self,
        config: &LaunchConfig,
        args: &MatmulArgs,
        a: &DeviceBuffer,
        b: &DeviceBuffer,
        c: &mut DeviceBuffer,
    ) -> Result<()>;

    /// Copy a device buffer back to host memory.
    fn download(&self, buffer: &DeviceBuffer) -> Result<Vec<f64>>;
}

/// Device that emulates a kernel grid on the host.
///
/// Thread blocks run in parallel on a rayon pool; the threads inside a block
/// run in order. Each thread computes one output cell.
#[derive(Debug, Clone)]
pub struct HostDevice {
    pool: Arc<rayon::ThreadPool>,
}

impl HostDevice {
    pub fn new(config: ThreadConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(|idx| format!("mb-device-{idx}"))
            .build()?;
        Ok(HostDevice {
            pool: Arc::new(pool),
        })
    }
}

impl Device for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    fn upload(&self, host: &[f64]) -> Result<DeviceBuffer> {
        Ok(DeviceBuffer {
            data: host.to_vec(),
        })
    }

    fn alloc_zeroed(&self, len: usize) -> Result<DeviceBuffer> {
        Ok(DeviceBuffer {
            data: vec![0.0; len],
        })
    }

    fn launch_matmul(
        &self,
        config: &LaunchConfig,
        args: &MatmulArgs,
        a: &DeviceBuffer,
        b: &DeviceBuffer,
        c: &mut DeviceBuffer,
    ) -> Result<()> {
        args.check_buffers(a, b, c)?;
        let (a_data, b_data) = (a.data.as_slice(), b.data.as_slice());

        let blocks: Vec<Dim2> = (0..config.grid.y)
            .flat_map(|by| (0..config.grid.x).map(move |bx| Dim2::new(bx, by)))
            .collect();
        trace!(
            blocks = blocks.len(),
            threads = config.total_threads(),
            "host device launch"
        );

        let written: Vec<Vec<(usize, f64)>> = self.pool.install(|| {
            blocks
                .par_iter()
                .map(|&block| {
                    let mut cells = Vec::with_capacity(config.block.count());
                    for ty in 0..config.block.y {
                        for tx in 0..config.block.x {
                            let (row, col) = config.cell(block, Dim2::new(tx, ty));
                            if row < args.m && col < args.n {
                                cells.push((row * args.n + col, args.cell(a_data, b_data, row, col)));
                            }
                        }
                    }
                    cells
                })
                .collect()
        });

        for (offset, value) in written.into_iter().flatten() {
            c.data[offset] = value;
        }
        Ok(())
    }

    fn download(&self, buffer: &DeviceBuffer) -> Result<Vec<f64>> {
        Ok(buffer.data.clone())
    }
}
