use crate::error::{BackendError, Result};

/// Extent of a 2D grid or block. `x` runs along output columns, `y` along
/// output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dim2 {
    pub x: usize,
    pub y: usize,
}

impl Dim2 {
    pub fn new(x: usize, y: usize) -> Self {
        Dim2 { x, y }
    }

    pub fn count(&self) -> usize {
        self.x * self.y
    }
}

/// Launch geometry for a per-cell matmul kernel.
///
/// One device thread per output cell; the grid is
/// `(ceil(cols / block.x), ceil(rows / block.y))` blocks, so edge blocks
/// may contain threads that fall outside the matrix and must do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid: Dim2,
    pub block: Dim2,
}

impl LaunchConfig {
    /// Side length of the default square thread block.
    pub const DEFAULT_BLOCK: usize = 16;

    /// Default 16x16 blocks covering a `rows x cols` output.
    pub fn for_output(rows: usize, cols: usize) -> Self {
        let block = Dim2::new(Self::DEFAULT_BLOCK, Self::DEFAULT_BLOCK);
        LaunchConfig {
            grid: Self::grid_for(rows, cols, block),
            block,
        }
    }

    /// Custom block shape covering a `rows x cols` output.
    ///
    /// # Errors
    /// Fails if either block dimension is zero.
    pub fn with_block(rows: usize, cols: usize, block: Dim2) -> Result<Self> {
        if block.count() == 0 {
            return Err(BackendError::Device(format!(
                "block dimensions must be non-zero, got {}x{}",
                block.x, block.y
            )));
        }
        Ok(LaunchConfig {
            grid: Self::grid_for(rows, cols, block),
            block,
        })
    }

    fn grid_for(rows: usize, cols: usize, block: Dim2) -> Dim2 {
        Dim2::new(cols.div_ceil(block.x), rows.div_ceil(block.y))
    }

    /// Total device threads launched, including idle edge threads.
    pub fn total_threads(&self) -> usize {
        self.grid.count() * self.block.count()
    }

    /// Output `(row, col)` handled by thread `thread` of block `block`.
    pub fn cell(&self, block: Dim2, thread: Dim2) -> (usize, usize) {
        (
            block.y * self.block.y + thread.y,
            block.x * self.block.x + thread.x,
        )
    }
}
