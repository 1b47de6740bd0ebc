//! Timed single-mode runs on generated input.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use mb_backend::{Backend, Mode, Operand, Product, ThreadConfig};
use mb_matrix::{generate_pair, GeneratorConfig};
use tracing::info;

/// Wall-clock result of one timed run.
#[derive(Debug)]
pub struct Timing {
    pub mode: Mode,
    pub elapsed: Duration,
    pub product: Product,
}

impl Timing {
    /// `Execution time (<mode>): <secs> seconds`
    pub fn report(&self) -> String {
        format!(
            "Execution time ({}): {} seconds",
            self.mode,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Multiplies a generated `size x size` pair with `mode`.
///
/// Generation, layout conversion and backend start-up happen before the clock
/// starts; only the multiply itself is timed.
pub fn run(mode: Mode, size: usize, generator: &GeneratorConfig, threads: ThreadConfig) -> Result<Timing> {
    let (a, b) = generate_pair(size, generator);
    let (a, b) = (Operand::from(a), Operand::from(b));
    let backend = Backend::new(mode.strategy, threads)
        .with_context(|| format!("failed to start backend for {mode}"))?;

    let start = Instant::now();
    let product = backend
        .run(mode.layout, &a, &b)
        .with_context(|| format!("{mode} failed"))?;
    let elapsed = start.elapsed();

    info!(%mode, size, secs = elapsed.as_secs_f64(), "timed run");
    Ok(Timing {
        mode,
        elapsed,
        product,
    })
}
