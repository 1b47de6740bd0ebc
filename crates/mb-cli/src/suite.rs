//! Oracle test suite: every mode against a known input/product pair.

use anyhow::{Context, Result};
use mb_backend::{Backend, Layout, Mode, Operand, ThreadConfig};
use mb_matrix::Oracle;
use tracing::{info, warn};

/// Result of checking one mode against the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub mode: Mode,
    pub passed: bool,
}

/// Runs all nine modes on `oracle.input() @ oracle.input()`.
///
/// Each mode gets fresh copies of the operands. A mode whose operands do
/// not fit together fails its check; any other backend error aborts the
/// suite.
pub fn run(oracle: &Oracle, threads: ThreadConfig) -> Result<Vec<Outcome>> {
    let operand = Operand::from(oracle.input().clone());
    let mut outcomes = Vec::new();
    for mode in Mode::all() {
        let backend = Backend::new(mode.strategy, threads)
            .with_context(|| format!("failed to start backend for {mode}"))?;
        let (a, b) = (operand.clone(), operand.clone());
        let passed = match backend.run(mode.layout, &a, &b) {
            Ok(product) => oracle.check(product.as_dense()),
            Err(err) if err.is_dimension_mismatch() => {
                warn!(%mode, %err, "input cannot be squared");
                false
            }
            Err(err) => return Err(err).with_context(|| format!("{mode} failed")),
        };
        info!(%mode, passed, "suite check");
        outcomes.push(Outcome { mode, passed });
    }
    Ok(outcomes)
}

fn heading(layout: Layout) -> &'static str {
    match layout {
        Layout::Nested => "Test mode results:",
        Layout::Flat => "FlatMatrix test mode results:",
        Layout::FlatTransposed => "FlatMatrix with transposed B test mode results:",
    }
}

/// Formats outcomes grouped by layout, one aligned `name: OK|FAILED` line per
/// mode.
pub fn render(outcomes: &[Outcome]) -> String {
    let mut out = String::new();
    for layout in Layout::ALL {
        let group: Vec<&Outcome> = outcomes.iter().filter(|o| o.mode.layout == layout).collect();
        if group.is_empty() {
            continue;
        }
        let width = group.iter().map(|o| o.mode.to_string().len() + 1).max().unwrap_or(0);
        out.push_str(heading(layout));
        out.push('\n');
        for o in group {
            let label = format!("{}:", o.mode);
            let status = if o.passed { "OK" } else { "FAILED" };
            out.push_str(&format!("  {label:<width$} {status}\n"));
        }
    }
    out
}
