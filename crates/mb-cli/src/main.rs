//! `matbench` - benchmark and verify the matrix multiplication backends.
//!
//! With no arguments, runs every mode against `matrix.in.txt`/`matrix.out.txt`
//! and reports OK/FAILED per mode. With `<mode> <size>`, times one multiply of
//! a generated `size x size` pair.

mod suite;
mod timing;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mb_backend::{Mode, ThreadConfig};
use mb_matrix::{GeneratorConfig, Oracle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "matbench")]
#[command(about = "Benchmark and verify parallel matrix multiplication backends")]
#[command(version)]
struct Args {
    /// Mode to time, e.g. `atomic`, `openmp_flat`, `cuda_flat_transposed`
    mode: Option<String>,

    /// Side length of the generated square matrices
    size: Option<usize>,

    /// Input matrix for the test suite
    #[arg(long, default_value = "matrix.in.txt")]
    input: PathBuf,

    /// Expected `input @ input` for the test suite
    #[arg(long, default_value = "matrix.out.txt")]
    expected: PathBuf,

    /// Seed for generated matrices
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Worker threads; defaults to the hardware concurrency
    #[arg(long)]
    threads: Option<usize>,
}

impl Args {
    fn thread_config(&self) -> ThreadConfig {
        self.threads
            .map(ThreadConfig::with_threads)
            .unwrap_or_else(ThreadConfig::detect)
    }
}

fn usage() -> String {
    let modes: Vec<String> = Mode::all().map(|m| m.to_string()).collect();
    format!(
        "Usage: matbench [<mode> <size>]\n  no arguments  run the test suite\n  modes: {}",
        modes.join(", ")
    )
}

fn run_suite(args: &Args) -> Result<ExitCode> {
    let oracle = Oracle::load(&args.input, &args.expected).context("failed to load test matrices")?;
    let outcomes = suite::run(&oracle, args.thread_config())?;
    print!("{}", suite::render(&outcomes));
    Ok(ExitCode::SUCCESS)
}

fn run_timed(args: &Args, mode: &str) -> Result<ExitCode> {
    let (Ok(mode), Some(size)) = (mode.parse::<Mode>(), args.size) else {
        eprintln!("{}", usage());
        return Ok(ExitCode::FAILURE);
    };
    let generator = GeneratorConfig::with_seed(args.seed);
    let timing = timing::run(mode, size, &generator, args.thread_config())?;
    debug!(shape = %timing.product.shape(), "product ready");
    println!("{}", timing.report());
    Ok(ExitCode::SUCCESS)
}

fn run(args: &Args) -> Result<ExitCode> {
    match args.mode.as_deref() {
        None => run_suite(args),
        Some(mode) => run_timed(args, mode),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("matbench").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.mode.is_none());
        assert!(args.size.is_none());
        assert_eq!(args.input, PathBuf::from("matrix.in.txt"));
        assert_eq!(args.expected, PathBuf::from("matrix.out.txt"));
        assert_eq!(args.seed, 42);
        assert!(args.thread_config().num_threads >= 1);
    }

    #[test]
    fn test_mode_and_size() {
        let args = parse(&["openmp_flat", "32", "--seed", "9", "--threads", "3"]);
        assert_eq!(args.mode.as_deref(), Some("openmp_flat"));
        assert_eq!(args.size, Some(32));
        assert_eq!(args.seed, 9);
        assert_eq!(args.thread_config(), ThreadConfig::with_threads(3));
    }

    #[test]
    fn test_non_numeric_size_rejected() {
        assert!(Args::try_parse_from(["matbench", "atomic", "big"]).is_err());
    }

    #[test]
    fn test_unknown_mode_fails() {
        let args = parse(&["blas", "8"]);
        assert_eq!(run(&args).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn test_missing_size_fails() {
        let args = parse(&["atomic"]);
        assert_eq!(run(&args).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn test_timed_run_succeeds() {
        let args = parse(&["cuda_flat", "4", "--threads", "2"]);
        assert_eq!(run(&args).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_suite_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let expected = dir.path().join("out.txt");
        fs::write(&input, "1 2\n3 4\n").unwrap();
        fs::write(&expected, "7 10\n15 22\n").unwrap();

        let args = parse(&[
            "--input",
            input.to_str().unwrap(),
            "--expected",
            expected.to_str().unwrap(),
            "--threads",
            "2",
        ]);
        assert_eq!(run(&args).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_suite_mismatched_reference_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let expected = dir.path().join("out.txt");
        fs::write(&input, "1 2\n3 4\n").unwrap();
        fs::write(&expected, "1 2 3\n4 5 6\n7 8 9\n").unwrap();

        let args = parse(&[
            "--input",
            input.to_str().unwrap(),
            "--expected",
            expected.to_str().unwrap(),
            "--threads",
            "2",
        ]);
        assert_eq!(run(&args).unwrap(), ExitCode::SUCCESS);

        let oracle = Oracle::load(&input, &expected).unwrap();
        let outcomes = suite::run(&oracle, ThreadConfig::with_threads(2)).unwrap();
        assert!(outcomes.iter().all(|o| !o.passed));
        assert_eq!(suite::render(&outcomes).matches("FAILED").count(), 9);
    }

    #[test]
    fn test_suite_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&[
            "--input",
            dir.path().join("absent.txt").to_str().unwrap(),
            "--expected",
            dir.path().join("absent_out.txt").to_str().unwrap(),
        ]);
        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load test matrices"));
    }

    #[test]
    fn test_usage_lists_modes() {
        let text = usage();
        assert!(text.contains("atomic_flat_transposed"));
        assert!(text.contains("cuda"));
    }
}
